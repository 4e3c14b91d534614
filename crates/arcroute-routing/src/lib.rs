//! Arcroute Routing Engine
//!
//! This crate provides the routing logic for Arcroute:
//! - Pattern compiler (matching expressions + generation templates)
//! - Request matcher with priority-ordered lookup
//! - URL generator with query-string and fragment handling
//! - Router orchestration with lazy, cache-backed compilation

pub mod compiler;
pub mod config;
pub mod generator;
pub mod matcher;
pub mod router;

// Re-export commonly used types
pub use compiler::{compile_gen_plan, compile_match_plan, GenPlan, GenToken, MatchPlan};
pub use config::RouterConfig;
pub use generator::{GeneratorTable, UrlGenerator};
pub use matcher::{MatchEntry, Matcher};
pub use router::Router;
