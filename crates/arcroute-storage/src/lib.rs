//! Arcroute Compiled-Artifact Storage
//!
//! This crate provides the persistence layer for compiled routing
//! artifacts:
//! - A minimal key/value store trait over structured (JSON) values
//! - A file-backed implementation with atomic temp-file-then-rename writes
//! - An in-memory implementation for tests
//!
//! The cache is a pure optimization: a missing entry simply means the
//! caller recompiles.

pub mod atomic_writer;
pub mod error;
pub mod store;

pub use atomic_writer::AtomicWriter;
pub use error::{CacheError, CacheResult};
pub use store::{ArtifactStore, FileArtifactStore, MemoryArtifactStore};
