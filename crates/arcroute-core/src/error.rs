//! Error types for Arcroute Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Configuration errors (construction-time, fatal)
    #[error("Invalid route '{0}': expected exactly one '/' between controller and action")]
    InvalidRoute(String),

    #[error("Unknown HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Duplicate rule name: {0}")]
    DuplicateRule(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Routing errors (per-request, recoverable)
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    #[error("Method not routable: {0}")]
    MethodNotRoutable(String),

    #[error("No suitable route found for {method} {path}")]
    NoRouteMatched { method: String, path: String },

    #[error("Invalid request path: {0}")]
    InvalidPath(String),

    // Generation errors (per-call, recoverable)
    #[error("Missing required parameter(s) for rule '{rule}': {}", names.join(", "))]
    MissingParameters { rule: String, names: Vec<String> },

    #[error("No host configured for absolute URL generation")]
    NoHostConfigured,

    // Cache errors surfaced through the routing layer
    #[error("Cache error: {0}")]
    Cache(String),
}

pub type Result<T> = std::result::Result<T, Error>;
