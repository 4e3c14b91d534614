//! Router configuration

use arcroute_core::{Error, Result, Rule};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a [`Router`](crate::Router)
///
/// Deserializable from JSON or TOML so an application can declare its
/// mount point, cache location, and rule set in one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Application identifier, namespaces the artifact cache
    pub app_id: String,
    /// Mount prefix for generated URLs
    pub base_path: String,
    /// Scheme+host for absolute URL generation
    pub host: Option<String>,
    /// Generated paths end with exactly one trailing slash
    pub trailing_slash: bool,
    /// Route the root rule `/` dispatches to
    pub landing_route: String,
    /// Directory for compiled-artifact caching; `None` disables the cache
    pub cache_dir: Option<PathBuf>,
    /// Application rules, registered after the base rules
    pub rules: Vec<Rule>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            app_id: "app".to_string(),
            base_path: String::new(),
            host: None,
            trailing_slash: false,
            landing_route: "Site/index".to_string(),
            cache_dir: None,
            rules: Vec::new(),
        }
    }
}

/// Configuration file format, detected from the file extension
#[derive(Debug, Clone, Copy)]
enum ConfigFormat {
    Json,
    Toml,
}

impl RouterConfig {
    /// Load configuration from a JSON or TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = Self::detect_format(path);
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;

        match format {
            ConfigFormat::Json => serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("JSON parse error: {e}"))),
            ConfigFormat::Toml => toml::from_str(&content)
                .map_err(|e| Error::Config(format!("TOML parse error: {e}"))),
        }
    }

    fn detect_format(path: &Path) -> ConfigFormat {
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}
