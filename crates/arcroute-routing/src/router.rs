//! Router orchestration
//!
//! The [`Router`] owns the canonical rule set (base rules + application
//! rules), builds the matcher and generator lazily — loading them from the
//! artifact cache when a warm copy with a matching fingerprint exists — and
//! exposes route determination and URL creation to the surrounding
//! framework.

use crate::config::RouterConfig;
use crate::generator::{GeneratorTable, UrlGenerator};
use crate::matcher::Matcher;
use arcroute_core::{Error, Params, Priority, Result, Route, Rule, RuleProvider};
use arcroute_storage::store::artifact_key;
use arcroute_storage::{ArtifactStore, CacheError, FileArtifactStore};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

const MATCHER_ROLE: &str = "matcher";
const GENERATOR_ROLE: &str = "generator";

/// Cached artifact plus the rule-set fingerprint it was compiled from
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope<T> {
    fingerprint: String,
    table: T,
}

/// Orchestrates rules, compiled tables, the cache, and request routing
///
/// # Example
///
/// ```
/// use arcroute_core::{Params, Rule};
/// use arcroute_routing::{Router, RouterConfig};
///
/// let mut config = RouterConfig::default();
/// config.rules.push(
///     Rule::new("article", "/articles/{id:num}", "Article/view").unwrap(),
/// );
///
/// let router = Router::new(config).unwrap();
/// let route = router.determine_route("/articles/42", "GET", "").unwrap();
/// assert_eq!(route.controller(), "Article");
///
/// let params: Params = [("id", "42")].into_iter().collect();
/// assert_eq!(router.create_url("article", &params).unwrap(), "/articles/42");
/// ```
pub struct Router {
    config: RouterConfig,
    provider: RuleProvider,
    store: Option<Box<dyn ArtifactStore>>,
    matcher: OnceCell<Matcher>,
    generator: OnceCell<UrlGenerator>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("provider", &self.provider)
            .field("store", &self.store.as_ref().map(|_| "<store>"))
            .field("matcher", &self.matcher)
            .field("generator", &self.generator)
            .finish()
    }
}

impl Router {
    /// Build a router from configuration
    ///
    /// Seeds the base rules (TOP root + FINAL generic fallbacks) around the
    /// configured application rules and, when `cache_dir` is set, opens the
    /// file-backed artifact store — a missing or unwritable directory is a
    /// fatal configuration error here, not at request time.
    pub fn new(config: RouterConfig) -> Result<Self> {
        let store = match &config.cache_dir {
            Some(dir) => Some(Box::new(
                FileArtifactStore::open(dir).map_err(|e| Error::Cache(e.to_string()))?,
            ) as Box<dyn ArtifactStore>),
            None => None,
        };
        Self::with_store(config, store)
    }

    /// Build a router over an explicit artifact store
    ///
    /// Used by tests and by applications that bring their own store; the
    /// configured `cache_dir` is ignored.
    pub fn with_store(
        config: RouterConfig,
        store: Option<Box<dyn ArtifactStore>>,
    ) -> Result<Self> {
        let mut provider = RuleProvider::new();
        for rule in base_rules(&config.landing_route)? {
            provider.add_rule(rule)?;
        }
        for rule in &config.rules {
            provider.add_rule(rule.clone())?;
        }
        tracing::debug!(rules = provider.len(), app_id = %config.app_id, "router ready");

        Ok(Self {
            config,
            provider,
            store,
            matcher: OnceCell::new(),
            generator: OnceCell::new(),
        })
    }

    /// The canonical rule set
    pub fn provider(&self) -> &RuleProvider {
        &self.provider
    }

    /// The router configuration
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The compiled matcher, built or loaded on first use
    pub fn matcher(&self) -> Result<&Matcher> {
        self.matcher.get_or_try_init(|| {
            self.load_or_compile(MATCHER_ROLE, || Matcher::compile(&self.provider))
        })
    }

    /// The URL generator, built or loaded on first use
    pub fn generator(&self) -> Result<&UrlGenerator> {
        self.generator.get_or_try_init(|| {
            let table = self.load_or_compile(GENERATOR_ROLE, || {
                GeneratorTable::compile(&self.provider)
            })?;
            let mut generator = UrlGenerator::new(table)
                .with_base_path(self.config.base_path.clone())
                .with_trailing_slash(self.config.trailing_slash);
            if let Some(host) = &self.config.host {
                generator = generator.with_host(host.clone());
            }
            Ok(generator)
        })
    }

    /// Resolve an incoming request to a [`Route`]
    ///
    /// Strips `base_path` from the URI's path, validates that the remainder
    /// is a well-formed absolute path, and delegates to the matcher.
    pub fn determine_route(&self, uri: &str, method: &str, base_path: &str) -> Result<Route> {
        let path = extract_path(uri);
        let path = strip_base_path(&path, base_path);
        validate_path(&path)?;
        self.matcher()?.match_route(method, &path)
    }

    /// Build a path for the named rule
    pub fn create_url(&self, rule_name: &str, params: &Params) -> Result<String> {
        self.generator()?.create(rule_name, params)
    }

    /// Build an absolute URL for the named rule
    pub fn create_absolute_url(&self, rule_name: &str, params: &Params) -> Result<String> {
        self.generator()?.create_absolute(rule_name, params)
    }

    /// Drop compiled tables and cached artifacts
    ///
    /// The documented recovery path after mutating the rule set: the next
    /// `matcher()`/`generator()` call recompiles from the provider.
    pub fn invalidate(&mut self) -> Result<()> {
        self.matcher.take();
        self.generator.take();
        if let Some(store) = &self.store {
            for role in [MATCHER_ROLE, GENERATOR_ROLE] {
                store
                    .delete(&artifact_key(&self.config.app_id, role))
                    .map_err(|e| Error::Cache(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Load a cached table when its fingerprint matches, else compile and
    /// store it
    fn load_or_compile<T, F>(&self, role: &str, compile: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let Some(store) = &self.store else {
            return Ok(compile());
        };

        let key = artifact_key(&self.config.app_id, role);
        let fingerprint = self.provider.fingerprint();

        match store.get(&key) {
            Ok(Some(value)) => {
                match serde_json::from_value::<ArtifactEnvelope<T>>(value) {
                    Ok(envelope) if envelope.fingerprint == fingerprint => {
                        tracing::debug!(%key, "loaded compiled artifact from cache");
                        return Ok(envelope.table);
                    }
                    Ok(_) => {
                        tracing::debug!(%key, "cached artifact is stale, recompiling");
                    }
                    Err(e) => {
                        tracing::warn!(%key, "cached artifact undecodable, recompiling: {e}");
                    }
                }
            }
            Ok(None) => {}
            // A corrupt entry heals itself through recompilation; anything
            // else (IO, configuration) is a real failure.
            Err(CacheError::InvalidData(e)) => {
                tracing::warn!(%key, "cached artifact unreadable, recompiling: {e}");
            }
            Err(e) => return Err(Error::Cache(e.to_string())),
        }

        let table = compile();
        let envelope = ArtifactEnvelope {
            fingerprint,
            table,
        };
        let value = serde_json::to_value(&envelope)?;
        store
            .set(&key, &value)
            .map_err(|e| Error::Cache(e.to_string()))?;
        Ok(envelope.table)
    }
}

/// The always-seeded rule set: a TOP literal root rule plus FINAL generic
/// fallbacks covering the conventional `controller/action/id` shapes
fn base_rules(landing_route: &str) -> Result<Vec<Rule>> {
    Ok(vec![
        Rule::new("root", "/", landing_route)?.with_priority(Priority::Top),
        Rule::new("controller", "/{controller}", "{controller}/index")?
            .with_priority(Priority::Final),
        Rule::new("controller-id", "/{controller}/{id:num}", "{controller}/view")?
            .with_priority(Priority::Final),
        Rule::new(
            "controller-action",
            "/{controller}/{action}",
            "{controller}/{action}",
        )?
        .with_priority(Priority::Final),
        Rule::new(
            "controller-action-id",
            "/{controller}/{action}/{id:num}",
            "{controller}/{action}",
        )?
        .with_priority(Priority::Final),
    ])
}

/// Extract the path component of a URI, absolute or relative
fn extract_path(uri: &str) -> String {
    if let Ok(parsed) = Url::parse(uri) {
        if !parsed.cannot_be_a_base() {
            return parsed.path().to_string();
        }
    }
    uri.split(['?', '#']).next().unwrap_or_default().to_string()
}

/// Remove the mount prefix, treating a fully consumed path as the root
fn strip_base_path(path: &str, base_path: &str) -> String {
    let base_path = base_path.trim_end_matches('/');
    if base_path.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(base_path) {
        Some("") => "/".to_string(),
        Some(rest) => rest.to_string(),
        None => path.to_string(),
    }
}

/// The path must start with `/` and, prefixed with an arbitrary
/// scheme+host, must form a syntactically valid URI
///
/// A guard against malformed input reaching the regex engine, not a
/// security boundary.
fn validate_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(Error::InvalidPath(path.to_string()));
    }
    let probe = format!("http://router.invalid{path}");
    match Url::parse(&probe) {
        Ok(parsed) if parsed.path() == path => Ok(()),
        _ => Err(Error::InvalidPath(path.to_string())),
    }
}
