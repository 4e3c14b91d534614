//! URL generation
//!
//! The inverse of matching: given a rule name and a parameter set, walk the
//! rule's generation plan and produce a path (or absolute URL). Parameters
//! fall into three buckets: required slots, optional slots, and everything
//! else — which becomes the query string, in the caller's insertion order.
//! The special key `#` becomes a URL fragment appended at the very end.

use crate::compiler::{compile_gen_plan, GenPlan, GenToken};
use arcroute_core::{Error, Params, Result, RuleProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Compiled generation table: rule name → generation plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorTable {
    plans: HashMap<String, GenPlan>,
}

impl GeneratorTable {
    /// Compile the generation table from a provider's rules
    pub fn compile(provider: &RuleProvider) -> Self {
        let mut plans = HashMap::new();
        for rule in provider.rules() {
            plans.insert(rule.name().to_string(), compile_gen_plan(rule.tokens()));
        }
        tracing::debug!(rules = plans.len(), "compiled generation table");
        Self { plans }
    }

    fn plan(&self, rule_name: &str) -> Result<&GenPlan> {
        self.plans
            .get(rule_name)
            .ok_or_else(|| Error::RuleNotFound(rule_name.to_string()))
    }
}

/// Synthesizes URLs from compiled generation plans
///
/// # Example
///
/// ```
/// use arcroute_core::{Params, Rule, RuleProvider};
/// use arcroute_routing::generator::{GeneratorTable, UrlGenerator};
///
/// let mut provider = RuleProvider::new();
/// provider
///     .add_rule(Rule::new("article", "/articles/{id:num}", "Article/view").unwrap())
///     .unwrap();
///
/// let generator = UrlGenerator::new(GeneratorTable::compile(&provider));
/// let params: Params = [("id", "42"), ("ref", "feed")].into_iter().collect();
/// assert_eq!(
///     generator.create("article", &params).unwrap(),
///     "/articles/42?ref=feed"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct UrlGenerator {
    table: GeneratorTable,
    base_path: String,
    host: Option<String>,
    trailing_slash: bool,
}

impl UrlGenerator {
    /// Create a generator over a compiled table with default settings
    pub fn new(table: GeneratorTable) -> Self {
        Self {
            table,
            base_path: String::new(),
            host: None,
            trailing_slash: false,
        }
    }

    /// Mount prefix prepended to every generated path
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        let mut base_path = base_path.into();
        while base_path.ends_with('/') {
            base_path.pop();
        }
        if !base_path.is_empty() && !base_path.starts_with('/') {
            base_path.insert(0, '/');
        }
        self.base_path = base_path;
        self
    }

    /// Scheme+host used by [`create_absolute`](Self::create_absolute)
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        let mut host = host.into();
        while host.ends_with('/') {
            host.pop();
        }
        self.host = Some(host);
        self
    }

    /// Generated paths end with exactly one trailing slash
    pub fn with_trailing_slash(mut self, trailing_slash: bool) -> Self {
        self.trailing_slash = trailing_slash;
        self
    }

    /// Build a path for the named rule from the given parameters
    pub fn create(&self, rule_name: &str, params: &Params) -> Result<String> {
        let plan = self.table.plan(rule_name)?;
        let slots = plan.slots();

        // Report every missing required name at once, not just the first.
        let missing: Vec<String> = slots
            .required
            .iter()
            .filter(|name| !params.contains(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingParameters {
                rule: rule_name.to_string(),
                names: missing,
            });
        }

        let mut path = String::new();
        let mut consumed: Vec<&str> = Vec::new();
        let mut optional_run_open = true;
        for token in &plan.tokens {
            match token {
                GenToken::Literal { text } => path.push_str(text),
                GenToken::Required { name } => {
                    if let Some(value) = params.get(name) {
                        path.push_str(value);
                        consumed.push(name);
                    }
                }
                GenToken::Optional { name, prefix } => {
                    // Optionals are consumed left-to-right; the run closes at
                    // the first absent one so no hole appears mid-path. Later
                    // optional values fall through to the query string.
                    if !optional_run_open {
                        continue;
                    }
                    match params.get(name) {
                        Some(value) => {
                            path.push_str(prefix);
                            path.push_str(value);
                            consumed.push(name);
                        }
                        None => optional_run_open = false,
                    }
                }
            }
        }

        let mut url = self.normalize(&path);

        let mut fragment = None;
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        let mut has_query = false;
        for (name, value) in params.iter() {
            if consumed.contains(&name) {
                continue;
            }
            if name == "#" {
                fragment = Some(value);
                continue;
            }
            query.append_pair(name, value);
            has_query = true;
        }
        if has_query {
            url.push('?');
            url.push_str(&query.finish());
        }
        if let Some(fragment) = fragment {
            url.push('#');
            url.push_str(fragment);
        }

        tracing::debug!(rule = rule_name, %url, "generated url");
        Ok(url)
    }

    /// Build a full URL (scheme+host prepended) for the named rule
    pub fn create_absolute(&self, rule_name: &str, params: &Params) -> Result<String> {
        let host = self.host.as_ref().ok_or(Error::NoHostConfigured)?;
        let path = self.create(rule_name, params)?;
        Ok(format!("{host}{path}"))
    }

    /// Exactly one leading slash, no duplicated slashes, trailing slash per
    /// configuration, base path prepended
    fn normalize(&self, path: &str) -> String {
        let mut full = format!("{}/{}", self.base_path, path);
        while full.contains("//") {
            full = full.replace("//", "/");
        }
        if !full.starts_with('/') {
            full.insert(0, '/');
        }
        if self.trailing_slash {
            if !full.ends_with('/') {
                full.push('/');
            }
        } else {
            while full.len() > 1 && full.ends_with('/') {
                full.pop();
            }
        }
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcroute_core::Rule;

    fn generator(rules: Vec<Rule>) -> UrlGenerator {
        let mut provider = RuleProvider::new();
        for rule in rules {
            provider.add_rule(rule).unwrap();
        }
        UrlGenerator::new(GeneratorTable::compile(&provider))
    }

    fn rule(name: &str, pattern: &str) -> Rule {
        Rule::new(name, pattern, "Site/index").unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_create_substitutes_required() {
        let generator = generator(vec![rule("article", "/articles/{id:num}")]);
        let url = generator.create("article", &params(&[("id", "42")])).unwrap();
        assert_eq!(url, "/articles/42");
    }

    #[test]
    fn test_unknown_rule() {
        let generator = generator(vec![]);
        assert!(matches!(
            generator.create("ghost", &Params::new()).unwrap_err(),
            Error::RuleNotFound(name) if name == "ghost"
        ));
    }

    #[test]
    fn test_missing_required_reports_all_names() {
        let generator = generator(vec![rule("article", "/articles/{id:num}/{slug:str}")]);

        let err = generator.create("article", &Params::new()).unwrap_err();
        match err {
            Error::MissingParameters { rule, names } => {
                assert_eq!(rule, "article");
                assert_eq!(names, vec!["id", "slug"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        let message = generator
            .create("article", &Params::new())
            .unwrap_err()
            .to_string();
        assert!(message.contains("id"));
        assert!(message.contains("slug"));
    }

    #[test]
    fn test_optional_slot_erased_cleanly() {
        let generator = generator(vec![rule(
            "article",
            "/{controller}/{id:num}{seostuff:any:?}",
        )]);

        let url = generator
            .create("article", &params(&[("controller", "articles"), ("id", "42")]))
            .unwrap();
        assert_eq!(url, "/articles/42");

        let url = generator
            .create(
                "article",
                &params(&[
                    ("controller", "articles"),
                    ("id", "42"),
                    ("seostuff", "-intro"),
                ]),
            )
            .unwrap();
        assert_eq!(url, "/articles/42-intro");
    }

    #[test]
    fn test_optional_segment_erased_with_separator() {
        let generator = generator(vec![rule("generic", "/{controller}/{action:str:?}")]);

        let url = generator
            .create("generic", &params(&[("controller", "articles")]))
            .unwrap();
        assert_eq!(url, "/articles");
    }

    #[test]
    fn test_optional_run_stops_at_first_missing() {
        let generator = generator(vec![rule(
            "generic",
            "/{controller}/{action:str:?}/{id:num:?}",
        )]);

        // id cannot be placed without action: it falls through to the query
        let url = generator
            .create("generic", &params(&[("controller", "articles"), ("id", "7")]))
            .unwrap();
        assert_eq!(url, "/articles?id=7");

        let url = generator
            .create(
                "generic",
                &params(&[("controller", "articles"), ("action", "edit"), ("id", "7")]),
            )
            .unwrap();
        assert_eq!(url, "/articles/edit/7");
    }

    #[test]
    fn test_leftover_params_become_query_in_insertion_order() {
        let generator = generator(vec![rule("article", "/articles/{id:num}")]);

        let url = generator
            .create(
                "article",
                &params(&[("page", "2"), ("id", "42"), ("sort", "date")]),
            )
            .unwrap();
        assert_eq!(url, "/articles/42?page=2&sort=date");
    }

    #[test]
    fn test_query_values_are_encoded() {
        let generator = generator(vec![rule("search", "/search")]);

        let url = generator
            .create("search", &params(&[("q", "routing & beyond")]))
            .unwrap();
        assert_eq!(url, "/search?q=routing+%26+beyond");
    }

    #[test]
    fn test_hash_key_becomes_fragment() {
        let generator = generator(vec![rule("article", "/articles/{id:num}")]);

        let url = generator
            .create(
                "article",
                &params(&[("id", "42"), ("#", "comments"), ("page", "2")]),
            )
            .unwrap();
        assert_eq!(url, "/articles/42?page=2#comments");
    }

    #[test]
    fn test_base_path_prepended() {
        let mut provider = RuleProvider::new();
        provider.add_rule(rule("article", "/articles/{id:num}")).unwrap();
        let generator =
            UrlGenerator::new(GeneratorTable::compile(&provider)).with_base_path("/blog/");

        let url = generator.create("article", &params(&[("id", "42")])).unwrap();
        assert_eq!(url, "/blog/articles/42");
    }

    #[test]
    fn test_trailing_slash_configuration() {
        let mut provider = RuleProvider::new();
        provider.add_rule(rule("article", "/articles/{id:num}")).unwrap();
        let generator =
            UrlGenerator::new(GeneratorTable::compile(&provider)).with_trailing_slash(true);

        let url = generator.create("article", &params(&[("id", "42")])).unwrap();
        assert_eq!(url, "/articles/42/");
    }

    #[test]
    fn test_root_path_normalization() {
        let generator = generator(vec![rule("root", "/")]);
        assert_eq!(generator.create("root", &Params::new()).unwrap(), "/");
    }

    #[test]
    fn test_empty_any_value_leaves_no_double_slash() {
        let generator = generator(vec![rule("file", "/files/{name:any}/raw")]);

        let url = generator.create("file", &params(&[("name", "")])).unwrap();
        assert_eq!(url, "/files/raw");
    }

    #[test]
    fn test_create_absolute() {
        let mut provider = RuleProvider::new();
        provider.add_rule(rule("article", "/articles/{id:num}")).unwrap();
        let generator = UrlGenerator::new(GeneratorTable::compile(&provider))
            .with_host("https://example.org/");

        let url = generator
            .create_absolute("article", &params(&[("id", "42")]))
            .unwrap();
        assert_eq!(url, "https://example.org/articles/42");
    }

    #[test]
    fn test_create_absolute_without_host() {
        let generator = generator(vec![rule("root", "/")]);
        assert!(matches!(
            generator.create_absolute("root", &Params::new()).unwrap_err(),
            Error::NoHostConfigured
        ));
    }
}
