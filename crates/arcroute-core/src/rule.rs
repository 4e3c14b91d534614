//! Routing rule declarations

use crate::error::{Error, Result};
use crate::method::MethodSet;
use crate::params::Params;
use crate::pattern::{parse_pattern, PatternToken};
use serde::{Deserialize, Serialize};

/// Match-attempt ordering tier
///
/// TOP rules are tried first, FINAL rules last. Within a tier, insertion
/// order is preserved. Application rules normally sit at STANDARD so they
/// beat the generic FINAL fallbacks without displacing explicit TOP
/// overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Top,
    #[default]
    Standard,
    Final,
}

/// An immutable routing declaration: pattern → `controller/action`
///
/// A rule is validated when constructed and never changes afterwards; its
/// compiled artifacts are pure functions of (pattern, route, fixed
/// arguments).
///
/// # Example
///
/// ```
/// use arcroute_core::{Priority, Rule};
///
/// let rule = Rule::new("article", "/articles/{id:num}", "Article/view")
///     .unwrap()
///     .with_priority(Priority::Standard);
///
/// assert_eq!(rule.name(), "article");
/// assert_eq!(rule.route(), "Article/view");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub struct Rule {
    name: String,
    pattern: String,
    tokens: Vec<PatternToken>,
    route: String,
    fixed_arguments: Params,
    allowed_methods: MethodSet,
    priority: Priority,
}

impl Rule {
    /// Create a rule, validating the pattern and the route template
    ///
    /// The route must contain exactly one `/` splitting it into controller
    /// and action components. A trailing slash on the pattern is trimmed
    /// (the root pattern `/` excepted).
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        route: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let mut pattern = pattern.into();
        let route = route.into();

        if pattern.is_empty() {
            return Err(Error::InvalidPattern {
                pattern,
                reason: "pattern must not be empty".to_string(),
            });
        }
        while pattern.len() > 1 && pattern.ends_with('/') {
            pattern.pop();
        }
        let tokens = parse_pattern(&pattern)?;

        let mut parts = route.splitn(3, '/');
        let controller = parts.next().unwrap_or_default();
        let action = parts.next().unwrap_or_default();
        if controller.is_empty() || action.is_empty() || parts.next().is_some() {
            return Err(Error::InvalidRoute(route));
        }

        Ok(Self {
            name,
            pattern,
            tokens,
            route,
            fixed_arguments: Params::new(),
            allowed_methods: MethodSet::default(),
            priority: Priority::default(),
        })
    }

    /// Set the allowed HTTP methods
    pub fn with_methods(mut self, methods: MethodSet) -> Self {
        self.allowed_methods = methods;
        self
    }

    /// Set fixed arguments
    ///
    /// When non-empty these are used verbatim as the route parameters and
    /// any URL-extracted values are discarded.
    pub fn with_fixed_arguments(mut self, fixed_arguments: Params) -> Self {
        self.fixed_arguments = fixed_arguments;
        self
    }

    /// Set the priority tier
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// The unique rule name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pattern string, trailing slash trimmed
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The parsed pattern tokens
    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    /// The `controller/action` route template
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Fixed arguments, possibly empty
    pub fn fixed_arguments(&self) -> &Params {
        &self.fixed_arguments
    }

    /// The allowed-method set
    pub fn allowed_methods(&self) -> &MethodSet {
        &self.allowed_methods
    }

    /// The priority tier
    pub fn priority(&self) -> Priority {
        self.priority
    }
}

/// Serialized form of a rule; the token list is re-derived on load
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRule {
    name: String,
    pattern: String,
    route: String,
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    fixed_arguments: Params,
    #[serde(default)]
    methods: MethodSet,
    #[serde(default)]
    priority: Priority,
}

impl TryFrom<RawRule> for Rule {
    type Error = Error;

    fn try_from(raw: RawRule) -> Result<Self> {
        Ok(Rule::new(raw.name, raw.pattern, raw.route)?
            .with_fixed_arguments(raw.fixed_arguments)
            .with_methods(raw.methods)
            .with_priority(raw.priority))
    }
}

impl From<Rule> for RawRule {
    fn from(rule: Rule) -> Self {
        RawRule {
            name: rule.name,
            pattern: rule.pattern,
            route: rule.route,
            fixed_arguments: rule.fixed_arguments,
            methods: rule.allowed_methods,
            priority: rule.priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::HttpMethod;

    #[test]
    fn test_new_rule_defaults() {
        let rule = Rule::new("article", "/articles/{id:num}", "Article/view").unwrap();

        assert_eq!(rule.name(), "article");
        assert_eq!(rule.pattern(), "/articles/{id:num}");
        assert_eq!(rule.route(), "Article/view");
        assert!(rule.fixed_arguments().is_empty());
        assert_eq!(rule.priority(), Priority::Standard);
        assert!(rule.allowed_methods().contains(HttpMethod::Get));
        assert!(rule.allowed_methods().contains(HttpMethod::Post));
        assert!(!rule.allowed_methods().contains(HttpMethod::Delete));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let rule = Rule::new("list", "/articles/", "Article/index").unwrap();
        assert_eq!(rule.pattern(), "/articles");

        let root = Rule::new("root", "/", "Site/index").unwrap();
        assert_eq!(root.pattern(), "/");
    }

    #[test]
    fn test_route_must_have_one_slash() {
        assert!(matches!(
            Rule::new("bad", "/x", "Article").unwrap_err(),
            Error::InvalidRoute(_)
        ));
        assert!(matches!(
            Rule::new("bad", "/x", "a/b/c").unwrap_err(),
            Error::InvalidRoute(_)
        ));
        assert!(matches!(
            Rule::new("bad", "/x", "/view").unwrap_err(),
            Error::InvalidRoute(_)
        ));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(Rule::new("bad", "/articles/{id:int}", "Article/view").is_err());
        assert!(Rule::new("bad", "", "Article/view").is_err());
    }

    #[test]
    fn test_builders() {
        let mut fixed = Params::new();
        fixed.insert("lang", "ru");

        let rule = Rule::new("localized", "/{lang:str}/home", "Site/index")
            .unwrap()
            .with_fixed_arguments(fixed)
            .with_methods(MethodSet::Any)
            .with_priority(Priority::Top);

        assert_eq!(rule.fixed_arguments().get("lang"), Some("ru"));
        assert_eq!(rule.priority(), Priority::Top);
        assert!(rule.allowed_methods().contains(HttpMethod::Trace));
    }

    #[test]
    fn test_serde_round_trip() {
        let rule = Rule::new("article", "/articles/{id:num}", "Article/view")
            .unwrap()
            .with_priority(Priority::Top);

        let json = serde_json::to_string(&rule).unwrap();
        let back: Rule = serde_json::from_str(&json).unwrap();

        assert_eq!(back, rule);
        assert_eq!(back.tokens(), rule.tokens());
    }

    #[test]
    fn test_deserialize_from_declaration() {
        let json = r#"{
            "name": "article",
            "pattern": "/articles/{id:num}",
            "route": "Article/view",
            "methods": ["GET"],
            "priority": "top"
        }"#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.priority(), Priority::Top);
        assert!(rule.allowed_methods().contains(HttpMethod::Get));
        assert!(!rule.allowed_methods().contains(HttpMethod::Post));
    }

    #[test]
    fn test_deserialize_rejects_bad_route() {
        let json = r#"{"name": "bad", "pattern": "/x", "route": "no-slash"}"#;
        let result: std::result::Result<Rule, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
