//! Request matching
//!
//! The [`Matcher`] holds the compiled match table: one ordered entry list
//! per HTTP method, in tier-then-insertion order. Matching walks the list
//! and stops at the first hit — there is no scoring, override behavior is
//! entirely the priority model's job.

use crate::compiler::{compile_match_plan, MatchPlan, ACTION_PARAM, CONTROLLER_PARAM};
use arcroute_core::{Error, HttpMethod, Params, Result, Route, RuleProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One compiled rule as seen by a method's match list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEntry {
    /// Name of the originating rule
    pub rule_name: String,
    /// The compiled matching plan
    pub plan: MatchPlan,
    /// The rule's `controller/action` template
    pub route: String,
    /// Fixed arguments; when non-empty they replace extracted parameters
    pub fixed_arguments: Params,
}

impl MatchEntry {
    /// Try this entry against a normalized path
    ///
    /// Returns `Ok(None)` when the entry simply doesn't match; an error is
    /// only possible when a matched route template is malformed.
    fn try_match(&self, path: &str) -> Result<Option<Route>> {
        // Literal-only patterns skip the regex engine entirely.
        if let Some(literal) = &self.plan.literal {
            if literal != path {
                return Ok(None);
            }
            let route = Route::new(self.route.clone())?
                .with_parameters(self.fixed_arguments.clone())
                .with_rule_name(self.rule_name.clone());
            return Ok(Some(route));
        }

        let Some(regex) = self.plan.regex() else {
            return Ok(None);
        };
        let Some(caps) = regex.captures(path) else {
            return Ok(None);
        };

        let mut value = self.route.clone();
        if self.plan.captures_controller {
            if let Some(m) = caps.name(CONTROLLER_PARAM) {
                value = value.replace("{controller}", m.as_str());
            }
        }
        if self.plan.captures_action {
            if let Some(m) = caps.name(ACTION_PARAM) {
                value = value.replace("{action}", m.as_str());
            }
        }

        // Fixed arguments take precedence over URL-derived values: full
        // replacement, not a merge.
        let parameters = if self.fixed_arguments.is_empty() {
            let mut extracted = Params::new();
            for name in &self.plan.param_names {
                if let Some(m) = caps.name(name) {
                    extracted.insert(name.clone(), m.as_str().to_string());
                }
            }
            extracted
        } else {
            self.fixed_arguments.clone()
        };

        let route = Route::new(value)?
            .with_parameters(parameters)
            .with_rule_name(self.rule_name.clone());
        Ok(Some(route))
    }
}

/// Compiled match table: method → ordered entry list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Matcher {
    by_method: HashMap<HttpMethod, Vec<MatchEntry>>,
}

impl Matcher {
    /// Compile the match table from a provider's rules
    pub fn compile(provider: &RuleProvider) -> Self {
        let mut by_method: HashMap<HttpMethod, Vec<MatchEntry>> = HashMap::new();
        for rule in provider.rules() {
            let plan = compile_match_plan(rule.tokens());
            for method in rule.allowed_methods().methods() {
                by_method.entry(method).or_default().push(MatchEntry {
                    rule_name: rule.name().to_string(),
                    plan: plan.clone(),
                    route: rule.route().to_string(),
                    fixed_arguments: rule.fixed_arguments().clone(),
                });
            }
        }
        tracing::debug!(
            methods = by_method.len(),
            rules = provider.len(),
            "compiled match table"
        );
        Self { by_method }
    }

    /// Resolve `(method, path)` to a [`Route`]
    ///
    /// The path is normalized (trailing slash stripped) and the method
    /// uppercased before lookup. An unknown or unregistered method fails
    /// immediately with [`Error::MethodNotRoutable`]; an exhausted entry
    /// list fails with [`Error::NoRouteMatched`].
    pub fn match_route(&self, method: &str, path: &str) -> Result<Route> {
        let method: HttpMethod = method
            .parse()
            .map_err(|_| Error::MethodNotRoutable(method.to_string()))?;
        let path = normalize_path(path);

        let entries = self
            .by_method
            .get(&method)
            .ok_or_else(|| Error::MethodNotRoutable(method.to_string()))?;

        for entry in entries {
            if let Some(route) = entry.try_match(&path)? {
                tracing::debug!(rule = %entry.rule_name, %path, "matched route");
                return Ok(route);
            }
        }

        tracing::debug!(%method, %path, "no rule matched");
        Err(Error::NoRouteMatched {
            method: method.to_string(),
            path,
        })
    }

    /// Number of methods with at least one entry
    pub fn method_count(&self) -> usize {
        self.by_method.len()
    }
}

/// Strip trailing slashes, keeping the root path intact
fn normalize_path(path: &str) -> String {
    let mut path = path.to_string();
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}
