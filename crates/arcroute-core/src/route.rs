//! Resolved routes

use crate::error::{Error, Result};
use crate::params::Params;
use serde::{Deserialize, Serialize};

/// The outcome of matching a request: controller, action, and parameters
///
/// Produced once per request by the matcher, or constructed manually by the
/// surrounding framework for synthetic defaults. Read-mostly from the
/// dispatch point on; callers may still attach extra parameters with
/// [`set_parameter`](Self::set_parameter) before dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    value: String,
    controller: String,
    action: String,
    parameters: Params,
    rule_name: Option<String>,
}

impl Route {
    /// Build a route from a `controller/action` value
    ///
    /// The value must contain exactly one `/`; this is the same shape
    /// constraint a [`Rule`](crate::Rule) route template carries.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let mut parts = value.splitn(3, '/');
        let controller = parts.next().unwrap_or_default().to_string();
        let action = parts.next().unwrap_or_default().to_string();
        if controller.is_empty() || action.is_empty() || parts.next().is_some() {
            return Err(Error::InvalidRoute(value));
        }

        Ok(Self {
            value,
            controller,
            action,
            parameters: Params::new(),
            rule_name: None,
        })
    }

    /// Attach the resolved parameter map
    pub fn with_parameters(mut self, parameters: Params) -> Self {
        self.parameters = parameters;
        self
    }

    /// Record which rule produced this route
    pub fn with_rule_name(mut self, rule_name: impl Into<String>) -> Self {
        self.rule_name = Some(rule_name.into());
        self
    }

    /// The full `controller/action` string, post placeholder substitution
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The controller component
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// The action component
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The resolved parameters
    pub fn parameters(&self) -> &Params {
        &self.parameters
    }

    /// Name of the rule that produced this route, if any
    ///
    /// `None` for synthetically constructed routes. The full rule is
    /// retrievable from the provider by this name.
    pub fn rule_name(&self) -> Option<&str> {
        self.rule_name.as_deref()
    }

    /// Attach or overwrite a parameter before dispatch
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_splits_controller_action() {
        let route = Route::new("Article/view").unwrap();
        assert_eq!(route.value(), "Article/view");
        assert_eq!(route.controller(), "Article");
        assert_eq!(route.action(), "view");
        assert_eq!(route.rule_name(), None);
    }

    #[test]
    fn test_new_rejects_malformed_value() {
        assert!(Route::new("Article").is_err());
        assert!(Route::new("Article/view/extra").is_err());
        assert!(Route::new("/view").is_err());
        assert!(Route::new("Article/").is_err());
    }

    #[test]
    fn test_with_parameters_and_rule_name() {
        let mut params = Params::new();
        params.insert("id", "42");

        let route = Route::new("Article/view")
            .unwrap()
            .with_parameters(params)
            .with_rule_name("article");

        assert_eq!(route.parameters().get("id"), Some("42"));
        assert_eq!(route.rule_name(), Some("article"));
    }

    #[test]
    fn test_set_parameter_after_match() {
        let mut route = Route::new("Article/view").unwrap();
        route.set_parameter("format", "json");
        assert_eq!(route.parameters().get("format"), Some("json"));
    }
}
