//! The rule provider: ordered, priority-bucketed rule collection

use crate::error::{Error, Result};
use crate::rule::{Priority, Rule};
use sha2::{Digest, Sha256};

/// Owns the rule collection, partitioned by priority tier
///
/// Populated once at startup (base rules + application rules) and
/// read-mostly thereafter. Iteration visits TOP, then STANDARD, then FINAL,
/// preserving insertion order within each tier — this ordering is exactly
/// the match-attempt order and there is no further scoring.
///
/// Mutating the provider after compiled artifacts were cached is legal but
/// changes [`fingerprint`](Self::fingerprint), which invalidates those
/// artifacts on the next load.
#[derive(Debug, Clone, Default)]
pub struct RuleProvider {
    top: Vec<Rule>,
    standard: Vec<Rule>,
    last: Vec<Rule>,
}

impl RuleProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rule into the bucket named by its priority tier
    ///
    /// Rejects a rule whose name is already registered: names key the
    /// generator table, so shadowing would make URL creation ambiguous.
    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        if self.rules().any(|existing| existing.name() == rule.name()) {
            return Err(Error::DuplicateRule(rule.name().to_string()));
        }
        tracing::debug!(name = rule.name(), priority = ?rule.priority(), "registering rule");
        match rule.priority() {
            Priority::Top => self.top.push(rule),
            Priority::Standard => self.standard.push(rule),
            Priority::Final => self.last.push(rule),
        }
        Ok(())
    }

    /// Iterate all rules in tier-then-insertion order
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.top
            .iter()
            .chain(self.standard.iter())
            .chain(self.last.iter())
    }

    /// Look up a rule by name
    pub fn rule(&self, name: &str) -> Result<&Rule> {
        self.rules()
            .find(|rule| rule.name() == name)
            .ok_or_else(|| Error::RuleNotFound(name.to_string()))
    }

    /// Total number of rules across all tiers
    pub fn len(&self) -> usize {
        self.top.len() + self.standard.len() + self.last.len()
    }

    /// Return `true` if no rules are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content fingerprint of the rule set
    ///
    /// A SHA-256 hex digest over the serialized rules in iteration order
    /// plus a format version, so compiled artifacts cached under one
    /// fingerprint are never replayed against a different rule set or an
    /// incompatible artifact layout.
    pub fn fingerprint(&self) -> String {
        const FORMAT_VERSION: &str = "arcroute-artifacts-v1";

        let mut hasher = Sha256::new();
        hasher.update(FORMAT_VERSION.as_bytes());
        for rule in self.rules() {
            // Rule serialization is infallible: every field is plain data.
            let encoded = serde_json::to_vec(rule).expect("rule serialization");
            hasher.update(&encoded);
            hasher.update(b"\n");
        }
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, pattern: &str, priority: Priority) -> Rule {
        Rule::new(name, pattern, "Site/index")
            .unwrap()
            .with_priority(priority)
    }

    #[test]
    fn test_iteration_is_tier_then_insertion_order() {
        let mut provider = RuleProvider::new();
        provider
            .add_rule(rule("fallback", "/{controller}", Priority::Final))
            .unwrap();
        provider
            .add_rule(rule("app-b", "/b", Priority::Standard))
            .unwrap();
        provider.add_rule(rule("root", "/", Priority::Top)).unwrap();
        provider
            .add_rule(rule("app-a", "/a", Priority::Standard))
            .unwrap();

        let names: Vec<&str> = provider.rules().map(Rule::name).collect();
        assert_eq!(names, vec!["root", "app-b", "app-a", "fallback"]);
    }

    #[test]
    fn test_rule_lookup() {
        let mut provider = RuleProvider::new();
        provider
            .add_rule(rule("root", "/", Priority::Top))
            .unwrap();

        assert_eq!(provider.rule("root").unwrap().name(), "root");
        assert!(matches!(
            provider.rule("missing").unwrap_err(),
            Error::RuleNotFound(name) if name == "missing"
        ));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut provider = RuleProvider::new();
        provider.add_rule(rule("root", "/", Priority::Top)).unwrap();

        let err = provider
            .add_rule(rule("root", "/other", Priority::Standard))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRule(name) if name == "root"));
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn test_len_and_is_empty() {
        let mut provider = RuleProvider::new();
        assert!(provider.is_empty());

        provider.add_rule(rule("root", "/", Priority::Top)).unwrap();
        assert_eq!(provider.len(), 1);
        assert!(!provider.is_empty());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let mut a = RuleProvider::new();
        a.add_rule(rule("root", "/", Priority::Top)).unwrap();
        let mut b = RuleProvider::new();
        b.add_rule(rule("root", "/", Priority::Top)).unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let mut a = RuleProvider::new();
        a.add_rule(rule("root", "/", Priority::Top)).unwrap();
        let before = a.fingerprint();

        a.add_rule(rule("extra", "/extra", Priority::Standard))
            .unwrap();
        assert_ne!(a.fingerprint(), before);
    }
}
