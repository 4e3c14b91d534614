//! The pattern compiler
//!
//! Two pure functions turn a rule's parsed pattern tokens into its derived
//! artifacts:
//!
//! - [`compile_match_plan`] — an anchored regex with typed named capture
//!   groups, plus the metadata the matcher needs (literal fast path,
//!   controller/action capture flags, surviving parameter names).
//! - [`compile_gen_plan`] — a substitution token list the URL generator
//!   walks, where optional slots carry the literal prefix that must be
//!   erased together with them.
//!
//! Plans are serde-serializable so compiled tables can be cached; the
//! compiled [`Regex`] itself is rebuilt lazily from its source and never
//! serialized.

use arcroute_core::pattern::{ParamKind, PatternToken};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder name whose capture substitutes `{controller}` in the route
pub const CONTROLLER_PARAM: &str = "controller";
/// Placeholder name whose capture substitutes `{action}` in the route
pub const ACTION_PARAM: &str = "action";

/// Compiled matching artifact for one rule
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchPlan {
    /// Anchored regex source the pattern compiles to
    pub regex_source: String,
    /// For literal-only patterns, the exact normalized path; enables the
    /// matcher's string-equality fast path
    pub literal: Option<String>,
    /// Capture names that survive as route parameters
    /// (`controller`/`action` excluded)
    pub param_names: Vec<String>,
    /// Whether the pattern captures the controller component
    pub captures_controller: bool,
    /// Whether the pattern captures the action component
    pub captures_action: bool,
    /// Lazily compiled regex (not serialized)
    #[serde(skip)]
    compiled: OnceCell<Option<Regex>>,
}

// OnceCell is not Clone/PartialEq; plan identity is its serialized fields.
impl Clone for MatchPlan {
    fn clone(&self) -> Self {
        Self {
            regex_source: self.regex_source.clone(),
            literal: self.literal.clone(),
            param_names: self.param_names.clone(),
            captures_controller: self.captures_controller,
            captures_action: self.captures_action,
            compiled: OnceCell::new(),
        }
    }
}

impl PartialEq for MatchPlan {
    fn eq(&self, other: &Self) -> bool {
        self.regex_source == other.regex_source
            && self.literal == other.literal
            && self.param_names == other.param_names
            && self.captures_controller == other.captures_controller
            && self.captures_action == other.captures_action
    }
}

impl MatchPlan {
    /// The compiled regex, built on first use
    ///
    /// Returns `None` if the source does not compile (possible only for a
    /// forged or incompatible cached artifact); the matcher treats that as
    /// a non-match.
    pub fn regex(&self) -> Option<&Regex> {
        self.compiled
            .get_or_init(|| match Regex::new(&self.regex_source) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::warn!(
                        source = %self.regex_source,
                        "invalid compiled pattern source: {e}"
                    );
                    None
                }
            })
            .as_ref()
    }
}

/// One substitution token of a generation plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "lowercase")]
pub enum GenToken {
    /// Literal text emitted verbatim
    Literal { text: String },
    /// A required substitution slot
    Required { name: String },
    /// An optional slot; `prefix` is the literal text (e.g. a leading `/`)
    /// erased together with the slot when the parameter is unused
    Optional { name: String, prefix: String },
}

/// Required and optional parameter names of a generation plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotNames {
    pub required: Vec<String>,
    pub optional: Vec<String>,
}

/// Compiled generation artifact for one rule
#[derive(Debug, Serialize, Deserialize)]
pub struct GenPlan {
    /// The substitution tokens in pattern order
    pub tokens: Vec<GenToken>,
    /// Required/optional name sets, derived on first use (not serialized)
    #[serde(skip)]
    slots: OnceCell<SlotNames>,
}

impl Clone for GenPlan {
    fn clone(&self) -> Self {
        Self {
            tokens: self.tokens.clone(),
            slots: OnceCell::new(),
        }
    }
}

impl PartialEq for GenPlan {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl GenPlan {
    /// The required and optional parameter-name sets, memoized
    pub fn slots(&self) -> &SlotNames {
        self.slots.get_or_init(|| {
            let mut names = SlotNames::default();
            for token in &self.tokens {
                match token {
                    GenToken::Required { name } => names.required.push(name.clone()),
                    GenToken::Optional { name, .. } => names.optional.push(name.clone()),
                    GenToken::Literal { .. } => {}
                }
            }
            names
        })
    }
}

/// Compile a pattern's tokens into its matching plan
pub fn compile_match_plan(tokens: &[PatternToken]) -> MatchPlan {
    let mut source = String::from("^");
    let mut pending_literal = String::new();
    let mut literal_only = String::new();
    let mut is_literal_only = true;
    let mut param_names = Vec::new();
    let mut captures_controller = false;
    let mut captures_action = false;
    let mut open_optional_groups = 0usize;

    for token in tokens {
        match token {
            PatternToken::Literal { text } => {
                pending_literal.push_str(text);
                literal_only.push_str(text);
            }
            PatternToken::Placeholder {
                name,
                kind,
                optional,
            } => {
                is_literal_only = false;
                // An optional `any` must consume at least one character so
                // an empty tail reads as absent, not as an empty value.
                let class = if *optional && *kind == ParamKind::Any {
                    r"[^/]+"
                } else {
                    kind.char_class()
                };
                let capture = format!("(?P<{name}>{class})");

                if *optional {
                    // The literal run before an optional slot (its leading
                    // separator) belongs inside the optional group.
                    source.push_str("(?:");
                    source.push_str(&regex::escape(&pending_literal));
                    source.push_str(&capture);
                    pending_literal.clear();
                    open_optional_groups += 1;
                } else {
                    source.push_str(&regex::escape(&pending_literal));
                    source.push_str(&capture);
                    pending_literal.clear();
                }

                match name.as_str() {
                    CONTROLLER_PARAM => captures_controller = true,
                    ACTION_PARAM => captures_action = true,
                    _ => param_names.push(name.clone()),
                }
            }
        }
    }

    source.push_str(&regex::escape(&pending_literal));
    for _ in 0..open_optional_groups {
        source.push_str(")?");
    }
    source.push('$');

    MatchPlan {
        regex_source: source,
        literal: is_literal_only.then_some(literal_only),
        param_names,
        captures_controller,
        captures_action,
        compiled: OnceCell::new(),
    }
}

/// Compile a pattern's tokens into its generation plan
pub fn compile_gen_plan(tokens: &[PatternToken]) -> GenPlan {
    let mut gen_tokens: Vec<GenToken> = Vec::new();
    let mut pending_literal = String::new();

    for token in tokens {
        match token {
            PatternToken::Literal { text } => pending_literal.push_str(text),
            PatternToken::Placeholder { name, optional, .. } => {
                if *optional {
                    gen_tokens.push(GenToken::Optional {
                        name: name.clone(),
                        prefix: std::mem::take(&mut pending_literal),
                    });
                } else {
                    if !pending_literal.is_empty() {
                        gen_tokens.push(GenToken::Literal {
                            text: std::mem::take(&mut pending_literal),
                        });
                    }
                    gen_tokens.push(GenToken::Required { name: name.clone() });
                }
            }
        }
    }
    if !pending_literal.is_empty() {
        gen_tokens.push(GenToken::Literal {
            text: pending_literal,
        });
    }

    GenPlan {
        tokens: gen_tokens,
        slots: OnceCell::new(),
    }
}
