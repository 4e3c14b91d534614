//! The routing pattern grammar
//!
//! A pattern is a `/`-delimited path template mixing literal text with typed
//! placeholders:
//!
//! - `{name:type}` — a required placeholder
//! - `{name:type:?}` — an optional placeholder, only valid in the trailing
//!   run of the pattern
//! - `{name}` — shorthand for `{name:str}`
//!
//! A single path segment may combine several parts, e.g.
//! `/articles/{id:uuid}{tail:any:?}`. Parsing produces a flat token list
//! ([`PatternToken`]) that the compiler turns into matching and generation
//! plans.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The type of value a placeholder accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// One or more word characters (letters, digits, underscore, hyphen)
    Str,
    /// One or more digits
    Num,
    /// A canonical UUID (8-4-4-4-12 hex groups, case-insensitive)
    Uuid,
    /// Zero or more of any character except `/`
    Any,
}

impl ParamKind {
    /// The regex character class this kind matches
    pub fn char_class(&self) -> &'static str {
        match self {
            ParamKind::Str => r"[\w-]+",
            ParamKind::Num => r"[0-9]+",
            ParamKind::Uuid => {
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}"
            }
            ParamKind::Any => r"[^/]*",
        }
    }

    /// The grammar name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Str => "str",
            ParamKind::Num => "num",
            ParamKind::Uuid => "uuid",
            ParamKind::Any => "any",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamKind {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "str" => Ok(ParamKind::Str),
            "num" => Ok(ParamKind::Num),
            "uuid" => Ok(ParamKind::Uuid),
            "any" => Ok(ParamKind::Any),
            _ => Err(()),
        }
    }
}

/// One parsed piece of a pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "token", rename_all = "lowercase")]
pub enum PatternToken {
    /// Literal path text, matched exactly
    Literal { text: String },
    /// A typed, possibly optional capture
    Placeholder {
        name: String,
        kind: ParamKind,
        optional: bool,
    },
}

impl PatternToken {
    /// The placeholder name, if this token is one
    pub fn placeholder_name(&self) -> Option<&str> {
        match self {
            PatternToken::Placeholder { name, .. } => Some(name),
            PatternToken::Literal { .. } => None,
        }
    }

    /// Whether this token is an optional placeholder
    pub fn is_optional(&self) -> bool {
        matches!(self, PatternToken::Placeholder { optional: true, .. })
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn invalid(pattern: &str, reason: impl Into<String>) -> Error {
    Error::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

/// Parse a pattern string into its token list
///
/// Validates placeholder syntax, rejects duplicate placeholder names, and
/// enforces that optional placeholders appear only in the trailing run of
/// the pattern.
pub fn parse_pattern(pattern: &str) -> Result<Vec<PatternToken>> {
    let mut tokens: Vec<PatternToken> = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '{' {
            literal.push(c);
            continue;
        }

        if !literal.is_empty() {
            tokens.push(PatternToken::Literal {
                text: std::mem::take(&mut literal),
            });
        }

        let mut body = String::new();
        let mut closed = false;
        for inner in chars.by_ref() {
            if inner == '}' {
                closed = true;
                break;
            }
            body.push(inner);
        }
        if !closed {
            return Err(invalid(pattern, "unterminated placeholder"));
        }

        let mut parts = body.split(':');
        let name = parts.next().unwrap_or_default().to_string();
        if !is_valid_name(&name) {
            return Err(invalid(
                pattern,
                format!("invalid placeholder name '{name}'"),
            ));
        }

        let mut kind = ParamKind::Str;
        let mut optional = false;
        if let Some(type_part) = parts.next() {
            if type_part == "?" {
                optional = true;
            } else {
                kind = type_part.parse().map_err(|()| {
                    invalid(pattern, format!("unknown placeholder type '{type_part}'"))
                })?;
                if let Some(flag) = parts.next() {
                    if flag != "?" {
                        return Err(invalid(
                            pattern,
                            format!("unexpected placeholder flag '{flag}'"),
                        ));
                    }
                    optional = true;
                }
            }
        }
        if parts.next().is_some() {
            return Err(invalid(pattern, "too many ':' separators in placeholder"));
        }

        tokens.push(PatternToken::Placeholder {
            name,
            kind,
            optional,
        });
    }

    if !literal.is_empty() {
        tokens.push(PatternToken::Literal { text: literal });
    }

    validate_tokens(pattern, &tokens)?;
    Ok(tokens)
}

fn validate_tokens(pattern: &str, tokens: &[PatternToken]) -> Result<()> {
    let mut seen: Vec<&str> = Vec::new();
    for token in tokens {
        if let Some(name) = token.placeholder_name() {
            if seen.contains(&name) {
                return Err(invalid(
                    pattern,
                    format!("duplicate placeholder name '{name}'"),
                ));
            }
            seen.push(name);
        }
    }

    // Optional placeholders must form the trailing run: no required
    // placeholder after the first optional one, and no dangling literal
    // after the last placeholder once an optional has appeared.
    let first_optional = tokens.iter().position(PatternToken::is_optional);
    if let Some(start) = first_optional {
        for token in &tokens[start..] {
            if let PatternToken::Placeholder {
                name,
                optional: false,
                ..
            } = token
            {
                return Err(invalid(
                    pattern,
                    format!("required placeholder '{name}' follows an optional one"),
                ));
            }
        }
        if matches!(tokens.last(), Some(PatternToken::Literal { .. })) {
            return Err(invalid(
                pattern,
                "literal text after an optional placeholder",
            ));
        }
    }

    Ok(())
}
