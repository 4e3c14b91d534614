//! HTTP method vocabulary and allowed-method sets

use crate::error::{Error, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The recognized HTTP method vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Connect,
    Trace,
}

impl HttpMethod {
    /// All methods, in declaration order
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Connect,
        HttpMethod::Trace,
    ];

    /// The canonical uppercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "HEAD" => Ok(HttpMethod::Head),
            "CONNECT" => Ok(HttpMethod::Connect),
            "TRACE" => Ok(HttpMethod::Trace),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

/// The set of HTTP methods a rule responds to
///
/// Either an explicit non-empty list or the wildcard `*` meaning every method
/// in the vocabulary. The default is `{GET, POST}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSet {
    /// Matches every method in the vocabulary
    Any,
    /// Matches the listed methods only
    Of(Vec<HttpMethod>),
}

impl MethodSet {
    /// Build a set from method names, rejecting unknown names and empty lists
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::Config(
                "allowed methods must not be empty".to_string(),
            ));
        }
        if names.len() == 1 && names[0].as_ref() == "*" {
            return Ok(MethodSet::Any);
        }
        let mut methods = Vec::with_capacity(names.len());
        for name in names {
            let method = name.as_ref().parse::<HttpMethod>()?;
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        Ok(MethodSet::Of(methods))
    }

    /// Check whether the set contains the given method
    pub fn contains(&self, method: HttpMethod) -> bool {
        match self {
            MethodSet::Any => true,
            MethodSet::Of(methods) => methods.contains(&method),
        }
    }

    /// The concrete methods this set expands to
    pub fn methods(&self) -> Vec<HttpMethod> {
        match self {
            MethodSet::Any => HttpMethod::ALL.to_vec(),
            MethodSet::Of(methods) => methods.clone(),
        }
    }
}

impl Default for MethodSet {
    fn default() -> Self {
        MethodSet::Of(vec![HttpMethod::Get, HttpMethod::Post])
    }
}

// Serialized as "*" for the wildcard or as a list of method names, so rule
// declarations in config files read naturally.
impl Serialize for MethodSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            MethodSet::Any => serializer.serialize_str("*"),
            MethodSet::Of(methods) => methods.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for MethodSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Wildcard(String),
            List(Vec<HttpMethod>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Wildcard(s) if s == "*" => Ok(MethodSet::Any),
            Repr::Wildcard(s) => Err(D::Error::custom(format!(
                "expected \"*\" or a list of methods, got \"{s}\""
            ))),
            Repr::List(methods) if methods.is_empty() => {
                Err(D::Error::custom("allowed methods must not be empty"))
            }
            Repr::List(methods) => Ok(MethodSet::Of(methods)),
        }
    }
}
