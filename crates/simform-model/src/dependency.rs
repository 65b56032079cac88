//! Field references of the form `model.field`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DependencyError;

/// Field name meaning "every field of the model".
pub const WILDCARD: &str = "*";

/// A reference to one field of one model, or to all of its fields.
///
/// Equality is structural, so a dependency parsed on one render pass matches
/// the same dependency parsed on the next.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dependency {
    pub model_name: String,
    pub field_name: String,
}

impl Dependency {
    /// Create a dependency from its parts.
    pub fn new(model_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            field_name: field_name.into(),
        }
    }

    /// A dependency on every field of `model_name`.
    pub fn all_fields(model_name: impl Into<String>) -> Self {
        Self::new(model_name, WILDCARD)
    }

    /// Parse `"model.field"`.
    ///
    /// Empty segments are discarded, so `"beam..energy"` is accepted; any
    /// other number of segments is rejected.
    pub fn parse(input: &str) -> Result<Self, DependencyError> {
        let mut segments = input.split('.').filter(|s| !s.is_empty());
        match (segments.next(), segments.next(), segments.next()) {
            (Some(model), Some(field), None) if model != WILDCARD => Ok(Self::new(model, field)),
            _ => Err(DependencyError::Malformed {
                input: input.to_string(),
            }),
        }
    }

    /// Parse a list of dependency strings.
    pub fn parse_all<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Self>, DependencyError> {
        inputs.iter().map(|s| Self::parse(s.as_ref())).collect()
    }

    /// Whether this refers to all fields of the model.
    pub fn is_wildcard(&self) -> bool {
        self.field_name == WILDCARD
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model_name, self.field_name)
    }
}

impl FromStr for Dependency {
    type Err = DependencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Dependency {
    type Error = DependencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Dependency> for String {
    fn from(dependency: Dependency) -> Self {
        dependency.to_string()
    }
}
