//! Validated instance names shared by every bounded context.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length for an instance name.
const MAX_INSTANCE_NAME_LENGTH: usize = 255;

/// Errors returned while validating an instance name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstanceNameError {
    /// The name is empty or only whitespace.
    #[error("instance name must not be empty")]
    Empty,

    /// The name starts or ends with whitespace.
    #[error("instance name '{0}' must not start or end with whitespace")]
    SurroundingWhitespace(String),

    /// The name cannot be used as a single path component.
    #[error("instance name '{0}' must be a single path component")]
    NotAPathComponent(String),

    /// The name exceeds the maximum length.
    #[error("instance name exceeds {MAX_INSTANCE_NAME_LENGTH} character limit: {0}")]
    TooLong(String),
}

/// Name of a sandboxed instance.
///
/// Instance names key the port registry and locate the instance's sandbox
/// directory, so they must be usable as one path component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceName(String);

impl InstanceName {
    /// Creates a validated instance name.
    ///
    /// The name is kept verbatim, so it matches registry keys exactly.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceNameError`] when the name is blank, has surrounding
    /// whitespace, contains a path separator or NUL, is `.` or `..`, or is
    /// too long.
    pub fn new(value: impl Into<String>) -> Result<Self, InstanceNameError> {
        let normalized = value.into();

        if normalized.trim().is_empty() {
            return Err(InstanceNameError::Empty);
        }
        if normalized.trim() != normalized {
            return Err(InstanceNameError::SurroundingWhitespace(normalized));
        }

        let is_component = normalized != "."
            && normalized != ".."
            && !normalized
                .chars()
                .any(|character| matches!(character, '/' | '\\' | '\0'));
        if !is_component {
            return Err(InstanceNameError::NotAPathComponent(normalized));
        }

        if normalized.len() > MAX_INSTANCE_NAME_LENGTH {
            return Err(InstanceNameError::TooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the instance name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InstanceName {
    type Error = InstanceNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InstanceName> for String {
    fn from(value: InstanceName) -> Self {
        value.0
    }
}

impl AsRef<str> for InstanceName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for InstanceName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
