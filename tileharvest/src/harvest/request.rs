//! Strongly typed harvest input.

use crate::coord::Coordinate;
use std::fmt;
use thiserror::Error;

/// Longest identifier accepted; keeps artifact names well under filesystem limits.
const MAX_IDENTIFIER_LEN: usize = 128;

/// Reasons an identifier cannot name an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier is longer than {MAX_IDENTIFIER_LEN} characters")]
    TooLong,
    #[error("identifier '{0}' may only contain ASCII letters, digits, '-', '_' and '.'")]
    InvalidCharacter(String),
}

/// Stable key naming an item's artifact (`tile_id_{identifier}.jpg`).
///
/// Only ASCII alphanumerics, `-`, `_` and `.` are allowed, and a leading
/// `.` is refused, so an identifier can never escape the output directory
/// or collide with the store's hidden temp files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Validates and wraps an identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        if value.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if value.len() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong);
        }
        let valid = !value.starts_with('.')
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(IdentifierError::InvalidCharacter(value));
        }
        Ok(Self(value))
    }

    /// Identifier derived from a row position.
    pub fn from_index(index: usize) -> Self {
        Self(index.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One item of a harvesting batch.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestRequest {
    pub coordinate: Coordinate,
    pub identifier: Identifier,
}

impl HarvestRequest {
    pub fn new(coordinate: Coordinate, identifier: Identifier) -> Self {
        Self {
            coordinate,
            identifier,
        }
    }
}
