//! Record identifiers.
//!
//! Every row in the store is keyed by a [`RecordId`]: a UUID v4 whose canonical text form is
//! **32 lowercase hexadecimal characters** with no hyphens (e.g.
//! `550e8400e29b41d4a716446655440000`). Identifiers supplied from outside the core (CLI
//! arguments, request bodies, URL paths) must already be canonical; other spellings of the same
//! UUID are rejected rather than normalised, so one row always has exactly one textual id.

use crate::{FrontDeskError, FrontDeskResult};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Canonical identifier for a stored row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Allocates a fresh identifier for a new row.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// # Errors
    ///
    /// Returns [`FrontDeskError::Validation`] if `input` is not 32 lowercase hex characters.
    pub fn parse(input: &str) -> FrontDeskResult<Self> {
        if !Self::is_canonical(input) {
            return Err(FrontDeskError::Validation(format!(
                "id must be 32 lowercase hex characters without hyphens, got: '{input}'"
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| FrontDeskError::Validation(format!("invalid id '{input}': {e}")))
    }

    /// Returns true if `input` is in canonical form.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = FrontDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordId::parse(s)
    }
}

impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}
