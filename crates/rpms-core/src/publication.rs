//! # Publication Identifiers
//!
//! Human-readable identifiers assigned to papers cleared for publication:
//! the fixed prefix `SMU_P` followed by ASCII decimal digits, case-sensitive,
//! no separators. Historical identifiers carry nine digits
//! (`SMU_P201817001`) but nothing pads or caps the width: the successor of
//! `SMU_P999999999` is `SMU_P1000000000`, and a stored `SMU_P007` is
//! followed by `SMU_P8`.
//!
//! The persisted text is kept verbatim. Two identifiers are equal only if
//! their text is equal, which is what the database's unique constraint sees.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Fixed textual prefix of every publication identifier.
pub const PUBLICATION_PREFIX: &str = "SMU_P";

/// Identifier handed out when nothing usable has been allocated yet.
pub const SEED_PUBLICATION_ID: &str = "SMU_P201817001";

/// Numeric suffix of [`SEED_PUBLICATION_ID`].
pub const SEED_NUMBER: u64 = 201_817_001;

/// Largest numeric suffix. The Postgres counter is a `BIGINT`.
pub const MAX_NUMBER: u64 = i64::MAX as u64;

/// A validated publication identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicationId {
    text: String,
    number: u64,
}

impl PublicationId {
    /// Parse `SMU_P` followed by one or more ASCII digits.
    ///
    /// Rejects a missing or differently-cased prefix, an empty suffix, any
    /// non-digit character (including signs and whitespace), and suffixes
    /// above [`MAX_NUMBER`].
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let malformed = || ValidationError::MalformedPublicationId(s.to_string());
        let digits = s.strip_prefix(PUBLICATION_PREFIX).ok_or_else(malformed)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let number = digits
            .parse::<u64>()
            .ok()
            .filter(|n| *n <= MAX_NUMBER)
            .ok_or_else(malformed)?;
        Ok(Self {
            text: s.to_string(),
            number,
        })
    }

    /// The seed identifier, `SMU_P201817001`.
    pub fn seed() -> Self {
        Self::from_number(SEED_NUMBER)
    }

    /// Format `SMU_P{number}` with no padding. `number` must not exceed
    /// [`MAX_NUMBER`].
    pub fn from_number(number: u64) -> Self {
        Self {
            text: format!("{PUBLICATION_PREFIX}{number}"),
            number,
        }
    }

    /// The numeric suffix.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// The identifier whose suffix is one greater, or `None` past
    /// [`MAX_NUMBER`].
    pub fn successor(&self) -> Option<Self> {
        self.number
            .checked_add(1)
            .filter(|n| *n <= MAX_NUMBER)
            .map(Self::from_number)
    }

    /// The identifier exactly as stored.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl FromStr for PublicationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PublicationId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PublicationId> for String {
    fn from(id: PublicationId) -> Self {
        id.text
    }
}

impl std::fmt::Display for PublicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
