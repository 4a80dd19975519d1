//! # Validation Errors
//!
//! Malformed input rejected before any mutation takes place. Every variant
//! carries enough context to tell the caller which field was wrong.

use thiserror::Error;

/// Input failed validation. No side effects have occurred.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was empty or whitespace.
    #[error("{field} is required")]
    Required {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A text field exceeded its maximum length (in characters).
    #[error("{field} must be at most {max} characters, got {len}")]
    TooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum accepted length.
        max: usize,
        /// Actual length.
        len: usize,
    },

    /// Unknown paper status string.
    #[error("unknown paper status {0:?}")]
    UnknownStatus(String),

    /// Unknown role string.
    #[error("unknown role {0:?}")]
    UnknownRole(String),

    /// Unknown paper type string.
    #[error("unknown paper type {0:?}")]
    UnknownPaperKind(String),

    /// Publication identifier does not match `SMU_P` followed by digits.
    #[error("malformed publication identifier {0:?}")]
    MalformedPublicationId(String),

    /// A configuration value outside its accepted set.
    #[error("unknown {setting} {value:?}")]
    UnknownSetting {
        /// Which setting was being parsed.
        setting: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Review rating outside 1..=5.
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i32),

    /// Timestamp could not be parsed.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// Identifier could not be parsed as a UUID.
    #[error("invalid {kind} id {value:?}")]
    InvalidId {
        /// Which identifier namespace was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// Require a non-blank string of at most `max` characters.
pub fn require_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { field, max, len });
    }
    Ok(())
}
