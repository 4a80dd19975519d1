//! # Temporal Types: UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only timestamp truncated to microsecond
//! precision. PostgreSQL `timestamptz` stores microseconds, so a value read
//! back from the database compares equal to the value that was written.
//!
//! Creation times order notification and paper listings (newest first), and
//! the editor-supplied publication date is carried as a `Timestamp` too.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_micros(Utc::now()))
    }

    /// Wrap a `chrono::DateTime<Utc>`, truncating below microseconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_micros(dt))
    }

    /// Parse an RFC 3339 string. Any offset is accepted and converted to UTC;
    /// publication dates arrive from browsers in local time.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_micros(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Consume into the inner `DateTime<Utc>`, for binding to SQL parameters.
    pub fn into_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Render as RFC 3339 with a `Z` suffix.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

fn truncate_to_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
    let micros = dt.nanosecond() / 1_000;
    dt.with_nanosecond(micros * 1_000).unwrap_or(dt)
}
