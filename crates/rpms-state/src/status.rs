//! # Paper Status
//!
//! The seven persisted status strings are a bit-exact compatibility surface:
//! no other value may ever be written to the `status` column.

use std::str::FromStr;

use rpms_core::ValidationError;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperStatus {
    /// Being written; editable by its author.
    Draft,
    /// Handed in by the author. Papers are created in this state.
    Submitted,
    /// An editor is reviewing it.
    UnderReview,
    /// Accepted by an editor.
    Approved,
    /// Turned down (terminal).
    Rejected,
    /// An editor has asked the admins to publish it.
    RecommendedForPublication,
    /// Published (terminal).
    Published,
}

impl PaperStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [PaperStatus; 7] = [
        Self::Draft,
        Self::Submitted,
        Self::UnderReview,
        Self::Approved,
        Self::Rejected,
        Self::RecommendedForPublication,
        Self::Published,
    ];

    /// The persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::RecommendedForPublication => "recommended_for_publication",
            Self::Published => "published",
        }
    }

    /// Look up a status by its persisted name. Case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// Terminal for the happy (`published`) and unhappy (`rejected`) paths.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Rejected)
    }
}

impl FromStr for PaperStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for PaperStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
