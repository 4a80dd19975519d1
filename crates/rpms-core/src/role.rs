//! # Roles and Caller Identity
//!
//! A user holds exactly one role for life; there is no promotion path.
//! Roles gate both which workflow actions a caller may take and which
//! audience a notification fans out to.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::UserId;

/// The four institutional roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Submits papers and receives review feedback.
    Author,
    /// Reviews papers, edits publication metadata, recommends for publication.
    Editor,
    /// Decides publication outcome.
    Admin,
    /// Validates publication metadata.
    Coordinator,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 4] = [Self::Author, Self::Editor, Self::Admin, Self::Coordinator];

    /// The persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Editor => "editor",
            Self::Admin => "admin",
            Self::Coordinator => "coordinator",
        }
    }

    /// Look up a role by its persisted name. Case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "author" => Some(Self::Author),
            "editor" => Some(Self::Editor),
            "admin" => Some(Self::Admin),
            "coordinator" => Some(Self::Coordinator),
            _ => None,
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ValidationError::UnknownRole(s.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller, as established by the access-control layer.
///
/// The workflow trusts this value; it does not re-read the user's role from
/// storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Who is acting.
    pub user_id: UserId,
    /// The role they act in.
    pub role: Role,
}

impl Actor {
    /// Build an actor from an ID and a role.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}
