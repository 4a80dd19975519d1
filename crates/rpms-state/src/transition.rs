//! # Transition Table
//!
//! Which role may take which action, from which status, to which status.
//! The rules are static data; [`TransitionTable::check`] is the only place a
//! status change is validated.
//!
//! Two rule sets exist:
//!
//! - **Compatible** mirrors the deployed behavior. The generic `update`
//!   action accepts any of the seven statuses from any state for authors,
//!   editors, and admins; `recommend` fixes its target but not its source.
//! - **Strict** is the lifecycle graph documented on the crate root, with no
//!   edge out of a terminal state and authors restricted to their own papers.
//!
//! A change accepted under compatible rules that the strict graph would
//! refuse is returned with `guarded == false`.

use std::str::FromStr;

use rpms_core::{Role, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paper::StatusChange;
use crate::status::PaperStatus;
use PaperStatus::*;
use Role::{Admin, Author, Coordinator, Editor};

// ─── Actions ─────────────────────────────────────────────────────────

/// A workflow action on a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperAction {
    /// Submit a new paper.
    Create,
    /// Generic update: content fields plus a free-form status.
    Update,
    /// Recommend for publication.
    Recommend,
    /// Replace the publication metadata block.
    UpdateMetadata,
    /// Attach a review.
    Review,
    /// Delete the paper.
    Delete,
}

impl PaperAction {
    /// Every action.
    pub const ALL: [PaperAction; 6] = [
        Self::Create,
        Self::Update,
        Self::Recommend,
        Self::UpdateMetadata,
        Self::Review,
        Self::Delete,
    ];

    /// Stable name for logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Recommend => "recommend",
            Self::UpdateMetadata => "update_metadata",
            Self::Review => "review",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for PaperAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Enforcement mode ────────────────────────────────────────────────

/// Which rule set a table enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementMode {
    /// Deployed behavior: status whitelist only, no source-state guard.
    #[default]
    Compatible,
    /// Full lifecycle graph.
    Strict,
}

impl EnforcementMode {
    /// Configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compatible => "compatible",
            Self::Strict => "strict",
        }
    }
}

impl std::fmt::Display for EnforcementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnforcementMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compatible" => Ok(Self::Compatible),
            "strict" => Ok(Self::Strict),
            other => Err(ValidationError::UnknownSetting {
                setting: "enforcement mode",
                value: other.to_string(),
            }),
        }
    }
}

// ─── Rules ───────────────────────────────────────────────────────────

/// States a rule may start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The paper does not exist yet.
    New,
    /// Any existing status.
    Any,
    /// One of the listed statuses.
    Only(&'static [PaperStatus]),
}

impl Source {
    fn admits(&self, from: Option<PaperStatus>) -> bool {
        match (self, from) {
            (Self::New, None) => true,
            (Self::Any, Some(_)) => true,
            (Self::Only(set), Some(s)) => set.contains(&s),
            _ => false,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => f.write_str("(new)"),
            Self::Any => f.write_str("*"),
            Self::Only(set) => write_set(f, set),
        }
    }
}

/// States a rule may end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Any of the seven statuses.
    Any,
    /// One of the listed statuses.
    Only(&'static [PaperStatus]),
    /// The status must not change.
    Unchanged,
}

impl Target {
    fn admits(&self, from: Option<PaperStatus>, to: PaperStatus) -> bool {
        match self {
            Self::Any => true,
            Self::Only(set) => set.contains(&to),
            Self::Unchanged => from == Some(to),
        }
    }
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub action: PaperAction,
    pub roles: &'static [Role],
    pub from: Source,
    pub to: Target,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Only(set) => write_set(f, set),
            Self::Unchanged => f.write_str("(unchanged)"),
        }
    }
}

fn write_set(f: &mut std::fmt::Formatter<'_>, set: &[PaperStatus]) -> std::fmt::Result {
    for (i, status) in set.iter().enumerate() {
        if i > 0 {
            f.write_str("|")?;
        }
        f.write_str(status.as_str())?;
    }
    Ok(())
}

impl TransitionRule {
    fn admits(&self, role: Role, action: PaperAction, from: Option<PaperStatus>, to: PaperStatus) -> bool {
        self.action == action
            && self.roles.contains(&role)
            && self.from.admits(from)
            && self.to.admits(from, to)
    }
}

const AUTHORS: &[Role] = &[Author, Admin];
const UPDATERS: &[Role] = &[Author, Editor, Admin];
const EDITORS: &[Role] = &[Editor, Admin];
const METADATA_EDITORS: &[Role] = &[Editor, Coordinator, Admin];

#[rustfmt::skip]
const COMPATIBLE_RULES: &[TransitionRule] = &[
    TransitionRule { action: PaperAction::Create, roles: AUTHORS, from: Source::New, to: Target::Only(&[Submitted]) },
    TransitionRule { action: PaperAction::Update, roles: UPDATERS, from: Source::Any, to: Target::Any },
    TransitionRule { action: PaperAction::Recommend, roles: EDITORS, from: Source::Any, to: Target::Only(&[RecommendedForPublication]) },
    TransitionRule { action: PaperAction::UpdateMetadata, roles: METADATA_EDITORS, from: Source::Any, to: Target::Unchanged },
    TransitionRule { action: PaperAction::Review, roles: EDITORS, from: Source::Any, to: Target::Unchanged },
    TransitionRule { action: PaperAction::Delete, roles: AUTHORS, from: Source::Any, to: Target::Unchanged },
];

#[rustfmt::skip]
const STRICT_RULES: &[TransitionRule] = &[
    TransitionRule { action: PaperAction::Create, roles: AUTHORS, from: Source::New, to: Target::Only(&[Submitted]) },
    TransitionRule { action: PaperAction::Update, roles: &[Author], from: Source::Only(&[Draft]), to: Target::Only(&[Draft, Submitted]) },
    TransitionRule { action: PaperAction::Update, roles: EDITORS, from: Source::Only(&[Submitted]), to: Target::Only(&[UnderReview]) },
    TransitionRule { action: PaperAction::Update, roles: EDITORS, from: Source::Only(&[UnderReview]), to: Target::Only(&[Approved, Rejected]) },
    TransitionRule { action: PaperAction::Update, roles: &[Admin], from: Source::Only(&[RecommendedForPublication]), to: Target::Only(&[Published, Rejected]) },
    TransitionRule { action: PaperAction::Recommend, roles: EDITORS, from: Source::Only(&[Submitted, UnderReview, Approved]), to: Target::Only(&[RecommendedForPublication]) },
    TransitionRule { action: PaperAction::UpdateMetadata, roles: METADATA_EDITORS, from: Source::Any, to: Target::Unchanged },
    TransitionRule { action: PaperAction::Review, roles: EDITORS, from: Source::Only(&[Submitted, UnderReview]), to: Target::Unchanged },
    TransitionRule { action: PaperAction::Delete, roles: AUTHORS, from: Source::Any, to: Target::Unchanged },
];

// ─── Errors ──────────────────────────────────────────────────────────

/// A transition was refused. Nothing has been persisted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The role may not take this action at all.
    #[error("role '{role}' may not {action} papers")]
    ActionNotPermitted {
        role: Role,
        action: PaperAction,
    },

    /// The role may take the action, but not between these statuses.
    #[error("role '{role}' may not {action} a paper from {} to {to}", source_name(.from))]
    InvalidTransition {
        role: Role,
        action: PaperAction,
        from: Option<PaperStatus>,
        to: PaperStatus,
    },

    /// The paper is in a terminal status and the change would leave it.
    #[error("paper is in terminal status {status}")]
    TerminalState {
        status: PaperStatus,
    },

    /// Strict mode: authors may only act on their own papers.
    #[error("only the paper's author may {action} it")]
    NotOwner {
        action: PaperAction,
    },
}

fn source_name(from: &Option<PaperStatus>) -> &'static str {
    from.map_or("(new)", |s| s.as_str())
}

// ─── Table ───────────────────────────────────────────────────────────

/// A validated status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: PaperAction,
    pub from: Option<PaperStatus>,
    pub to: PaperStatus,
    /// Whether the strict graph would also have accepted this change.
    pub guarded: bool,
}

impl Transition {
    /// Whether the status actually moves.
    pub fn changes_status(&self) -> bool {
        self.from != Some(self.to)
    }

    /// The log entry for this transition, if the status moves.
    pub fn change(&self, actor_role: Role, at: Timestamp) -> Option<StatusChange> {
        self.changes_status().then(|| StatusChange {
            from: self.from,
            to: self.to,
            actor_role,
            at,
        })
    }
}

/// The role/action transition table for one enforcement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionTable {
    mode: EnforcementMode,
}

impl TransitionTable {
    /// Table for the given mode.
    pub fn new(mode: EnforcementMode) -> Self {
        Self { mode }
    }

    /// The compatible table.
    pub fn compatible() -> Self {
        Self::new(EnforcementMode::Compatible)
    }

    /// The strict table.
    pub fn strict() -> Self {
        Self::new(EnforcementMode::Strict)
    }

    /// Enforcement mode of this table.
    pub fn mode(&self) -> EnforcementMode {
        self.mode
    }

    /// The rules this table enforces.
    pub fn rules(&self) -> &'static [TransitionRule] {
        match self.mode {
            EnforcementMode::Compatible => COMPATIBLE_RULES,
            EnforcementMode::Strict => STRICT_RULES,
        }
    }

    /// Whether `role` may take `action` in some state.
    pub fn permits(&self, role: Role, action: PaperAction) -> bool {
        self.rules()
            .iter()
            .any(|r| r.action == action && r.roles.contains(&role))
    }

    /// Validate a change. `from` is `None` when creating.
    pub fn check(
        &self,
        role: Role,
        action: PaperAction,
        from: Option<PaperStatus>,
        to: PaperStatus,
    ) -> Result<Transition, StateError> {
        if !self.permits(role, action) {
            return Err(StateError::ActionNotPermitted { role, action });
        }
        let accepted = self
            .rules()
            .iter()
            .any(|r| r.admits(role, action, from, to));
        if !accepted {
            return Err(match from {
                Some(status) if status.is_terminal() && status != to => {
                    StateError::TerminalState { status }
                }
                _ => StateError::InvalidTransition { role, action, from, to },
            });
        }
        let guarded = match self.mode {
            EnforcementMode::Strict => true,
            EnforcementMode::Compatible => STRICT_RULES
                .iter()
                .any(|r| r.admits(role, action, from, to)),
        };
        Ok(Transition { action, from, to, guarded })
    }

    /// Strict mode confines authors to their own papers. Other roles, and
    /// every role in compatible mode, pass.
    pub fn check_ownership(
        &self,
        role: Role,
        action: PaperAction,
        is_author: bool,
    ) -> Result<(), StateError> {
        if self.mode == EnforcementMode::Strict && role == Role::Author && !is_author {
            return Err(StateError::NotOwner { action });
        }
        Ok(())
    }
}
