//! # Workflow Errors
//!
//! [`StoreError`] is what a repository reports. [`WorkflowError`] is what a
//! caller of [`Workflow`](crate::Workflow) sees; [`WorkflowError::kind`]
//! folds it into the four categories a transport layer maps to status codes.
//! [`NotificationError`] never reaches a caller: the dispatcher logs it.

use rpms_core::{PaperId, UserId, ValidationError};
use rpms_state::{PaperStatus, StateError};
use thiserror::Error;

/// Failure reported by a repository.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The publication identifier is already held by another paper.
    #[error("publication identifier {0} is already assigned to another paper")]
    DuplicatePublicationId(String),

    /// The row changed status between read and write.
    #[error("paper status changed concurrently: expected {expected}, found {actual}")]
    StaleStatus {
        expected: PaperStatus,
        actual: PaperStatus,
    },

    /// Some other integrity constraint rejected the write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A persisted row could not be mapped back to the domain.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

/// Name of the unique constraint on `papers.publication_id`.
pub const PUBLICATION_ID_CONSTRAINT: &str = "papers_publication_id_key";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.constraint() == Some(PUBLICATION_ID_CONSTRAINT) {
                return Self::DuplicatePublicationId(db.message().to_string());
            }
            // Class 23: integrity constraint violation.
            if db.code().is_some_and(|code| code.starts_with("23")) {
                return Self::Constraint(db.message().to_string());
            }
        }
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(e.to_string())
            }
            other => Self::Database(other),
        }
    }
}

/// Failure category of a workflow operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input or a disallowed transition.
    Validation,
    /// The addressed entity does not exist.
    NotFound,
    /// A uniqueness or concurrency conflict.
    Conflict,
    /// The store failed.
    Persistence,
}

impl ErrorKind {
    /// Stable name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Persistence => "persistence",
        }
    }
}

/// Failure of a workflow operation.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The transition table refused the operation.
    #[error(transparent)]
    Transition(#[from] StateError),

    /// The addressed entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every allocated identifier collided.
    #[error("no free publication identifier after {attempts} attempts")]
    IdentifierExhausted { attempts: u32 },
}

impl WorkflowError {
    /// Shorthand for a missing paper.
    pub fn paper_not_found(id: PaperId) -> Self {
        Self::NotFound {
            entity: "paper",
            id: id.to_string(),
        }
    }

    /// The failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Transition(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::IdentifierExhausted { .. } => ErrorKind::Conflict,
            Self::Store(StoreError::DuplicatePublicationId(_) | StoreError::StaleStatus { .. }) => {
                ErrorKind::Conflict
            }
            Self::Store(_) => ErrorKind::Persistence,
        }
    }
}

/// Failure while fanning out an event. Logged, never returned to callers.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// Recipient lookup failed.
    #[error("resolving recipients for {audience}: {source}")]
    Resolve {
        audience: String,
        #[source]
        source: StoreError,
    },

    /// Writing a notification failed.
    #[error("delivering to {recipient}: {source}")]
    Deliver {
        recipient: UserId,
        #[source]
        source: StoreError,
    },
}
