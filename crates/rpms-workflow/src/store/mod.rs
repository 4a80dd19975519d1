//! # Repositories
//!
//! The persistence seams of the workflow. Each trait is object safe so the
//! orchestrator can hold `Arc<dyn ...>` and switch between the in-memory
//! backend ([`memory`]) and Postgres ([`crate::db`]) at startup.
//!
//! Writes are single-row and atomic. There is no cross-row transaction:
//! a paper write and the notifications it triggers commit independently.

pub mod memory;

use async_trait::async_trait;
use rpms_core::{NotificationId, PaperId, Role, Timestamp, UserId};
use rpms_state::{Paper, PaperContent, PaperMetadata, PaperStatus, StatusChange};

use crate::error::StoreError;
use crate::model::{Notification, PaperWithAuthor, Review, ReviewWithReviewer};

/// A partial update of one paper row.
///
/// Only the parts that are `Some` are written, so concurrent writers of
/// different parts do not overwrite each other.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperPatch {
    /// New author-supplied text.
    pub content: Option<PaperContent>,
    /// Replacement metadata block.
    pub metadata: Option<PaperMetadata>,
    /// Status move to apply and append to the log.
    pub status_change: Option<StatusChange>,
    /// Fail with [`StoreError::StaleStatus`] unless the row is in this status.
    pub expected_status: Option<PaperStatus>,
    pub updated_at: Timestamp,
}

impl PaperPatch {
    /// An empty patch stamped `updated_at`.
    pub fn at(updated_at: Timestamp) -> Self {
        Self {
            content: None,
            metadata: None,
            status_change: None,
            expected_status: None,
            updated_at,
        }
    }

    pub fn with_content(mut self, content: PaperContent) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_metadata(mut self, metadata: PaperMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_status_change(mut self, change: Option<StatusChange>) -> Self {
        self.status_change = change;
        self
    }

    pub fn expecting(mut self, status: Option<PaperStatus>) -> Self {
        self.expected_status = status;
        self
    }

    /// Apply to an in-memory paper. The caller checks `expected_status`.
    pub fn apply_to(&self, paper: &mut Paper) {
        if let Some(content) = &self.content {
            paper.set_content(content.clone());
        }
        if let Some(metadata) = &self.metadata {
            paper.metadata = metadata.clone();
        }
        if let Some(change) = &self.status_change {
            paper.record(change.clone());
        }
        paper.updated_at = self.updated_at;
    }
}

/// Paper rows.
#[async_trait]
pub trait PaperRepository: Send + Sync {
    /// Insert a new paper.
    async fn insert_paper(&self, paper: &Paper) -> Result<(), StoreError>;

    async fn get_paper(&self, id: PaperId) -> Result<Option<Paper>, StoreError>;

    /// Apply a patch and return the updated row, or `None` if it is gone.
    ///
    /// Fails with [`StoreError::DuplicatePublicationId`] when the patch
    /// assigns an identifier another paper already holds.
    async fn update_paper(&self, id: PaperId, patch: &PaperPatch)
        -> Result<Option<Paper>, StoreError>;

    /// Delete a paper. Returns whether a row was removed.
    async fn delete_paper(&self, id: PaperId) -> Result<bool, StoreError>;

    /// All papers with their authors, newest first.
    async fn list_papers(&self) -> Result<Vec<PaperWithAuthor>, StoreError>;

    /// The greatest stored publication identifier carrying the standard
    /// prefix, compared as text.
    async fn max_publication_id(&self) -> Result<Option<String>, StoreError>;
}

/// Review rows.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert_review(&self, review: &Review) -> Result<(), StoreError>;

    /// Reviews with their reviewers and paper titles, newest first,
    /// optionally for one paper.
    async fn list_reviews(
        &self,
        paper: Option<PaperId>,
    ) -> Result<Vec<ReviewWithReviewer>, StoreError>;
}

/// Who should hear about an event.
#[async_trait]
pub trait RecipientResolver: Send + Sync {
    /// Every user holding `role`.
    async fn users_with_role(&self, role: Role) -> Result<Vec<UserId>, StoreError>;

    /// The reviewer of the paper's earliest review, if any exists.
    async fn reviewer_of_record(&self, paper: PaperId) -> Result<Option<UserId>, StoreError>;
}

/// Notification rows.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError>;

    /// A user's notifications, newest first.
    async fn notifications_for(&self, user: UserId) -> Result<Vec<Notification>, StoreError>;

    /// Mark read if it belongs to `user`. `None` when no such notification
    /// exists for that user.
    async fn mark_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> Result<Option<Notification>, StoreError>;
}
