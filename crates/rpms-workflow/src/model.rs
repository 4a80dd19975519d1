//! Records the workflow reads and writes besides papers, and the inputs of
//! the mutating operations.

use rpms_core::error::require_text;
use rpms_core::{NotificationId, PaperId, ReviewId, Role, Timestamp, UserId, ValidationError};
use rpms_state::{Paper, PaperContent, PaperStatus};
use serde::{Deserialize, Serialize};

/// Longest accepted notification message, in characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Longest accepted review recommendation, in characters.
pub const MAX_RECOMMENDATION_LEN: usize = 2000;

/// A user as the workflow needs them: identity and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl UserRecord {
    /// A user with a fresh id.
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }
}

/// Input of the generic paper update: content plus a target status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperUpdate {
    #[serde(flatten)]
    pub content: PaperContent,
    pub status: PaperStatus,
}

/// A review of a paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub paper_id: PaperId,
    pub reviewer_id: UserId,
    pub rating: i32,
    #[serde(default)]
    pub comments: String,
    pub recommendation: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A paper with its author's contact details, as listings show it.
///
/// The author fields are `None` when the author has no user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperWithAuthor {
    #[serde(flatten)]
    pub paper: Paper,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

/// A review with its reviewer's contact details and the paper's title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewWithReviewer {
    #[serde(flatten)]
    pub review: Review,
    pub reviewer_name: Option<String>,
    pub reviewer_email: Option<String>,
    pub paper_title: String,
}

/// Input of a review submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub paper_id: PaperId,
    pub rating: i32,
    #[serde(default)]
    pub comments: String,
    pub recommendation: String,
}

impl NewReview {
    /// Rating must be 1..=5 and a recommendation is required.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ValidationError::RatingOutOfRange(self.rating));
        }
        require_text("recommendation", &self.recommendation, MAX_RECOMMENDATION_LEN)
    }

    /// Stamp the input into a stored review.
    pub fn into_review(self, reviewer_id: UserId, now: Timestamp) -> Review {
        Review {
            id: ReviewId::new(),
            paper_id: self.paper_id,
            reviewer_id,
            rating: self.rating,
            comments: self.comments,
            recommendation: self.recommendation,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A message delivered to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub message: String,
    pub paper_id: Option<PaperId>,
    pub is_read: bool,
    pub created_at: Timestamp,
}

impl Notification {
    /// An unread notification stamped `now`.
    pub fn unread(
        user_id: UserId,
        message: impl Into<String>,
        paper_id: Option<PaperId>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            message: message.into(),
            paper_id,
            is_read: false,
            created_at: now,
        }
    }
}

/// Input of a manually sent notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualNotification {
    pub user_id: UserId,
    pub message: String,
    #[serde(default)]
    pub paper_id: Option<PaperId>,
}

impl ManualNotification {
    /// A message is required.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("message", &self.message, MAX_MESSAGE_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: i32, recommendation: &str) -> NewReview {
        NewReview {
            paper_id: PaperId::new(),
            rating,
            comments: String::new(),
            recommendation: recommendation.into(),
        }
    }

    #[test]
    fn rating_bounds() {
        assert!(review(1, "accept").validate().is_ok());
        assert!(review(5, "accept").validate().is_ok());
        assert_eq!(
            review(0, "accept").validate(),
            Err(ValidationError::RatingOutOfRange(0))
        );
        assert_eq!(
            review(6, "accept").validate(),
            Err(ValidationError::RatingOutOfRange(6))
        );
    }

    #[test]
    fn recommendation_required() {
        assert_eq!(
            review(3, "  ").validate(),
            Err(ValidationError::Required {
                field: "recommendation"
            })
        );
    }

    #[test]
    fn into_review_keeps_input_verbatim() {
        let reviewer = UserId::new();
        let now = Timestamp::now();
        let input = review(4, "accept with minor revisions");
        let paper_id = input.paper_id;
        let stored = input.into_review(reviewer, now);
        assert_eq!(stored.paper_id, paper_id);
        assert_eq!(stored.reviewer_id, reviewer);
        assert_eq!(stored.recommendation, "accept with minor revisions");
        assert_eq!(stored.created_at, now);
    }

    #[test]
    fn paper_update_reads_flat_json() {
        let update: PaperUpdate = serde_json::from_str(
            r#"{"title":"Soil Retention in Arid Zones","abstract":"","status":"under_review"}"#,
        )
        .unwrap();
        assert_eq!(update.status, PaperStatus::UnderReview);
        assert_eq!(update.content.title, "Soil Retention in Arid Zones");
    }

    #[test]
    fn manual_message_required() {
        let msg = ManualNotification {
            user_id: UserId::new(),
            message: String::new(),
            paper_id: None,
        };
        assert!(msg.validate().is_err());
    }
}
