//! # Notification Fan-out
//!
//! Turns a [`WorkflowEvent`] into deliveries. The audience rules and message
//! wording are pure data ([`announcements`]); turning an audience into user
//! ids goes through a [`RecipientResolver`].
//!
//! | Event | Audience |
//! |---|---|
//! | paper submitted | every editor |
//! | recommended | every admin |
//! | metadata updated | every admin, and separately every coordinator |
//! | decided | the reviewer of record, if any |
//! | review submitted | the paper's author |

use std::sync::Arc;

use rpms_core::{Actor, PaperId, Role, UserId};
use rpms_state::PaperStatus;

use crate::error::NotificationError;
use crate::store::RecipientResolver;

/// A published or rejected outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Published,
    Rejected,
}

impl Decision {
    /// The decision a status represents, if it is one.
    pub fn from_status(status: PaperStatus) -> Option<Self> {
        match status {
            PaperStatus::Published => Some(Self::Published),
            PaperStatus::Rejected => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    PaperSubmitted,
    Recommended,
    MetadataUpdated,
    Decided {
        decision: Decision,
    },
    ReviewSubmitted {
        author_id: UserId,
        rating: i32,
        recommendation: String,
    },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PaperSubmitted => "paper_submitted",
            Self::Recommended => "recommended",
            Self::MetadataUpdated => "metadata_updated",
            Self::Decided { .. } => "decided",
            Self::ReviewSubmitted { .. } => "review_submitted",
        }
    }
}

/// A committed workflow change worth telling someone about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowEvent {
    pub paper_id: PaperId,
    /// Paper title as of the change.
    pub title: String,
    pub actor: Actor,
    pub kind: EventKind,
}

impl WorkflowEvent {
    pub fn new(paper_id: PaperId, title: impl Into<String>, actor: Actor, kind: EventKind) -> Self {
        Self {
            paper_id,
            title: title.into(),
            actor,
            kind,
        }
    }
}

/// Who an announcement is for, before resolution to user ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    /// Every user holding the role.
    Role(Role),
    /// The reviewer of some review of the paper.
    ReviewerOfRecord(PaperId),
    /// One specific user.
    User(UserId),
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role {role}"),
            Self::ReviewerOfRecord(paper) => write!(f, "reviewer of record for {paper}"),
            Self::User(user) => write!(f, "user {user}"),
        }
    }
}

/// One message for one audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub audience: Audience,
    pub message: String,
}

impl Announcement {
    fn new(audience: Audience, message: String) -> Self {
        Self { audience, message }
    }
}

/// The announcements an event produces, in delivery order.
pub fn announcements(event: &WorkflowEvent) -> Vec<Announcement> {
    let title = &event.title;
    match &event.kind {
        EventKind::PaperSubmitted => vec![Announcement::new(
            Audience::Role(Role::Editor),
            format!("New paper submitted: {title}"),
        )],
        EventKind::Recommended => vec![Announcement::new(
            Audience::Role(Role::Admin),
            format!("Paper '{title}' has been recommended for publication by an editor"),
        )],
        EventKind::MetadataUpdated => vec![
            Announcement::new(
                Audience::Role(Role::Admin),
                format!("Paper details updated for '{title}' by Editor"),
            ),
            Announcement::new(
                Audience::Role(Role::Coordinator),
                format!("Paper details updated for '{title}' by Editor. Please validate."),
            ),
        ],
        EventKind::Decided { decision } => vec![Announcement::new(
            Audience::ReviewerOfRecord(event.paper_id),
            format!(
                "Admin decision: Paper '{title}' has been {}",
                decision.as_str()
            ),
        )],
        EventKind::ReviewSubmitted {
            author_id,
            rating,
            recommendation,
        } => vec![Announcement::new(
            Audience::User(*author_id),
            format!(
                "Your paper '{title}' has been reviewed. Rating: {rating}/5, Recommendation: {recommendation}"
            ),
        )],
    }
}

/// One notification to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipient: UserId,
    pub message: String,
    pub paper_id: Option<PaperId>,
}

/// Resolves announcements to deliveries.
#[derive(Clone)]
pub struct FanOut {
    resolver: Arc<dyn RecipientResolver>,
}

impl FanOut {
    pub fn new(resolver: Arc<dyn RecipientResolver>) -> Self {
        Self { resolver }
    }

    /// Deliveries for one announcement of `event`.
    pub async fn resolve(
        &self,
        event: &WorkflowEvent,
        announcement: &Announcement,
    ) -> Result<Vec<Delivery>, NotificationError> {
        let resolve_err = |source| NotificationError::Resolve {
            audience: announcement.audience.to_string(),
            source,
        };
        let recipients = match announcement.audience {
            Audience::Role(role) => self
                .resolver
                .users_with_role(role)
                .await
                .map_err(resolve_err)?,
            Audience::ReviewerOfRecord(paper) => {
                let reviewer = self
                    .resolver
                    .reviewer_of_record(paper)
                    .await
                    .map_err(resolve_err)?;
                if reviewer.is_none() {
                    tracing::debug!(paper_id = %paper, "no reviewer of record, nothing to notify");
                }
                reviewer.into_iter().collect()
            }
            Audience::User(user) => vec![user],
        };
        Ok(recipients
            .into_iter()
            .map(|recipient| Delivery {
                recipient,
                message: announcement.message.clone(),
                paper_id: Some(event.paper_id),
            })
            .collect())
    }

    /// Every delivery for `event`. Fails on the first resolution error.
    pub async fn plan(&self, event: &WorkflowEvent) -> Result<Vec<Delivery>, NotificationError> {
        let mut deliveries = Vec::new();
        for announcement in announcements(event) {
            deliveries.extend(self.resolve(event, &announcement).await?);
        }
        Ok(deliveries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewReview, UserRecord};
    use crate::store::memory::MemoryStore;
    use crate::store::ReviewRepository;
    use rpms_core::Timestamp;

    fn event(kind: EventKind) -> WorkflowEvent {
        WorkflowEvent::new(
            PaperId::new(),
            "Soil Retention in Arid Zones",
            Actor::new(UserId::new(), Role::Editor),
            kind,
        )
    }

    #[test]
    fn submitted_goes_to_editors() {
        let got = announcements(&event(EventKind::PaperSubmitted));
        assert_eq!(
            got,
            vec![Announcement {
                audience: Audience::Role(Role::Editor),
                message: "New paper submitted: Soil Retention in Arid Zones".into(),
            }]
        );
    }

    #[test]
    fn metadata_update_has_two_audiences_with_distinct_wording() {
        let got = announcements(&event(EventKind::MetadataUpdated));
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].audience, Audience::Role(Role::Admin));
        assert_eq!(got[1].audience, Audience::Role(Role::Coordinator));
        assert_ne!(got[0].message, got[1].message);
        assert!(got[1].message.ends_with("Please validate."));
    }

    #[test]
    fn decision_targets_reviewer_of_record() {
        let ev = event(EventKind::Decided {
            decision: Decision::Rejected,
        });
        let got = announcements(&ev);
        assert_eq!(got[0].audience, Audience::ReviewerOfRecord(ev.paper_id));
        assert_eq!(
            got[0].message,
            "Admin decision: Paper 'Soil Retention in Arid Zones' has been rejected"
        );
    }

    #[test]
    fn review_message_embeds_rating_and_label_verbatim() {
        let author = UserId::new();
        let got = announcements(&event(EventKind::ReviewSubmitted {
            author_id: author,
            rating: 4,
            recommendation: "Minor Revisions".into(),
        }));
        assert_eq!(got[0].audience, Audience::User(author));
        assert_eq!(
            got[0].message,
            "Your paper 'Soil Retention in Arid Zones' has been reviewed. Rating: 4/5, Recommendation: Minor Revisions"
        );
    }

    #[test]
    fn decisions_from_status() {
        assert_eq!(
            Decision::from_status(PaperStatus::Published),
            Some(Decision::Published)
        );
        assert_eq!(Decision::from_status(PaperStatus::Approved), None);
    }

    #[tokio::test]
    async fn plan_resolves_roles_and_reviewer() {
        let store = MemoryStore::new();
        let editors: Vec<UserRecord> = ["Abebe", "Hana"]
            .into_iter()
            .map(|n| UserRecord::new(n, format!("{n}@smu.example"), Role::Editor))
            .collect();
        for e in &editors {
            store.add_user(e.clone());
        }
        store.add_user(UserRecord::new("Sara", "sara@smu.example", Role::Admin));
        let fanout = FanOut::new(Arc::new(store.clone()));

        let ev = event(EventKind::PaperSubmitted);
        let plan = fanout.plan(&ev).await.unwrap();
        let mut got: Vec<UserId> = plan.iter().map(|d| d.recipient).collect();
        let mut want: Vec<UserId> = editors.iter().map(|e| e.id).collect();
        got.sort();
        want.sort();
        assert_eq!(got, want);
        assert!(plan.iter().all(|d| d.paper_id == Some(ev.paper_id)));

        let decided = WorkflowEvent {
            kind: EventKind::Decided {
                decision: Decision::Published,
            },
            ..ev.clone()
        };
        assert!(fanout.plan(&decided).await.unwrap().is_empty());

        let reviewer = editors[0].id;
        let review = NewReview {
            paper_id: ev.paper_id,
            rating: 5,
            comments: String::new(),
            recommendation: "accept".into(),
        }
        .into_review(reviewer, Timestamp::now());
        store.insert_review(&review).await.unwrap();
        let plan = fanout.plan(&decided).await.unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].recipient, reviewer);
    }
}
