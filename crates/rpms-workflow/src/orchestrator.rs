//! # Workflow Orchestrator
//!
//! Every mutating operation runs the same sequence:
//!
//! 1. the actor's role must hold the action at all;
//! 2. the input is validated;
//! 3. the transition table checks the move from the stored status;
//! 4. one single-row write commits the change;
//! 5. the resulting event is handed to the dispatcher.
//!
//! A refusal at steps 1-3 leaves storage untouched and fires nothing. Once
//! step 4 succeeds the operation succeeds, whatever happens to step 5.

use std::sync::Arc;

use rpms_core::{Actor, NotificationId, PaperId, Timestamp};
use rpms_state::{
    EnforcementMode, NewPaper, Paper, PaperAction, PaperMetadata, PaperStatus, StateError,
    Transition, TransitionTable,
};

use crate::allocator::{AllocatorKind, PublicationIdAllocator, ScanAllocator};
use crate::config::WorkflowConfig;
use crate::db::{PgSequenceAllocator, PgStore};
use crate::dispatch::{DeliveryReport, NotificationDispatcher};
use crate::error::{StoreError, WorkflowError};
use crate::fanout::{Decision, EventKind, FanOut, WorkflowEvent};
use crate::model::{
    ManualNotification, NewReview, Notification, PaperUpdate, PaperWithAuthor, Review,
    ReviewWithReviewer,
};
use crate::store::memory::{MemorySequenceAllocator, MemoryStore};
use crate::store::{
    NotificationRepository, PaperPatch, PaperRepository, RecipientResolver, ReviewRepository,
};

/// The repositories a [`Workflow`] writes through.
#[derive(Clone)]
pub struct Stores {
    pub papers: Arc<dyn PaperRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub recipients: Arc<dyn RecipientResolver>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub allocator: Arc<dyn PublicationIdAllocator>,
}

impl Stores {
    /// Every repository backed by one in-memory store.
    pub fn memory(store: &MemoryStore, allocator: AllocatorKind) -> Self {
        let shared = Arc::new(store.clone());
        let allocator: Arc<dyn PublicationIdAllocator> = match allocator {
            AllocatorKind::Sequence => Arc::new(MemorySequenceAllocator::new(store.clone())),
            AllocatorKind::Scan => Arc::new(ScanAllocator::new(shared.clone())),
        };
        Self {
            papers: shared.clone(),
            reviews: shared.clone(),
            recipients: shared.clone(),
            notifications: shared,
            allocator,
        }
    }

    /// Every repository backed by Postgres.
    pub fn postgres(store: &PgStore, allocator: AllocatorKind) -> Self {
        let shared = Arc::new(store.clone());
        let allocator: Arc<dyn PublicationIdAllocator> = match allocator {
            AllocatorKind::Sequence => Arc::new(PgSequenceAllocator::new(store.pool().clone())),
            AllocatorKind::Scan => Arc::new(ScanAllocator::new(shared.clone())),
        };
        Self {
            papers: shared.clone(),
            reviews: shared.clone(),
            recipients: shared.clone(),
            notifications: shared,
            allocator,
        }
    }
}

/// The paper workflow engine.
#[derive(Clone)]
pub struct Workflow {
    stores: Stores,
    table: TransitionTable,
    dispatcher: NotificationDispatcher,
    allocation_retries: u32,
}

impl Workflow {
    pub fn new(stores: Stores, config: &WorkflowConfig) -> Self {
        let fanout = FanOut::new(stores.recipients.clone());
        let dispatcher = NotificationDispatcher::new(fanout, stores.notifications.clone());
        Self {
            table: TransitionTable::new(config.enforcement),
            dispatcher,
            allocation_retries: config.allocation_retries,
            stores,
        }
    }

    /// The transition table in force.
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Wait for every notification fan-out dispatched so far.
    pub async fn flush_notifications(&self) -> DeliveryReport {
        self.dispatcher.flush().await
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Submit a new paper authored by the actor. Notifies every editor.
    pub async fn submit_paper(
        &self,
        actor: &Actor,
        input: NewPaper,
    ) -> Result<Paper, WorkflowError> {
        self.require(actor, PaperAction::Create)?;
        input.validate()?;
        let transition = self
            .table
            .check(actor.role, PaperAction::Create, None, PaperStatus::Submitted)?;
        let paper = Paper::submitted(input, actor.user_id, actor.role, Timestamp::now());
        self.stores.papers.insert_paper(&paper).await?;
        tracing::info!(
            paper_id = %paper.id,
            author_id = %paper.author_id,
            status = %transition.to,
            "paper submitted"
        );
        self.dispatch(&paper, actor, EventKind::PaperSubmitted);
        Ok(paper)
    }

    /// Replace the paper's content and set its status.
    ///
    /// A `published` or `rejected` target notifies the reviewer of record.
    pub async fn update_paper(
        &self,
        actor: &Actor,
        id: PaperId,
        update: PaperUpdate,
    ) -> Result<Paper, WorkflowError> {
        self.require(actor, PaperAction::Update)?;
        update.content.validate()?;
        let current = self.load(id).await?;
        self.table.check_ownership(
            actor.role,
            PaperAction::Update,
            current.is_authored_by(actor.user_id),
        )?;
        let transition =
            self.table
                .check(actor.role, PaperAction::Update, Some(current.status), update.status)?;
        self.flag_unguarded(id, actor, &transition);

        let now = Timestamp::now();
        let patch = PaperPatch::at(now)
            .with_content(update.content)
            .with_status_change(transition.change(actor.role, now))
            .expecting(self.expected(current.status));
        let paper = self.write(id, &patch).await?;
        tracing::info!(
            paper_id = %id,
            role = %actor.role,
            from = %current.status,
            to = %paper.status,
            "paper updated"
        );
        if let Some(decision) = Decision::from_status(update.status) {
            self.dispatch(&paper, actor, EventKind::Decided { decision });
        }
        Ok(paper)
    }

    /// Move the paper to `recommended_for_publication`. Notifies every admin.
    pub async fn recommend(&self, actor: &Actor, id: PaperId) -> Result<Paper, WorkflowError> {
        self.require(actor, PaperAction::Recommend)?;
        let current = self.load(id).await?;
        let transition = self.table.check(
            actor.role,
            PaperAction::Recommend,
            Some(current.status),
            PaperStatus::RecommendedForPublication,
        )?;
        self.flag_unguarded(id, actor, &transition);

        let now = Timestamp::now();
        let patch = PaperPatch::at(now)
            .with_status_change(transition.change(actor.role, now))
            .expecting(self.expected(current.status));
        let paper = self.write(id, &patch).await?;
        tracing::info!(paper_id = %id, from = %current.status, "paper recommended for publication");
        self.dispatch(&paper, actor, EventKind::Recommended);
        Ok(paper)
    }

    /// Replace the publication metadata block.
    ///
    /// An omitted publication identifier keeps the stored one. A paper
    /// without one gets the next allocated identifier. On an identifier
    /// collision allocation is retried up to the configured count. Notifies
    /// every admin and every coordinator.
    pub async fn update_metadata(
        &self,
        actor: &Actor,
        id: PaperId,
        mut metadata: PaperMetadata,
    ) -> Result<Paper, WorkflowError> {
        self.require(actor, PaperAction::UpdateMetadata)?;
        let current = self.load(id).await?;
        self.table.check(
            actor.role,
            PaperAction::UpdateMetadata,
            Some(current.status),
            current.status,
        )?;

        if metadata.publication_id.is_none() {
            metadata.publication_id = current.metadata.publication_id.clone();
        }
        let allocate = metadata.publication_id.is_none();
        let mut collisions = 0;
        let paper = loop {
            let mut attempt = metadata.clone();
            if allocate {
                attempt.publication_id = Some(self.stores.allocator.allocate().await?);
            }
            let patch = PaperPatch::at(Timestamp::now()).with_metadata(attempt);
            match self.write(id, &patch).await {
                Ok(paper) => break paper,
                Err(WorkflowError::Store(StoreError::DuplicatePublicationId(taken))) if allocate => {
                    collisions += 1;
                    if collisions > self.allocation_retries {
                        tracing::error!(
                            paper_id = %id,
                            attempts = collisions,
                            "publication identifier allocation exhausted"
                        );
                        return Err(WorkflowError::IdentifierExhausted {
                            attempts: collisions,
                        });
                    }
                    tracing::warn!(
                        paper_id = %id,
                        publication_id = %taken,
                        attempt = collisions,
                        "publication identifier collision, allocating again"
                    );
                }
                Err(e) => return Err(e),
            }
        };
        tracing::info!(
            paper_id = %id,
            publication_id = ?paper.metadata.publication_id.as_ref().map(|p| p.as_str()),
            allocated = allocate,
            "paper metadata updated"
        );
        self.dispatch(&paper, actor, EventKind::MetadataUpdated);
        Ok(paper)
    }

    /// Record a review by the actor. Notifies the paper's author.
    pub async fn submit_review(
        &self,
        actor: &Actor,
        input: NewReview,
    ) -> Result<Review, WorkflowError> {
        self.require(actor, PaperAction::Review)?;
        input.validate()?;
        let paper = self.load(input.paper_id).await?;
        self.table
            .check(actor.role, PaperAction::Review, Some(paper.status), paper.status)?;

        let review = input.into_review(actor.user_id, Timestamp::now());
        self.stores.reviews.insert_review(&review).await?;
        tracing::info!(
            paper_id = %paper.id,
            review_id = %review.id,
            rating = review.rating,
            "review submitted"
        );
        self.dispatch(
            &paper,
            actor,
            EventKind::ReviewSubmitted {
                author_id: paper.author_id,
                rating: review.rating,
                recommendation: review.recommendation.clone(),
            },
        );
        Ok(review)
    }

    /// Delete a paper and its reviews.
    pub async fn delete_paper(&self, actor: &Actor, id: PaperId) -> Result<(), WorkflowError> {
        self.require(actor, PaperAction::Delete)?;
        let current = self.load(id).await?;
        self.table.check_ownership(
            actor.role,
            PaperAction::Delete,
            current.is_authored_by(actor.user_id),
        )?;
        self.table
            .check(actor.role, PaperAction::Delete, Some(current.status), current.status)?;
        if !self.stores.papers.delete_paper(id).await? {
            return Err(WorkflowError::paper_not_found(id));
        }
        tracing::info!(paper_id = %id, role = %actor.role, "paper deleted");
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub async fn get_paper(&self, id: PaperId) -> Result<Paper, WorkflowError> {
        self.load(id).await
    }

    /// Every paper, newest first.
    pub async fn list_papers(&self) -> Result<Vec<PaperWithAuthor>, WorkflowError> {
        Ok(self.stores.papers.list_papers().await?)
    }

    /// Reviews, newest first, optionally for one paper.
    pub async fn list_reviews(
        &self,
        paper: Option<PaperId>,
    ) -> Result<Vec<ReviewWithReviewer>, WorkflowError> {
        Ok(self.stores.reviews.list_reviews(paper).await?)
    }

    // ── Notifications ────────────────────────────────────────────────

    /// The actor's notifications, newest first.
    pub async fn notifications_for(
        &self,
        actor: &Actor,
    ) -> Result<Vec<Notification>, WorkflowError> {
        Ok(self
            .stores
            .notifications
            .notifications_for(actor.user_id)
            .await?)
    }

    /// Mark one of the actor's notifications read. Someone else's
    /// notification is reported as not found.
    pub async fn mark_notification_read(
        &self,
        actor: &Actor,
        id: NotificationId,
    ) -> Result<Notification, WorkflowError> {
        self.stores
            .notifications
            .mark_read(id, actor.user_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "notification",
                id: id.to_string(),
            })
    }

    /// Send a message straight to one user, bypassing fan-out. Failures are
    /// returned to the caller.
    pub async fn notify_user(
        &self,
        actor: &Actor,
        input: ManualNotification,
    ) -> Result<Notification, WorkflowError> {
        input.validate()?;
        let notification =
            Notification::unread(input.user_id, input.message, input.paper_id, Timestamp::now());
        self.stores
            .notifications
            .insert_notification(&notification)
            .await?;
        tracing::info!(
            notification_id = %notification.id,
            sender = %actor.user_id,
            recipient = %notification.user_id,
            "manual notification sent"
        );
        Ok(notification)
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn require(&self, actor: &Actor, action: PaperAction) -> Result<(), StateError> {
        if self.table.permits(actor.role, action) {
            Ok(())
        } else {
            Err(StateError::ActionNotPermitted {
                role: actor.role,
                action,
            })
        }
    }

    async fn load(&self, id: PaperId) -> Result<Paper, WorkflowError> {
        self.stores
            .papers
            .get_paper(id)
            .await?
            .ok_or_else(|| WorkflowError::paper_not_found(id))
    }

    async fn write(&self, id: PaperId, patch: &PaperPatch) -> Result<Paper, WorkflowError> {
        self.stores
            .papers
            .update_paper(id, patch)
            .await?
            .ok_or_else(|| WorkflowError::paper_not_found(id))
    }

    /// Strict mode writes only if the status is still the one checked.
    fn expected(&self, status: PaperStatus) -> Option<PaperStatus> {
        (self.table.mode() == EnforcementMode::Strict).then_some(status)
    }

    fn flag_unguarded(&self, id: PaperId, actor: &Actor, transition: &Transition) {
        if !transition.guarded {
            tracing::warn!(
                paper_id = %id,
                role = %actor.role,
                action = transition.action.as_str(),
                from = ?transition.from.map(|s| s.as_str()),
                to = %transition.to,
                "status change accepted without a source-state guard"
            );
        }
    }

    fn dispatch(&self, paper: &Paper, actor: &Actor, kind: EventKind) {
        self.dispatcher
            .dispatch(WorkflowEvent::new(paper.id, paper.title.clone(), *actor, kind));
    }
}
