//! # In-Memory Backend
//!
//! Implements every repository trait over `parking_lot` locks. Used by the
//! tests and by embedders that need no persistence. Publication
//! identifiers are unique across papers, the same as the Postgres unique
//! constraint.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rpms_core::publication::{MAX_NUMBER, SEED_NUMBER};
use rpms_core::{NotificationId, PaperId, PublicationId, Role, UserId};
use rpms_state::Paper;
use uuid::Uuid;

use crate::allocator::PublicationIdAllocator;
use crate::error::StoreError;
use crate::model::{Notification, PaperWithAuthor, Review, ReviewWithReviewer, UserRecord};
use crate::store::{
    NotificationRepository, PaperPatch, PaperRepository, RecipientResolver, ReviewRepository,
};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable map keyed by UUID.
///
/// Locks are never held across `.await`.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Records matching a predicate.
    pub fn filter(&self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| pred(v))
            .cloned()
            .collect()
    }

    /// Read-validate-update one record under a single write lock.
    ///
    /// Returns `None` if the record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Run `f` against the whole map under the write lock. For checks that
    /// span records, such as uniqueness.
    pub fn write<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, T>) -> R) -> R {
        f(&mut self.data.write())
    }

    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Workflow Store -----------------------------------------------------------

/// All workflow records in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Store<UserRecord>,
    papers: Store<Paper>,
    // Insertion order decides the reviewer of record.
    reviews: Arc<RwLock<Vec<Review>>>,
    notifications: Store<Notification>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user. Users are owned elsewhere in production.
    pub fn add_user(&self, user: UserRecord) {
        self.users.insert(*user.id.as_uuid(), user);
    }

    /// Every stored notification, any recipient.
    pub fn all_notifications(&self) -> Vec<Notification> {
        self.notifications.list()
    }

    /// Largest numeric suffix among stored publication identifiers.
    fn max_publication_number(&self) -> Option<u64> {
        self.papers
            .list()
            .iter()
            .filter_map(|p| p.metadata.publication_id.as_ref().map(PublicationId::number))
            .max()
    }
}

fn holds(paper: &Paper, id: &PublicationId) -> bool {
    paper
        .metadata
        .publication_id
        .as_ref()
        .is_some_and(|held| held.as_str() == id.as_str())
}

#[async_trait]
impl PaperRepository for MemoryStore {
    async fn insert_paper(&self, paper: &Paper) -> Result<(), StoreError> {
        self.papers.write(|papers| {
            if let Some(pid) = &paper.metadata.publication_id {
                if papers.values().any(|p| holds(p, pid)) {
                    return Err(StoreError::DuplicatePublicationId(pid.to_string()));
                }
            }
            if papers.contains_key(paper.id.as_uuid()) {
                return Err(StoreError::Constraint(format!(
                    "paper {} already exists",
                    paper.id
                )));
            }
            papers.insert(*paper.id.as_uuid(), paper.clone());
            Ok(())
        })
    }

    async fn get_paper(&self, id: PaperId) -> Result<Option<Paper>, StoreError> {
        Ok(self.papers.get(id.as_uuid()))
    }

    async fn update_paper(
        &self,
        id: PaperId,
        patch: &PaperPatch,
    ) -> Result<Option<Paper>, StoreError> {
        self.papers.write(|papers| {
            let Some(actual) = papers.get(id.as_uuid()).map(|p| p.status) else {
                return Ok(None);
            };
            if let Some(expected) = patch.expected_status {
                if actual != expected {
                    return Err(StoreError::StaleStatus { expected, actual });
                }
            }
            if let Some(pid) = patch
                .metadata
                .as_ref()
                .and_then(|m| m.publication_id.as_ref())
            {
                let taken = papers
                    .iter()
                    .any(|(key, p)| key != id.as_uuid() && holds(p, pid));
                if taken {
                    return Err(StoreError::DuplicatePublicationId(pid.to_string()));
                }
            }
            let Some(paper) = papers.get_mut(id.as_uuid()) else {
                return Ok(None);
            };
            patch.apply_to(paper);
            Ok(Some(paper.clone()))
        })
    }

    async fn delete_paper(&self, id: PaperId) -> Result<bool, StoreError> {
        let removed = self.papers.remove(id.as_uuid()).is_some();
        if removed {
            self.reviews.write().retain(|r| r.paper_id != id);
        }
        Ok(removed)
    }

    async fn list_papers(&self) -> Result<Vec<PaperWithAuthor>, StoreError> {
        let mut papers = self.papers.list();
        papers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(papers
            .into_iter()
            .map(|paper| {
                let author = self.users.get(paper.author_id.as_uuid());
                PaperWithAuthor {
                    author_name: author.as_ref().map(|u| u.name.clone()),
                    author_email: author.map(|u| u.email),
                    paper,
                }
            })
            .collect())
    }

    async fn max_publication_id(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .papers
            .list()
            .into_iter()
            .filter_map(|p| p.metadata.publication_id)
            .map(String::from)
            .max())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn insert_review(&self, review: &Review) -> Result<(), StoreError> {
        self.reviews.write().push(review.clone());
        Ok(())
    }

    async fn list_reviews(
        &self,
        paper: Option<PaperId>,
    ) -> Result<Vec<ReviewWithReviewer>, StoreError> {
        let mut reviews: Vec<Review> = self
            .reviews
            .read()
            .iter()
            .rev()
            .filter(|r| paper.map_or(true, |id| r.paper_id == id))
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews
            .into_iter()
            .filter_map(|review| {
                let paper = self.papers.get(review.paper_id.as_uuid())?;
                let reviewer = self.users.get(review.reviewer_id.as_uuid());
                Some(ReviewWithReviewer {
                    reviewer_name: reviewer.as_ref().map(|u| u.name.clone()),
                    reviewer_email: reviewer.map(|u| u.email),
                    paper_title: paper.title,
                    review,
                })
            })
            .collect())
    }
}

#[async_trait]
impl RecipientResolver for MemoryStore {
    async fn users_with_role(&self, role: Role) -> Result<Vec<UserId>, StoreError> {
        let mut users = self.users.filter(|u| u.role == role);
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users.into_iter().map(|u| u.id).collect())
    }

    async fn reviewer_of_record(&self, paper: PaperId) -> Result<Option<UserId>, StoreError> {
        Ok(self
            .reviews
            .read()
            .iter()
            .find(|r| r.paper_id == paper)
            .map(|r| r.reviewer_id))
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        self.notifications
            .insert(*notification.id.as_uuid(), notification.clone());
        Ok(())
    }

    async fn notifications_for(&self, user: UserId) -> Result<Vec<Notification>, StoreError> {
        let mut found = self.notifications.filter(|n| n.user_id == user);
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> Result<Option<Notification>, StoreError> {
        let outcome = self.notifications.try_update(id.as_uuid(), |n| {
            if n.user_id != user {
                return Err(());
            }
            n.is_read = true;
            Ok(n.clone())
        });
        Ok(outcome.and_then(Result::ok))
    }
}

// -- Sequence Allocator -------------------------------------------------------

/// Counter-backed allocator over a [`MemoryStore`].
///
/// The first allocation seeds the counter from the largest stored suffix,
/// or from the seed when nothing is stored. Each later allocation adds one
/// under a mutex.
#[derive(Debug, Clone)]
pub struct MemorySequenceAllocator {
    store: MemoryStore,
    last: Arc<Mutex<Option<u64>>>,
}

impl MemorySequenceAllocator {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            last: Arc::new(Mutex::new(None)),
        }
    }

    fn next_number(&self) -> Result<u64, StoreError> {
        let mut last = self.last.lock();
        let next = match *last {
            Some(n) => n.checked_add(1),
            None => match self.store.max_publication_number() {
                Some(max) => max.checked_add(1),
                None => Some(SEED_NUMBER),
            },
        }
        .filter(|n| *n <= MAX_NUMBER)
        .ok_or_else(|| StoreError::Constraint("publication sequence exhausted".into()))?;
        *last = Some(next);
        Ok(next)
    }
}

#[async_trait]
impl PublicationIdAllocator for MemorySequenceAllocator {
    async fn allocate(&self) -> Result<PublicationId, StoreError> {
        self.next_number().map(PublicationId::from_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpms_core::Timestamp;
    use rpms_state::{NewPaper, PaperContent, PaperMetadata, PaperStatus, StatusChange};

    fn paper(title: &str) -> Paper {
        Paper::submitted(
            NewPaper {
                content: PaperContent {
                    title: title.into(),
                    ..Default::default()
                },
                kind: Default::default(),
            },
            UserId::new(),
            Role::Author,
            Timestamp::now(),
        )
    }

    fn with_id(pid: &str) -> PaperMetadata {
        PaperMetadata {
            publication_id: Some(PublicationId::parse(pid).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn generic_store_basics() {
        let store: Store<String> = Store::new();
        let id = Uuid::new_v4();
        assert!(store.is_empty());
        store.insert(id, "a".into());
        assert_eq!(store.get(&id).as_deref(), Some("a"));
        let shared = store.clone();
        assert_eq!(shared.len(), 1);
        let updated = store.try_update(&id, |v| {
            v.push('b');
            Ok::<_, ()>(v.clone())
        });
        assert_eq!(updated, Some(Ok("ab".to_string())));
        assert_eq!(store.remove(&id).as_deref(), Some("ab"));
        assert!(store.try_update(&id, |_| Ok::<_, ()>(())).is_none());
    }

    #[tokio::test]
    async fn publication_ids_are_unique_across_papers() {
        let store = MemoryStore::new();
        let a = paper("Soil Retention in Arid Zones");
        let b = paper("Groundwater Recharge");
        store.insert_paper(&a).await.unwrap();
        store.insert_paper(&b).await.unwrap();

        let now = Timestamp::now();
        let patch = PaperPatch::at(now).with_metadata(with_id("SMU_P201817001"));
        store.update_paper(a.id, &patch).await.unwrap().unwrap();
        // Re-assigning to the same paper is fine.
        store.update_paper(a.id, &patch).await.unwrap().unwrap();

        let err = store.update_paper(b.id, &patch).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicatePublicationId(ref id) if id == "SMU_P201817001"));
        let b_now = store.get_paper(b.id).await.unwrap().unwrap();
        assert_eq!(b_now.metadata.publication_id, None);
    }

    #[tokio::test]
    async fn expected_status_guards_the_write() {
        let store = MemoryStore::new();
        let p = paper("Groundwater Recharge");
        store.insert_paper(&p).await.unwrap();
        let now = Timestamp::now();
        let patch = PaperPatch::at(now)
            .with_status_change(Some(StatusChange {
                from: Some(PaperStatus::UnderReview),
                to: PaperStatus::Approved,
                actor_role: Role::Editor,
                at: now,
            }))
            .expecting(Some(PaperStatus::UnderReview));
        let err = store.update_paper(p.id, &patch).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::StaleStatus {
                expected: PaperStatus::UnderReview,
                actual: PaperStatus::Submitted
            }
        ));
    }

    #[tokio::test]
    async fn missing_paper_updates_to_none() {
        let store = MemoryStore::new();
        let patch = PaperPatch::at(Timestamp::now());
        assert!(store.update_paper(PaperId::new(), &patch).await.unwrap().is_none());
        assert!(!store.delete_paper(PaperId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn max_publication_id_compares_text() {
        let store = MemoryStore::new();
        assert_eq!(store.max_publication_id().await.unwrap(), None);
        for (title, pid) in [("a", "SMU_P999"), ("b", "SMU_P1000")] {
            let p = paper(title);
            store.insert_paper(&p).await.unwrap();
            let patch = PaperPatch::at(Timestamp::now()).with_metadata(with_id(pid));
            store.update_paper(p.id, &patch).await.unwrap();
        }
        // "SMU_P999" sorts after "SMU_P1000" as text.
        assert_eq!(
            store.max_publication_id().await.unwrap().as_deref(),
            Some("SMU_P999")
        );
        assert_eq!(store.max_publication_number(), Some(1000));
    }

    #[tokio::test]
    async fn sequence_seeds_from_numeric_maximum() {
        let store = MemoryStore::new();
        let alloc = MemorySequenceAllocator::new(store.clone());
        assert_eq!(alloc.allocate().await.unwrap().as_str(), "SMU_P201817001");
        assert_eq!(alloc.allocate().await.unwrap().as_str(), "SMU_P201817002");

        let p = paper("Groundwater Recharge");
        store.insert_paper(&p).await.unwrap();
        let patch = PaperPatch::at(Timestamp::now()).with_metadata(with_id("SMU_P201817050"));
        store.update_paper(p.id, &patch).await.unwrap();
        let fresh = MemorySequenceAllocator::new(store);
        assert_eq!(fresh.allocate().await.unwrap().as_str(), "SMU_P201817051");
    }

    #[tokio::test]
    async fn sequence_stops_at_bigint_maximum() {
        let store = MemoryStore::new();
        let p = paper("Groundwater Recharge");
        store.insert_paper(&p).await.unwrap();
        let patch =
            PaperPatch::at(Timestamp::now()).with_metadata(with_id("SMU_P9223372036854775807"));
        store.update_paper(p.id, &patch).await.unwrap();
        let alloc = MemorySequenceAllocator::new(store);
        assert!(matches!(
            alloc.allocate().await,
            Err(StoreError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn mark_read_requires_recipient() {
        let store = MemoryStore::new();
        let owner = UserId::new();
        let n = Notification::unread(owner, "hello", None, Timestamp::now());
        store.insert_notification(&n).await.unwrap();
        assert!(store.mark_read(n.id, UserId::new()).await.unwrap().is_none());
        let read = store.mark_read(n.id, owner).await.unwrap().unwrap();
        assert!(read.is_read);
        assert!(store.mark_read(NotificationId::new(), owner).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reviewer_of_record_is_first_review() {
        let store = MemoryStore::new();
        let p = paper("Groundwater Recharge");
        store.insert_paper(&p).await.unwrap();
        assert_eq!(store.reviewer_of_record(p.id).await.unwrap(), None);
        let editor = UserRecord::new("Dawit", "dawit@smu.example", Role::Editor);
        let first = editor.id;
        store.add_user(editor);
        for reviewer in [first, UserId::new()] {
            let review = crate::model::NewReview {
                paper_id: p.id,
                rating: 4,
                comments: String::new(),
                recommendation: "accept".into(),
            }
            .into_review(reviewer, Timestamp::now());
            store.insert_review(&review).await.unwrap();
        }
        assert_eq!(store.reviewer_of_record(p.id).await.unwrap(), Some(first));
        let listed = store.list_reviews(Some(p.id)).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|r| r.paper_title == "Groundwater Recharge"));
        let by_editor = listed.iter().find(|r| r.review.reviewer_id == first).unwrap();
        assert_eq!(by_editor.reviewer_name.as_deref(), Some("Dawit"));
        let unknown = listed.iter().find(|r| r.review.reviewer_id != first).unwrap();
        assert_eq!(unknown.reviewer_email, None);
        assert!(store.list_reviews(Some(PaperId::new())).await.unwrap().is_empty());
    }
}
