//! # Database Persistence Layer
//!
//! Postgres persistence via SQLx. [`PgStore`] implements every repository
//! trait by delegating to the per-table modules; each of those takes a
//! `&PgPool` and owns the SQL for one table.
//!
//! Transition rules are enforced by the orchestrator, not in SQL. The schema
//! carries only integrity constraints: a `CHECK` on status and a unique
//! constraint on `publication_id`.

pub mod notifications;
pub mod papers;
pub mod reviews;
pub mod sequence;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use rpms_core::{NotificationId, PaperId, Role, UserId};
use rpms_state::Paper;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::model::{Notification, PaperWithAuthor, Review, ReviewWithReviewer, UserRecord};
use crate::store::{
    NotificationRepository, PaperPatch, PaperRepository, RecipientResolver, ReviewRepository,
};

pub use sequence::PgSequenceAllocator;

/// Connect and run the embedded migrations.
pub async fn init_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.url)
        .await?;
    tracing::info!(max_connections = config.max_connections, "connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(pool)
}

/// Every repository over one connection pool. Clones share the pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Register a user. Users are owned elsewhere in production.
    pub async fn add_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        users::insert(&self.pool, user).await
    }

    pub async fn users(&self) -> Result<Vec<UserRecord>, StoreError> {
        users::list(&self.pool).await
    }
}

#[async_trait]
impl PaperRepository for PgStore {
    async fn insert_paper(&self, paper: &Paper) -> Result<(), StoreError> {
        papers::insert(&self.pool, paper).await
    }

    async fn get_paper(&self, id: PaperId) -> Result<Option<Paper>, StoreError> {
        papers::get_by_id(&self.pool, id).await
    }

    async fn update_paper(
        &self,
        id: PaperId,
        patch: &PaperPatch,
    ) -> Result<Option<Paper>, StoreError> {
        papers::update(&self.pool, id, patch).await
    }

    async fn delete_paper(&self, id: PaperId) -> Result<bool, StoreError> {
        papers::delete(&self.pool, id).await
    }

    async fn list_papers(&self) -> Result<Vec<PaperWithAuthor>, StoreError> {
        papers::list(&self.pool).await
    }

    async fn max_publication_id(&self) -> Result<Option<String>, StoreError> {
        papers::max_publication_id(&self.pool).await
    }
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn insert_review(&self, review: &Review) -> Result<(), StoreError> {
        reviews::insert(&self.pool, review).await
    }

    async fn list_reviews(
        &self,
        paper: Option<PaperId>,
    ) -> Result<Vec<ReviewWithReviewer>, StoreError> {
        reviews::list(&self.pool, paper).await
    }
}

#[async_trait]
impl RecipientResolver for PgStore {
    async fn users_with_role(&self, role: Role) -> Result<Vec<UserId>, StoreError> {
        users::ids_with_role(&self.pool, role).await
    }

    async fn reviewer_of_record(&self, paper: PaperId) -> Result<Option<UserId>, StoreError> {
        reviews::reviewer_of_record(&self.pool, paper).await
    }
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        notifications::insert(&self.pool, notification).await
    }

    async fn notifications_for(&self, user: UserId) -> Result<Vec<Notification>, StoreError> {
        notifications::list_for_user(&self.pool, user).await
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> Result<Option<Notification>, StoreError> {
        notifications::mark_read(&self.pool, id, user).await
    }
}
