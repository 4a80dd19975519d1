//! # rpms-workflow
//!
//! The paper workflow engine. [`Workflow`] validates every operation against
//! the transition table from `rpms-state`, writes through repository traits,
//! allocates publication identifiers, and hands events to the notification
//! fan-out.
//!
//! ## Layout
//!
//! - [`store`]: repository traits and the in-memory backend.
//! - [`db`]: the Postgres backend (sqlx) and embedded migrations.
//! - [`allocator`]: publication identifier allocation.
//! - [`fanout`]: workflow events, audience rules, and recipient resolution.
//! - [`dispatch`]: detached delivery of notifications.
//! - [`orchestrator`]: the [`Workflow`] entry point.
//! - [`config`]: environment-driven configuration.
//!
//! ## Notifications never fail an operation
//!
//! The primary write commits first. Fan-out runs afterwards on a detached
//! task; resolution and delivery failures are logged and dropped.

pub mod allocator;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod fanout;
pub mod model;
pub mod orchestrator;
pub mod store;

pub use allocator::{next_publication_id, AllocatorKind, PublicationIdAllocator, ScanAllocator};
pub use config::{ConfigError, DatabaseConfig, WorkflowConfig};
pub use dispatch::{DeliveryReport, NotificationDispatcher};
pub use error::{ErrorKind, NotificationError, StoreError, WorkflowError};
pub use fanout::{
    announcements, Announcement, Audience, Decision, Delivery, EventKind, FanOut, WorkflowEvent,
};
pub use model::{
    ManualNotification, NewReview, Notification, PaperUpdate, PaperWithAuthor, Review,
    ReviewWithReviewer, UserRecord,
};
pub use orchestrator::{Stores, Workflow};
pub use store::memory::{MemorySequenceAllocator, MemoryStore};
pub use store::{
    NotificationRepository, PaperPatch, PaperRepository, RecipientResolver, ReviewRepository,
};
