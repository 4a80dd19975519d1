//! # rpms-core: Foundational Types for the Publication Workflow
//!
//! Leaf crate of the workspace. Defines the primitives every other crate
//! speaks in:
//!
//! - **Identifiers**: `PaperId`, `UserId`, `ReviewId`, `NotificationId`.
//!   UUID newtypes, so a reviewer ID cannot be passed where a paper ID is
//!   expected.
//! - **Roles**: the four institutional roles and the [`Actor`] handed to the
//!   workflow by the access-control layer.
//! - **Timestamps**: UTC-only, microsecond precision, matching what
//!   PostgreSQL `timestamptz` stores.
//! - **Publication identifiers**: the `SMU_P` + digits format and its
//!   parsing rules.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `rpms-*` crates.
//! - No `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod publication;
pub mod role;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{NotificationId, PaperId, ReviewId, UserId};
pub use publication::{PublicationId, PUBLICATION_PREFIX, SEED_PUBLICATION_ID};
pub use role::{Actor, Role};
pub use temporal::Timestamp;
