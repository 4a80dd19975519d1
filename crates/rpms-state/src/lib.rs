//! # rpms-state: Paper Lifecycle
//!
//! The status state machine of a submitted paper.
//!
//! ```text
//! draft ──▶ submitted ──▶ under_review ──▶ approved
//!              │               │    │          │
//!              │               │    └──▶ rejected
//!              ▼               ▼               ▼
//!           recommended_for_publication ──▶ published
//!                                       └──▶ rejected
//! ```
//!
//! The graph above is what [`EnforcementMode::Strict`] enforces. The
//! deployed system never enforced a graph: its generic update path accepts
//! any of the seven statuses from any state, and only the dedicated
//! recommend action fixes its target. [`EnforcementMode::Compatible`]
//! reproduces that, and every accepted change the strict graph would have
//! refused comes back marked `guarded == false` so callers can flag it.
//!
//! Transitions are data: a static slice of [`TransitionRule`]s per mode,
//! keyed by action and role.

pub mod paper;
pub mod status;
pub mod transition;

pub use paper::{
    NewPaper, Paper, PaperContent, PaperKind, PaperMetadata, StatusChange, MAX_TITLE_LEN,
};
pub use status::PaperStatus;
pub use transition::{
    EnforcementMode, PaperAction, Source, StateError, Target, Transition, TransitionRule,
    TransitionTable,
};
