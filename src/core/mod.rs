//! Core evidence lifecycle logic.
//!
//! This module contains:
//! - Engine: Pure scoring and role gating
//! - Repository: Storage seam and event replay
//! - Store: Lifecycle operations and observers
//! - Stats: Derived aggregates for dashboards
//! - Journal: Append-only JSONL persistence

pub mod engine;
pub mod journal;
pub mod repository;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use engine::{compute_overall_score, require_role, sanitize_list_inputs};
pub use journal::{Journal, JournalError, JournalLock, JsonlJournal, MemoryJournal};
pub use repository::{apply_event, EvidenceRepository, InMemoryRepository};
pub use stats::{CriterionStats, StoreSummary};
pub use store::{
    EventBuffer, EvidenceObserver, EvidenceStore, NewEvidence, NewVersion, PendingValidation,
    DEFAULT_CHANGE_LOG,
};
