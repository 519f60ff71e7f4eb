//! evidra - Evidence lifecycle and RSSI validation
//!
//! Departments submit evidence that a compliance criterion is met. Each
//! evidence item keeps an append-only chain of versions, and the security
//! officer (RSSI) scores and decides every pending version.
//!
//! # Architecture
//!
//! The store is event-sourced:
//! - Every committed mutation is emitted as an [`EvidenceEvent`]
//! - The CLI appends those events to a JSONL journal
//! - Current state is rebuilt by replaying the journal
//!
//! # Modules
//!
//! - `domain`: Data structures (Evidence, Version, Validation, Actor)
//! - `core`: Lifecycle logic (EvidenceStore, scoring, journal, stats)
//! - `intake`: Local file attachments (size limit, denylist, digest)
//! - `config`: Layered configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Submit evidence as a department
//! evidra --as alice submit -c A.12.3 -t "Backup policy" --department IT --attach policy.pdf
//!
//! # Score and decide the pending version as the RSSI
//! evidra --as carol --role rssi validate <evidence-id> 1 --status approved \
//!     --completeness 8 --relevance 9 --quality 7 --implementation 8
//!
//! # Criterion dashboard numbers
//! evidra stats A.12.3
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod intake;

// Re-export main types at crate root for convenience
pub use crate::core::{
    compute_overall_score, sanitize_list_inputs, CriterionStats, EventBuffer, EvidenceObserver,
    EvidenceRepository, EvidenceStore, InMemoryRepository, Journal, JsonlJournal, MemoryJournal,
    NewEvidence, NewVersion, StoreSummary,
};
pub use domain::{
    Actor, Attachment, EventType, Evidence, EvidenceEvent, EvidenceType, MaturityContribution,
    Role, Validation, ValidationCriteria, ValidationInput, ValidationStatus, Version,
    VersionStatus,
};
pub use error::{EvidenceError, Result};
pub use intake::{collect_attachment, AttachmentPolicy, IntakeError};
