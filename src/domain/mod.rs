//! Domain types for the evidence lifecycle.
//!
//! This module contains the core data structures:
//! - Evidence: Proof artifacts and their versions
//! - Validation: RSSI decisions and rubric scores
//! - Actor: Acting identity and role
//! - Events: Records of committed mutations

pub mod actor;
pub mod events;
pub mod evidence;
pub mod validation;

// Re-export commonly used types
pub use actor::{Actor, Role};
pub use events::{EventPayload, EventType, EvidenceEvent};
pub use evidence::{
    Attachment, Evidence, EvidenceType, MaturityContribution, Version, VersionStatus,
};
pub use validation::{Validation, ValidationCriteria, ValidationInput, ValidationStatus};
