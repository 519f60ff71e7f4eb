//! Error taxonomy for evidence lifecycle operations.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Role, VersionStatus};

/// Errors raised by the evidence store and validation engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvidenceError {
    /// Malformed or missing required input
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: Uuid },

    /// The version has already been decided
    #[error("Version {version_id} is {status}, only pending versions can be validated")]
    InvalidState {
        version_id: Uuid,
        status: VersionStatus,
    },

    #[error("Role {role} may not {operation}")]
    Forbidden { role: Role, operation: &'static str },
}

impl EvidenceError {
    pub fn evidence_not_found(id: Uuid) -> Self {
        Self::NotFound {
            kind: RecordKind::Evidence,
            id,
        }
    }

    pub fn version_not_found(id: Uuid) -> Self {
        Self::NotFound {
            kind: RecordKind::Version,
            id,
        }
    }
}

/// Which kind of record a lookup failed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Evidence,
    Version,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Evidence => f.write_str("Evidence"),
            Self::Version => f.write_str("Version"),
        }
    }
}

pub type Result<T, E = EvidenceError> = std::result::Result<T, E>;
