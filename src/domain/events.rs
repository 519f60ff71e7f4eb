//! Events raised by the evidence store.
//!
//! Every committed mutation produces exactly one event. Observers use the ids
//! to refresh counters and badges; the journal stores the payload so the full
//! evidence state can be rebuilt by replaying events in order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::evidence::{Evidence, Version};
use super::validation::Validation;

/// A single event in the append-only evidence log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEvent {
    /// Unique identifier for this event
    pub id: Uuid,

    /// When this event occurred (ISO 8601)
    pub timestamp: DateTime<Utc>,

    /// Type of event
    pub event_type: EventType,

    /// The evidence this event belongs to
    pub evidence_id: Uuid,

    /// The affected version
    pub version_id: Uuid,

    /// Identity that performed the action
    pub actor: String,

    /// Human-readable summary
    pub payload_summary: String,

    /// Record written by the mutation
    pub payload: EventPayload,
}

/// Record carried by an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "record")]
pub enum EventPayload {
    /// The freshly created evidence, including its first version
    Evidence(Evidence),

    /// The appended version
    Version(Version),

    /// The validation written on the target version
    Validation(Validation),
}

impl EvidenceEvent {
    fn new(
        event_type: EventType,
        evidence_id: Uuid,
        version_id: Uuid,
        actor: String,
        payload_summary: String,
        payload: EventPayload,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            evidence_id,
            version_id,
            actor,
            payload_summary,
            payload,
        }
    }

    /// Evidence created with its first version
    pub fn evidence_submitted(evidence: &Evidence, version_id: Uuid, actor: &str) -> Self {
        Self::new(
            EventType::EvidenceSubmitted,
            evidence.id,
            version_id,
            actor.to_string(),
            format!(
                "Evidence '{}' submitted for criterion {}",
                evidence.title, evidence.criterion_id
            ),
            EventPayload::Evidence(evidence.clone()),
        )
    }

    /// New version appended to an existing evidence
    pub fn version_submitted(evidence_id: Uuid, version: &Version, actor: &str) -> Self {
        Self::new(
            EventType::VersionSubmitted,
            evidence_id,
            version.id,
            actor.to_string(),
            format!("Version {} submitted", version.version),
            EventPayload::Version(version.clone()),
        )
    }

    /// Version decided by the RSSI
    pub fn version_validated(
        evidence_id: Uuid,
        version: &Version,
        validation: &Validation,
        actor: &str,
    ) -> Self {
        Self::new(
            EventType::VersionValidated,
            evidence_id,
            version.id,
            actor.to_string(),
            format!(
                "Version {} {} (score {}/10)",
                version.version, version.status, validation.overall_score
            ),
            EventPayload::Validation(validation.clone()),
        )
    }
}

/// Types of events the store raises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A new evidence item and its version 1 were created
    EvidenceSubmitted,

    /// A department appended a new version
    VersionSubmitted,

    /// The RSSI decided a pending version
    VersionValidated,
}
