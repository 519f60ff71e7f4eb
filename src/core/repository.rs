//! Storage seam for evidence records.
//!
//! The store only talks to an [`EvidenceRepository`]. [`InMemoryRepository`]
//! keeps everything in insertion order and can be rebuilt from a sequence of
//! [`EvidenceEvent`]s, which is how the journal restores state.

use std::collections::HashMap;

use uuid::Uuid;

use super::engine::{compute_overall_score, require_text, sanitize_list_inputs};
use crate::domain::{EventPayload, EventType, Evidence, EvidenceEvent, Validation};
use crate::error::{EvidenceError, Result};

/// Owns evidence records. Implementations must never reorder versions.
pub trait EvidenceRepository {
    fn get(&self, id: Uuid) -> Option<&Evidence>;

    fn get_mut(&mut self, id: Uuid) -> Option<&mut Evidence>;

    /// Store a new evidence and return the stored record. Ids are unique;
    /// callers never insert twice.
    fn insert(&mut self, evidence: Evidence) -> &Evidence;

    /// All evidence in insertion order
    fn iter(&self) -> Box<dyn Iterator<Item = &Evidence> + '_>;

    fn len(&self) -> usize {
        self.iter().count()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Vec-backed repository with an id index
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    items: Vec<Evidence>,
    index: HashMap<Uuid, usize>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild state by replaying events in order
    pub fn from_events(events: &[EvidenceEvent]) -> Result<Self> {
        let mut repository = Self::new();
        for event in events {
            apply_event(&mut repository, event)?;
        }
        Ok(repository)
    }
}

impl EvidenceRepository for InMemoryRepository {
    fn get(&self, id: Uuid) -> Option<&Evidence> {
        self.index.get(&id).map(|&i| &self.items[i])
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut Evidence> {
        match self.index.get(&id) {
            Some(&i) => self.items.get_mut(i),
            None => None,
        }
    }

    fn insert(&mut self, evidence: Evidence) -> &Evidence {
        let position = self.items.len();
        self.index.insert(evidence.id, position);
        self.items.push(evidence);
        &self.items[position]
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Evidence> + '_> {
        Box::new(self.items.iter())
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Apply a recorded event to a repository.
///
/// The same rules the store enforces are checked again here, so a tampered
/// or reordered log fails loudly instead of producing a broken chain.
pub fn apply_event<R: EvidenceRepository + ?Sized>(
    repository: &mut R,
    event: &EvidenceEvent,
) -> Result<()> {
    match (&event.event_type, &event.payload) {
        (EventType::EvidenceSubmitted, EventPayload::Evidence(evidence)) => {
            if event.evidence_id != evidence.id {
                return Err(mismatched_id(event, "evidence", evidence.id));
            }
            if repository.get(evidence.id).is_some() {
                return Err(EvidenceError::Validation(format!(
                    "evidence {} submitted twice",
                    evidence.id
                )));
            }

            let first = match evidence.versions.as_slice() {
                [first] if evidence.is_consistent() && first.is_pending() => first,
                _ => {
                    return Err(EvidenceError::Validation(format!(
                        "evidence {} must be created with a single pending version",
                        evidence.id
                    )))
                }
            };
            if event.version_id != first.id {
                return Err(mismatched_id(event, "version", first.id));
            }
            repository.insert(evidence.clone());
        }
        (EventType::VersionSubmitted, EventPayload::Version(version)) => {
            if event.version_id != version.id {
                return Err(mismatched_id(event, "version", version.id));
            }
            require_text("change log", &version.change_log)?;

            let evidence = repository
                .get_mut(event.evidence_id)
                .ok_or_else(|| EvidenceError::evidence_not_found(event.evidence_id))?;

            let expected = evidence.current_version() + 1;
            if version.version != expected
                || !version.is_latest
                || !version.is_pending()
                || version.rssi_validation.is_some()
            {
                return Err(EvidenceError::Validation(format!(
                    "version {} of evidence {} is out of sequence (expected {})",
                    version.version, evidence.id, expected
                )));
            }
            evidence.push_version(version.clone());
        }
        (EventType::VersionValidated, EventPayload::Validation(validation)) => {
            check_recorded_validation(validation)?;

            let evidence = repository
                .get_mut(event.evidence_id)
                .ok_or_else(|| EvidenceError::evidence_not_found(event.evidence_id))?;
            let version = evidence
                .version_mut(event.version_id)
                .ok_or_else(|| EvidenceError::version_not_found(event.version_id))?;

            if !version.is_pending() {
                return Err(EvidenceError::InvalidState {
                    version_id: version.id,
                    status: version.status,
                });
            }
            version.status = validation.status.into();
            version.rssi_validation = Some(validation.clone());
        }
        (event_type, _) => {
            return Err(EvidenceError::Validation(format!(
                "event {} of type {:?} carries a mismatched payload",
                event.id, event_type
            )));
        }
    }

    Ok(())
}

/// A recorded validation must be exactly what `validate_version` would store
fn check_recorded_validation(validation: &Validation) -> Result<()> {
    let expected = compute_overall_score(&validation.criteria)?;
    if validation.overall_score != expected {
        return Err(EvidenceError::Validation(format!(
            "recorded overall score {} does not match criteria (expected {})",
            validation.overall_score, expected
        )));
    }

    if sanitize_list_inputs(&validation.recommendations) != validation.recommendations
        || sanitize_list_inputs(&validation.next_actions) != validation.next_actions
    {
        return Err(EvidenceError::Validation(
            "recorded validation contains blank list entries".to_string(),
        ));
    }

    Ok(())
}

fn mismatched_id(event: &EvidenceEvent, kind: &str, payload_id: Uuid) -> EvidenceError {
    EvidenceError::Validation(format!(
        "event {} names a different {} than its payload ({})",
        event.id, kind, payload_id
    ))
}
