//! Evidence store: owns evidence records and enforces the version lifecycle.
//!
//! Every mutating call takes the acting [`Actor`]. Departments submit
//! evidence and versions; the RSSI validates pending versions. All checks run
//! before anything is written, so a failed call leaves the store untouched.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::engine::{compute_overall_score, require_role, require_text, sanitize_list_inputs};
use super::repository::{EvidenceRepository, InMemoryRepository};
use super::stats::{CriterionStats, StoreSummary};
use crate::domain::{
    Actor, Attachment, Evidence, EvidenceEvent, EvidenceType, MaturityContribution, Role,
    Validation, ValidationInput, Version,
};
use crate::error::{EvidenceError, Result};

/// Change log recorded on a first version when the submitter gives none
pub const DEFAULT_CHANGE_LOG: &str = "Version initiale";

/// Receives an event after each committed mutation
pub trait EvidenceObserver {
    fn on_event(&mut self, event: &EvidenceEvent);
}

/// Collecting observer; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct EventBuffer {
    events: Arc<Mutex<Vec<EvidenceEvent>>>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the collected events
    pub fn events(&self) -> Vec<EvidenceEvent> {
        self.lock().clone()
    }

    /// Take the collected events, leaving the buffer empty
    pub fn drain(&self) -> Vec<EvidenceEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EvidenceEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EvidenceObserver for EventBuffer {
    fn on_event(&mut self, event: &EvidenceEvent) {
        self.lock().push(event.clone());
    }
}

fn notify(observers: &mut [Box<dyn EvidenceObserver>], event: &EvidenceEvent) {
    for observer in observers {
        observer.on_event(event);
    }
}

/// Input for a brand new evidence item
#[derive(Debug, Clone)]
pub struct NewEvidence {
    pub criterion_id: String,
    pub action_plan_id: Option<String>,
    pub title: String,
    pub description: String,
    pub department: String,
    pub evidence_type: EvidenceType,
    pub maturity_contribution: MaturityContribution,
    /// Falls back to the store's default change log when absent or blank
    pub change_log: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl NewEvidence {
    pub fn new(
        criterion_id: impl Into<String>,
        title: impl Into<String>,
        department: impl Into<String>,
        evidence_type: EvidenceType,
        maturity_contribution: MaturityContribution,
    ) -> Self {
        Self {
            criterion_id: criterion_id.into(),
            action_plan_id: None,
            title: title.into(),
            description: String::new(),
            department: department.into(),
            evidence_type,
            maturity_contribution,
            change_log: None,
            attachments: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_action_plan(mut self, action_plan_id: impl Into<String>) -> Self {
        self.action_plan_id = Some(action_plan_id.into());
        self
    }

    pub fn with_change_log(mut self, change_log: impl Into<String>) -> Self {
        self.change_log = Some(change_log.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Input for a follow-up version
#[derive(Debug, Clone)]
pub struct NewVersion {
    /// Mandatory: what changed since the previous version
    pub change_log: String,
    pub attachments: Vec<Attachment>,
}

impl NewVersion {
    pub fn new(change_log: impl Into<String>) -> Self {
        Self {
            change_log: change_log.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// A version waiting for the RSSI, with its owning evidence
#[derive(Debug, Clone, Copy)]
pub struct PendingValidation<'a> {
    pub evidence: &'a Evidence,
    pub version: &'a Version,
}

/// The evidence store
pub struct EvidenceStore<R: EvidenceRepository = InMemoryRepository> {
    repository: R,
    observers: Vec<Box<dyn EvidenceObserver>>,
    default_change_log: String,
}

impl EvidenceStore<InMemoryRepository> {
    /// Store backed by an empty in-memory repository
    pub fn in_memory() -> Self {
        Self::new(InMemoryRepository::new())
    }
}

impl<R: EvidenceRepository> EvidenceStore<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            observers: Vec::new(),
            default_change_log: DEFAULT_CHANGE_LOG.to_string(),
        }
    }

    /// Override the change log used for first versions
    pub fn with_default_change_log(mut self, change_log: impl Into<String>) -> Self {
        self.default_change_log = change_log.into();
        self
    }

    /// Register an observer notified after every committed mutation
    pub fn subscribe(&mut self, observer: impl EvidenceObserver + 'static) {
        self.observers.push(Box::new(observer));
    }


    /// Create an evidence item with its first, pending version
    pub fn submit_evidence(&mut self, actor: &Actor, input: NewEvidence) -> Result<&Evidence> {
        require_role(actor, Role::Department, "submit evidence")?;

        let change_log = match input.change_log {
            Some(log) if !log.trim().is_empty() => log,
            _ => self.default_change_log.clone(),
        };

        let first = Version::new(1, change_log, input.attachments, actor.id.clone());
        let version_id = first.id;
        let evidence = Evidence {
            id: Uuid::new_v4(),
            criterion_id: input.criterion_id,
            action_plan_id: input.action_plan_id,
            title: input.title,
            description: input.description,
            department: input.department,
            evidence_type: input.evidence_type,
            maturity_contribution: input.maturity_contribution,
            versions: vec![first],
            created_at: Utc::now(),
        };
        let evidence_id = evidence.id;

        let event = EvidenceEvent::evidence_submitted(&evidence, version_id, &actor.id);
        info!(%evidence_id, criterion = %evidence.criterion_id, "Evidence submitted");

        let stored = self.repository.insert(evidence);
        notify(&mut self.observers, &event);

        Ok(stored)
    }

    /// Append a new pending version and make it the latest
    pub fn submit_new_version(
        &mut self,
        actor: &Actor,
        evidence_id: Uuid,
        input: NewVersion,
    ) -> Result<&Version> {
        require_role(actor, Role::Department, "submit a new version")?;

        let evidence = self
            .repository
            .get_mut(evidence_id)
            .ok_or_else(|| EvidenceError::evidence_not_found(evidence_id))?;

        require_text("change log", &input.change_log)?;

        let next = evidence.current_version() + 1;
        let version = Version::new(next, input.change_log, input.attachments, actor.id.clone());

        let event = EvidenceEvent::version_submitted(evidence_id, &version, &actor.id);
        let stored = evidence.push_version(version);
        notify(&mut self.observers, &event);

        info!(%evidence_id, version = next, "New version submitted");

        Ok(stored)
    }

    /// Record the RSSI decision on a pending version
    pub fn validate_version(
        &mut self,
        actor: &Actor,
        evidence_id: Uuid,
        version_id: Uuid,
        input: ValidationInput,
    ) -> Result<&Version> {
        require_role(actor, Role::Rssi, "validate a version")?;

        let evidence = self
            .repository
            .get_mut(evidence_id)
            .ok_or_else(|| EvidenceError::evidence_not_found(evidence_id))?;
        let version = evidence
            .version_mut(version_id)
            .ok_or_else(|| EvidenceError::version_not_found(version_id))?;

        if !version.is_pending() {
            debug!(%version_id, status = %version.status, "Rejected re-validation");
            return Err(EvidenceError::InvalidState {
                version_id,
                status: version.status,
            });
        }

        let overall_score = compute_overall_score(&input.criteria)?;

        let validation = Validation {
            status: input.status,
            criteria: input.criteria,
            overall_score,
            remarks: input.remarks,
            recommendations: sanitize_list_inputs(&input.recommendations),
            next_actions: sanitize_list_inputs(&input.next_actions),
            validated_by: actor.id.clone(),
            validated_at: Utc::now(),
            validation_attachments: input.validation_attachments,
        };

        // Status and record are written together
        version.status = validation.status.into();
        version.rssi_validation = Some(validation.clone());

        let event =
            EvidenceEvent::version_validated(evidence_id, version, &validation, &actor.id);
        notify(&mut self.observers, &event);

        info!(
            %evidence_id,
            version = version.version,
            status = %version.status,
            overall_score,
            "Version validated"
        );

        Ok(&*version)
    }

    pub fn get(&self, evidence_id: Uuid) -> Option<&Evidence> {
        self.repository.get(evidence_id)
    }

    /// All evidence in submission order
    pub fn evidence(&self) -> Vec<&Evidence> {
        self.repository.iter().collect()
    }

    pub fn evidence_for_criterion(&self, criterion_id: &str) -> Vec<&Evidence> {
        self.repository
            .iter()
            .filter(|e| e.criterion_id == criterion_id)
            .collect()
    }

    pub fn evidence_for_action_plan(&self, action_plan_id: &str) -> Vec<&Evidence> {
        self.repository
            .iter()
            .filter(|e| e.action_plan_id.as_deref() == Some(action_plan_id))
            .collect()
    }

    /// Versions of one evidence, newest first
    pub fn history(&self, evidence_id: Uuid) -> Result<Vec<&Version>> {
        self.repository
            .get(evidence_id)
            .map(Evidence::history)
            .ok_or_else(|| EvidenceError::evidence_not_found(evidence_id))
    }

    /// RSSI work queue: every pending version, oldest submission first
    pub fn pending_validations(&self) -> Vec<PendingValidation<'_>> {
        let mut pending: Vec<_> = self
            .repository
            .iter()
            .flat_map(|evidence| {
                evidence
                    .versions
                    .iter()
                    .filter(|v| v.is_pending())
                    .map(move |version| PendingValidation { evidence, version })
            })
            .collect();

        pending.sort_by(|a, b| a.version.submitted_at.cmp(&b.version.submitted_at));
        pending
    }

    pub fn criterion_stats(&self, criterion_id: &str) -> CriterionStats {
        CriterionStats::collect(criterion_id, self.repository.iter())
    }

    pub fn summary(&self) -> StoreSummary {
        StoreSummary::collect(self.repository.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventType, ValidationCriteria, ValidationStatus, VersionStatus};

    fn contribution(value: u8) -> MaturityContribution {
        MaturityContribution::new(value).unwrap()
    }

    fn policy_input() -> NewEvidence {
        NewEvidence::new(
            "A.5.1",
            "Security policy",
            "IT",
            EvidenceType::Document,
            contribution(3),
        )
    }

    #[test]
    fn test_submit_defaults_change_log() {
        let mut store = EvidenceStore::in_memory();
        let alice = Actor::department("alice");

        let evidence = store.submit_evidence(&alice, policy_input()).unwrap();
        assert_eq!(evidence.versions[0].change_log, DEFAULT_CHANGE_LOG);

        let evidence = store
            .submit_evidence(&alice, policy_input().with_change_log("   "))
            .unwrap();
        assert_eq!(evidence.versions[0].change_log, DEFAULT_CHANGE_LOG);

        let evidence = store
            .submit_evidence(&alice, policy_input().with_change_log("Draft v1"))
            .unwrap();
        assert_eq!(evidence.versions[0].change_log, "Draft v1");
    }

    #[test]
    fn test_custom_default_change_log() {
        let mut store = EvidenceStore::in_memory().with_default_change_log("Initial version");
        let evidence = store
            .submit_evidence(&Actor::department("alice"), policy_input())
            .unwrap();
        assert_eq!(evidence.versions[0].change_log, "Initial version");
    }

    #[test]
    fn test_rssi_cannot_submit() {
        let mut store = EvidenceStore::in_memory();
        let result = store.submit_evidence(&Actor::rssi("carol"), policy_input());

        assert!(matches!(result, Err(EvidenceError::Forbidden { .. })));
        assert!(store.evidence().is_empty());
    }

    #[test]
    fn test_new_version_requires_change_log() {
        let mut store = EvidenceStore::in_memory();
        let alice = Actor::department("alice");
        let id = store.submit_evidence(&alice, policy_input()).unwrap().id;

        let result = store.submit_new_version(&alice, id, NewVersion::new("  "));
        assert!(matches!(result, Err(EvidenceError::Validation(_))));
        assert_eq!(store.get(id).unwrap().total_versions(), 1);
    }

    #[test]
    fn test_new_version_on_unknown_evidence() {
        let mut store = EvidenceStore::in_memory();
        let missing = Uuid::new_v4();
        let result = store.submit_new_version(
            &Actor::department("alice"),
            missing,
            NewVersion::new("update"),
        );

        assert_eq!(result.unwrap_err(), EvidenceError::evidence_not_found(missing));
    }

    #[test]
    fn test_new_version_not_gated_by_pending_status() {
        let mut store = EvidenceStore::in_memory();
        let alice = Actor::department("alice");
        let id = store.submit_evidence(&alice, policy_input()).unwrap().id;

        store
            .submit_new_version(&alice, id, NewVersion::new("second"))
            .unwrap();
        let third = store
            .submit_new_version(&alice, id, NewVersion::new("third"))
            .unwrap();

        assert_eq!(third.version, 3);
        let evidence = store.get(id).unwrap();
        assert!(evidence.is_consistent());
        assert_eq!(
            evidence.versions.iter().filter(|v| v.is_pending()).count(),
            3
        );
    }

    #[test]
    fn test_department_cannot_validate() {
        let mut store = EvidenceStore::in_memory();
        let alice = Actor::department("alice");
        let evidence = store.submit_evidence(&alice, policy_input()).unwrap();
        let (id, version_id) = (evidence.id, evidence.versions[0].id);

        let input = ValidationInput::new(
            ValidationStatus::Approved,
            ValidationCriteria::new(9, 9, 9, 9),
        );
        let result = store.validate_version(&alice, id, version_id, input);

        assert!(matches!(
            result,
            Err(EvidenceError::Forbidden {
                role: Role::Department,
                ..
            })
        ));
        assert!(store.get(id).unwrap().versions[0].is_pending());
    }

    #[test]
    fn test_invalid_criteria_leave_version_pending() {
        let mut store = EvidenceStore::in_memory();
        let evidence = store
            .submit_evidence(&Actor::department("alice"), policy_input())
            .unwrap();
        let (id, version_id) = (evidence.id, evidence.versions[0].id);

        let input = ValidationInput::new(
            ValidationStatus::Approved,
            ValidationCriteria::new(8, 0, 7, 7),
        );
        let result = store.validate_version(&Actor::rssi("carol"), id, version_id, input);

        assert!(matches!(result, Err(EvidenceError::Validation(_))));
        let version = &store.get(id).unwrap().versions[0];
        assert_eq!(version.status, VersionStatus::Pending);
        assert!(version.rssi_validation.is_none());
    }

    #[test]
    fn test_validation_sanitizes_lists() {
        let mut store = EvidenceStore::in_memory();
        let evidence = store
            .submit_evidence(&Actor::department("alice"), policy_input())
            .unwrap();
        let (id, version_id) = (evidence.id, evidence.versions[0].id);

        let input = ValidationInput::new(
            ValidationStatus::RequiresModification,
            ValidationCriteria::new(5, 5, 4, 3),
        )
        .with_recommendation("Add the signature page")
        .with_recommendation("   ")
        .with_next_action("")
        .with_next_action("Resubmit before audit");

        let version = store
            .validate_version(&Actor::rssi("carol"), id, version_id, input)
            .unwrap();
        let validation = version.rssi_validation.as_ref().unwrap();

        assert_eq!(version.status, VersionStatus::RequiresModification);
        assert_eq!(validation.recommendations, vec!["Add the signature page"]);
        assert_eq!(validation.next_actions, vec!["Resubmit before audit"]);
        assert_eq!(validation.validated_by, "carol");
        assert_eq!(validation.overall_score, 4);
    }

    #[test]
    fn test_observers_receive_each_event() {
        let mut store = EvidenceStore::in_memory();
        let buffer = EventBuffer::new();
        store.subscribe(buffer.clone());

        let alice = Actor::department("alice");
        let id = store.submit_evidence(&alice, policy_input()).unwrap().id;
        let version_id = store
            .submit_new_version(&alice, id, NewVersion::new("fixed typo"))
            .unwrap()
            .id;
        store
            .validate_version(
                &Actor::rssi("carol"),
                id,
                version_id,
                ValidationInput::new(
                    ValidationStatus::Approved,
                    ValidationCriteria::new(8, 6, 7, 7),
                ),
            )
            .unwrap();

        let types: Vec<_> = buffer.events().iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                EventType::EvidenceSubmitted,
                EventType::VersionSubmitted,
                EventType::VersionValidated,
            ]
        );
        assert!(buffer.events().iter().all(|e| e.evidence_id == id));

        // Failed calls emit nothing
        let _ = store.submit_new_version(&alice, id, NewVersion::new(""));
        assert_eq!(buffer.drain().len(), 3);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_pending_queue_and_lookups() {
        let mut store = EvidenceStore::in_memory();
        let alice = Actor::department("alice");

        let first = store
            .submit_evidence(&alice, policy_input().with_action_plan("AP-7"))
            .unwrap()
            .id;
        let second = store
            .submit_evidence(
                &alice,
                NewEvidence::new(
                    "PR.IP-4",
                    "Backup test report",
                    "Ops",
                    EvidenceType::Screenshot,
                    contribution(2),
                ),
            )
            .unwrap();
        let (second_id, second_version) = (second.id, second.versions[0].id);

        store
            .validate_version(
                &Actor::rssi("carol"),
                second_id,
                second_version,
                ValidationInput::new(
                    ValidationStatus::Rejected,
                    ValidationCriteria::new(2, 2, 2, 2),
                ),
            )
            .unwrap();

        let pending = store.pending_validations();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].evidence.id, first);

        assert_eq!(store.evidence_for_criterion("A.5.1").len(), 1);
        assert_eq!(store.evidence_for_action_plan("AP-7").len(), 1);
        assert!(store.evidence_for_action_plan("AP-8").is_empty());
        assert!(store.history(Uuid::new_v4()).is_err());
    }
}
