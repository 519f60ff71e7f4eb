//! Derived aggregates over stored evidence.
//!
//! Dashboards read these instead of keeping their own counters, so every
//! consumer sees the same numbers.

use serde::Serialize;

use crate::domain::{Evidence, VersionStatus};

/// Per-criterion counts and maturity gain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CriterionStats {
    pub criterion_id: String,

    /// Evidence items tied to the criterion
    pub evidence_count: usize,

    /// Versions across all of those items
    pub total_versions: usize,

    pub approved_versions: usize,

    pub pending_versions: usize,

    pub rejected_versions: usize,

    pub requires_modification_versions: usize,

    /// Sum of maturity contributions of approved evidence, each counted once
    pub maturity_gain: u32,
}

impl CriterionStats {
    /// Fold the evidence of one criterion
    pub fn collect<'a>(
        criterion_id: &str,
        evidence: impl IntoIterator<Item = &'a Evidence>,
    ) -> Self {
        let mut stats = Self {
            criterion_id: criterion_id.to_string(),
            ..Default::default()
        };

        for item in evidence
            .into_iter()
            .filter(|e| e.criterion_id == criterion_id)
        {
            stats.evidence_count += 1;
            for version in &item.versions {
                stats.total_versions += 1;
                match version.status {
                    VersionStatus::Pending => stats.pending_versions += 1,
                    VersionStatus::Approved => stats.approved_versions += 1,
                    VersionStatus::Rejected => stats.rejected_versions += 1,
                    VersionStatus::RequiresModification => {
                        stats.requires_modification_versions += 1
                    }
                }
            }
            if item.is_approved() {
                stats.maturity_gain += u32::from(item.maturity_contribution.get());
            }
        }

        stats
    }
}

/// Store-wide summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSummary {
    pub evidence_count: usize,

    pub approved_evidence: usize,

    pub total_versions: usize,

    pub pending_versions: usize,

    pub validated_versions: usize,

    pub maturity_gain: u32,

    /// Mean overall score of all validations, if any exist
    pub average_score: Option<f64>,
}

impl StoreSummary {
    pub fn collect<'a>(evidence: impl IntoIterator<Item = &'a Evidence>) -> Self {
        let mut summary = Self::default();
        let mut score_total: u32 = 0;

        for item in evidence {
            summary.evidence_count += 1;
            if item.is_approved() {
                summary.approved_evidence += 1;
                summary.maturity_gain += u32::from(item.maturity_contribution.get());
            }
            for version in &item.versions {
                summary.total_versions += 1;
                if version.is_pending() {
                    summary.pending_versions += 1;
                }
                if let Some(validation) = &version.rssi_validation {
                    summary.validated_versions += 1;
                    score_total += u32::from(validation.overall_score);
                }
            }
        }

        if summary.validated_versions > 0 {
            summary.average_score =
                Some(f64::from(score_total) / summary.validated_versions as f64);
        }

        summary
    }
}
