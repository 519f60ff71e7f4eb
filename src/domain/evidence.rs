//! Evidence items and their versions.
//!
//! An [`Evidence`] owns an append-only list of [`Version`]s. Versions are
//! stored in ascending `version` order; exactly one of them is flagged
//! `is_latest`, and it is always the one with the highest number.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::Validation;
use crate::error::{EvidenceError, Result};

/// Kind of artifact an evidence item claims to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Document,
    Screenshot,
    Certificate,
    Procedure,
    Other,
}

impl Default for EvidenceType {
    fn default() -> Self {
        Self::Document
    }
}

impl EvidenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Screenshot => "screenshot",
            Self::Certificate => "certificate",
            Self::Procedure => "procedure",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared maturity points (1-5) an approved evidence adds to its criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MaturityContribution(u8);

impl MaturityContribution {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(EvidenceError::Validation(format!(
                "maturity contribution must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MaturityContribution {
    type Error = EvidenceError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MaturityContribution> for u8 {
    fn from(value: MaturityContribution) -> Self {
        value.0
    }
}

/// Reference to an uploaded file. Contents are never inspected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,

    pub size_bytes: u64,

    /// MIME type as reported by the uploader
    pub mime_type: String,

    /// Where the blob lives (path or URL)
    pub url: String,

    pub uploaded_by: String,

    pub uploaded_at: DateTime<Utc>,

    /// Content digest, when the intake computed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Review status of a single version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    /// Awaiting RSSI review
    Pending,

    Approved,

    Rejected,

    /// Department must submit a new version
    RequiresModification,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::RequiresModification => "requires_modification",
        }
    }

    /// Whether a decision has been recorded. Decided versions never change again.
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Default for VersionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted revision of an evidence item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: Uuid,

    /// 1-based revision number, strictly increasing per evidence
    pub version: u32,

    pub status: VersionStatus,

    /// What changed compared to the previous version
    pub change_log: String,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    pub submitted_by: String,

    pub submitted_at: DateTime<Utc>,

    /// Present once (and only once) the RSSI has decided this version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi_validation: Option<Validation>,

    pub is_latest: bool,
}

impl Version {
    /// Create a fresh pending version flagged as latest
    pub fn new(
        version: u32,
        change_log: String,
        attachments: Vec<Attachment>,
        submitted_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            version,
            status: VersionStatus::Pending,
            change_log,
            attachments,
            submitted_by,
            submitted_at: Utc::now(),
            rssi_validation: None,
            is_latest: true,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == VersionStatus::Pending
    }

    /// Total size of the attached files
    pub fn attachment_bytes(&self) -> u64 {
        self.attachments.iter().map(|a| a.size_bytes).sum()
    }
}

/// A proof artifact supporting one framework criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: Uuid,

    /// Framework criterion this evidence supports
    pub criterion_id: String,

    /// Action plan item, when the evidence was raised from a treatment plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_plan_id: Option<String>,

    pub title: String,

    pub description: String,

    /// Submitting department
    pub department: String,

    pub evidence_type: EvidenceType,

    pub maturity_contribution: MaturityContribution,

    /// Ascending append order
    pub versions: Vec<Version>,

    pub created_at: DateTime<Utc>,
}

impl Evidence {
    /// Highest version number
    pub fn current_version(&self) -> u32 {
        self.versions.iter().map(|v| v.version).max().unwrap_or(0)
    }

    pub fn total_versions(&self) -> usize {
        self.versions.len()
    }

    /// The version flagged `is_latest`
    pub fn latest(&self) -> Option<&Version> {
        self.versions.iter().find(|v| v.is_latest)
    }

    pub fn version(&self, version_id: Uuid) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == version_id)
    }

    pub fn version_mut(&mut self, version_id: Uuid) -> Option<&mut Version> {
        self.versions.iter_mut().find(|v| v.id == version_id)
    }

    /// Versions newest first, for history views
    pub fn history(&self) -> Vec<&Version> {
        let mut versions: Vec<_> = self.versions.iter().collect();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        versions
    }

    /// Counts toward maturity gain once any version is approved
    pub fn is_approved(&self) -> bool {
        self.versions
            .iter()
            .any(|v| v.status == VersionStatus::Approved)
    }

    /// Append a version as the new latest, demoting the previous one.
    ///
    /// The caller is responsible for numbering: `version.version` must be
    /// `current_version() + 1`.
    pub(crate) fn push_version(&mut self, mut version: Version) -> &Version {
        for existing in &mut self.versions {
            existing.is_latest = false;
        }
        version.is_latest = true;
        self.versions.push(version);
        &self.versions[self.versions.len() - 1]
    }

    /// Check the version chain: numbered 1..=n without gaps, a single latest
    /// that is the highest, and a validation present iff the version is decided.
    pub fn is_consistent(&self) -> bool {
        let numbered = self
            .versions
            .iter()
            .enumerate()
            .all(|(i, v)| v.version as usize == i + 1);

        let latest: Vec<_> = self.versions.iter().filter(|v| v.is_latest).collect();
        let single_latest =
            latest.len() == 1 && latest[0].version == self.current_version();

        let decisions = self
            .versions
            .iter()
            .all(|v| v.status.is_decided() == v.rssi_validation.is_some());

        !self.versions.is_empty() && numbered && single_latest && decisions
    }
}
