//! RSSI validation records.
//!
//! A [`Validation`] is written once, when the security officer decides a
//! pending version. Its `overall_score` is always derived from the four
//! rubric criteria and is never supplied by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evidence::{Attachment, VersionStatus};

/// Decision recorded by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Approved,
    Rejected,
    RequiresModification,
}

impl From<ValidationStatus> for VersionStatus {
    fn from(status: ValidationStatus) -> Self {
        match status {
            ValidationStatus::Approved => VersionStatus::Approved,
            ValidationStatus::Rejected => VersionStatus::Rejected,
            ValidationStatus::RequiresModification => VersionStatus::RequiresModification,
        }
    }
}

impl std::str::FromStr for ValidationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "requires_modification" => Ok(Self::RequiresModification),
            other => Err(format!("Unknown validation status: {}", other)),
        }
    }
}

/// The four rubric sub-scores, each expected in 1..=10
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCriteria {
    pub completeness: u8,
    pub relevance: u8,
    pub quality: u8,
    pub implementation: u8,
}

impl ValidationCriteria {
    pub fn new(completeness: u8, relevance: u8, quality: u8, implementation: u8) -> Self {
        Self {
            completeness,
            relevance,
            quality,
            implementation,
        }
    }

    /// Named scores, in rubric order
    pub fn scores(&self) -> [(&'static str, u8); 4] {
        [
            ("completeness", self.completeness),
            ("relevance", self.relevance),
            ("quality", self.quality),
            ("implementation", self.implementation),
        ]
    }
}

/// What the validator supplies when deciding a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationInput {
    pub status: ValidationStatus,

    pub criteria: ValidationCriteria,

    #[serde(default)]
    pub remarks: String,

    /// May contain blank entries (e.g. empty form rows); they are dropped
    #[serde(default)]
    pub recommendations: Vec<String>,

    #[serde(default)]
    pub next_actions: Vec<String>,

    #[serde(default)]
    pub validation_attachments: Vec<Attachment>,
}

impl ValidationInput {
    pub fn new(status: ValidationStatus, criteria: ValidationCriteria) -> Self {
        Self {
            status,
            criteria,
            remarks: String::new(),
            recommendations: Vec::new(),
            next_actions: Vec::new(),
            validation_attachments: Vec::new(),
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendations.push(recommendation.into());
        self
    }

    pub fn with_next_action(mut self, action: impl Into<String>) -> Self {
        self.next_actions.push(action.into());
        self
    }
}

/// The stored validation attached to a decided version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub status: ValidationStatus,

    pub criteria: ValidationCriteria,

    /// Rounded mean of the four criteria
    pub overall_score: u8,

    pub remarks: String,

    pub recommendations: Vec<String>,

    pub next_actions: Vec<String>,

    pub validated_by: String,

    pub validated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_attachments: Vec<Attachment>,
}
