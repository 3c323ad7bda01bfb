//! Core types shared across the assessment pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evidence::DocumentVerdict;
use crate::facts::ClientInfo;
use crate::rules::{FormTrigger, MetricScope, MetricType, RuleDiagnostic};

/// The three OECD BEPS Action 13 documentation obligations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    MasterFile,
    LocalFile,
    Cbcr,
}

impl DocumentType {
    /// All document types in assessment order.
    pub const ALL: [DocumentType; 3] = [
        DocumentType::MasterFile,
        DocumentType::LocalFile,
        DocumentType::Cbcr,
    ];

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::MasterFile => "Master File",
            DocumentType::LocalFile => "Local File",
            DocumentType::Cbcr => "CbCR",
        }
    }

    /// Section name used in rule source documents.
    pub fn section(&self) -> &'static str {
        match self {
            DocumentType::MasterFile => "master_file",
            DocumentType::LocalFile => "local_file",
            DocumentType::Cbcr => "cbcr",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tri-state outcome of a condition or a condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    /// Convert a resolved comparison into a status.
    pub fn from_bool(value: bool) -> Self {
        if value {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, ConditionStatus::True)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ConditionStatus::Unknown)
    }

    /// Single-character marker used in console output.
    pub fn icon(&self) -> &'static str {
        match self {
            ConditionStatus::True => "✓",
            ConditionStatus::False => "✗",
            ConditionStatus::Unknown => "?",
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConditionStatus::True => "TRUE",
            ConditionStatus::False => "FALSE",
            ConditionStatus::Unknown => "UNKNOWN",
        })
    }
}

/// Verdict for a single rule id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    Required,
    NotRequired,
    Unknown,
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleStatus::Required => "REQUIRED",
            RuleStatus::NotRequired => "NOT REQUIRED",
            RuleStatus::Unknown => "UNKNOWN",
        })
    }
}

/// Verdict for a document type (or a form) after combining all rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Required,
    LikelyRequired,
    NotRequired,
}

impl DocumentStatus {
    /// Ordering used when two verdicts compete: Required beats
    /// LikelyRequired beats NotRequired.
    pub fn strength(&self) -> u8 {
        match self {
            DocumentStatus::Required => 2,
            DocumentStatus::LikelyRequired => 1,
            DocumentStatus::NotRequired => 0,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            DocumentStatus::Required => "✓",
            DocumentStatus::LikelyRequired => "⚠️ ",
            DocumentStatus::NotRequired => "✗",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentStatus::Required => "REQUIRED",
            DocumentStatus::LikelyRequired => "LIKELY REQUIRED",
            DocumentStatus::NotRequired => "NOT REQUIRED",
        })
    }
}

/// How well-supported a verdict is by the available data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    Low,
    /// No rule applied, so there was nothing to be confident about.
    NotApplicable,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::High => "HIGH",
            Confidence::Low => "LOW",
            Confidence::NotApplicable => "N/A",
        })
    }
}

/// A (metric, scope) pair that could not be resolved from client data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataGap {
    pub metric: MetricType,
    pub scope: MetricScope,

    /// Reason recorded for the first condition that hit this gap
    pub reason: String,
}

impl DataGap {
    /// De-duplication key.
    pub fn key(&self) -> (&MetricType, &MetricScope) {
        (&self.metric, &self.scope)
    }
}

impl fmt::Display for DataGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.metric, self.scope)
    }
}

/// A statutory form whose obligation follows from the document verdicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRequirement {
    pub form_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_type: Option<String>,

    pub trigger: FormTrigger,
    pub status: DocumentStatus,
    pub confidence: Confidence,

    /// Why the form received its status
    pub rationale: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Everything assessed for one legal entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAssessment {
    pub entity_name: String,
    pub country: String,
    pub master_file: DocumentVerdict,
    pub local_file: DocumentVerdict,
    pub cbcr: DocumentVerdict,

    #[serde(default)]
    pub forms: Vec<FormRequirement>,

    /// De-duplicated across all three document types
    #[serde(default)]
    pub data_gaps: Vec<DataGap>,
}

impl EntityAssessment {
    /// The verdict for one document type.
    pub fn verdict(&self, document: DocumentType) -> &DocumentVerdict {
        match document {
            DocumentType::MasterFile => &self.master_file,
            DocumentType::LocalFile => &self.local_file,
            DocumentType::Cbcr => &self.cbcr,
        }
    }

    /// All three verdicts in assessment order.
    pub fn verdicts(&self) -> [&DocumentVerdict; 3] {
        [&self.master_file, &self.local_file, &self.cbcr]
    }
}

/// The full output of one assessment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub client: ClientInfo,
    pub generated_at: DateTime<Utc>,
    pub entities: Vec<EntityAssessment>,

    /// Rule rows skipped or flagged while loading the rule source
    #[serde(default)]
    pub diagnostics: Vec<RuleDiagnostic>,
}
