//! Loaded rule structures.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::DocumentType;

use super::metric::{MetricScope, MetricType};
use super::operator::ComparisonOperator;

/// How the groups of a rule are meant to be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupLogic {
    #[default]
    Or,
    And,
}

impl GroupLogic {
    /// Parse a group logic label. Blank labels mean OR.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "" | "OR" | "ANY" => Some(GroupLogic::Or),
            "AND" | "ALL" => Some(GroupLogic::And),
            _ => None,
        }
    }
}

impl fmt::Display for GroupLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupLogic::Or => "OR",
            GroupLogic::And => "AND",
        })
    }
}

/// A single threshold condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub metric: MetricType,
    pub scope: MetricScope,
    pub threshold: f64,

    /// Informational only, no conversion is performed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    pub operator: ComparisonOperator,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Conditions sharing a group identifier, combined with OR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub id: String,
    pub logic: GroupLogic,
    pub conditions: Vec<Condition>,
}

/// One logical rule: every record sharing rule id, country and document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub country: String,
    pub document: DocumentType,
    pub groups: Vec<ConditionGroup>,
}

impl Rule {
    /// The logic label carried by the rule's first group.
    pub fn group_logic(&self) -> GroupLogic {
        self.groups.first().map(|g| g.logic).unwrap_or_default()
    }

    pub fn applies_to(&self, country: &str) -> bool {
        same_country(&self.country, country)
    }

    /// Iterate every condition of the rule.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.groups.iter().flat_map(|g| g.conditions.iter())
    }
}

/// Country names are matched trimmed and ASCII case-insensitively.
pub fn same_country(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Which document verdict a statutory form follows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormTrigger {
    Always,
    IfMasterFile,
    IfLocalFile,
    IfMasterOrLocalFile,
    IfCbcr,
    /// Anything else; needs manual review
    Other(String),
}

impl FormTrigger {
    pub fn from_label(label: &str) -> Self {
        let normalized = label
            .trim()
            .to_ascii_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "always" => FormTrigger::Always,
            "if mf required" => FormTrigger::IfMasterFile,
            "if lf required" => FormTrigger::IfLocalFile,
            "if mf or lf required" | "if lf or mf required" => FormTrigger::IfMasterOrLocalFile,
            "if cbcr required" => FormTrigger::IfCbcr,
            _ => FormTrigger::Other(label.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FormTrigger::Always => "Always",
            FormTrigger::IfMasterFile => "If MF Required",
            FormTrigger::IfLocalFile => "If LF Required",
            FormTrigger::IfMasterOrLocalFile => "If MF or LF Required",
            FormTrigger::IfCbcr => "If CbCR Required",
            FormTrigger::Other(label) => label,
        }
    }
}

impl fmt::Display for FormTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for FormTrigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for FormTrigger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(FormTrigger::from_label(&label))
    }
}

/// A statutory form tied to a country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRule {
    pub country: String,
    pub form_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_type: Option<String>,

    pub trigger: FormTrigger,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
