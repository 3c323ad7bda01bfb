//! Evidence trail for document verdicts.
//!
//! Every verdict carries the tree it was derived from:
//! rule → condition group → condition, with the resolved value, threshold,
//! operator and a human-readable reason at the leaves.

use serde::{Deserialize, Serialize};

use crate::rules::{ComparisonOperator, GroupLogic, MetricScope, MetricType};
use crate::types::{Confidence, ConditionStatus, DataGap, DocumentStatus, DocumentType, RuleStatus};

/// Why a condition could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCause {
    /// The client left the fact blank or absent
    FactNotProvided,
    /// The client marked the fact unknown, or it was not numeric
    FactUnknown,
    /// No fact exists for the condition's metric and scope
    UnmappedMetricScope,
}

impl UnknownCause {
    /// Whether more client data could resolve the condition.
    pub fn is_data_gap(&self) -> bool {
        matches!(self, UnknownCause::FactNotProvided | UnknownCause::FactUnknown)
    }
}

/// The outcome of one condition against one entity's facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEvaluation {
    pub metric: MetricType,
    pub scope: MetricScope,
    pub operator: ComparisonOperator,
    pub threshold: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// The fact value compared, when one was known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    pub status: ConditionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_cause: Option<UnknownCause>,

    pub reason: String,
}

impl ConditionEvaluation {
    /// The data gap this condition represents, if missing client data made
    /// it unknown.
    pub fn data_gap(&self) -> Option<DataGap> {
        match self.unknown_cause {
            Some(cause) if cause.is_data_gap() => Some(DataGap {
                metric: self.metric.clone(),
                scope: self.scope.clone(),
                reason: self.reason.clone(),
            }),
            _ => None,
        }
    }
}

/// The OR-combination of one condition group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEvaluation {
    pub group_id: String,
    pub logic: GroupLogic,
    pub status: ConditionStatus,
    pub conditions: Vec<ConditionEvaluation>,
}

/// The verdict for one rule id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub rule_id: String,
    pub country: String,
    pub status: RuleStatus,
    pub confidence: Confidence,

    /// How the groups were combined into `status`
    pub combined_with: GroupLogic,

    pub groups: Vec<GroupEvaluation>,
}

/// The combined verdict for one (entity, document type) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVerdict {
    pub document: DocumentType,
    pub status: DocumentStatus,
    pub confidence: Confidence,
    pub rules: Vec<RuleEvaluation>,
}

impl DocumentVerdict {
    /// Every condition evaluated for this verdict, in rule order.
    pub fn conditions(&self) -> impl Iterator<Item = &ConditionEvaluation> {
        self.rules
            .iter()
            .flat_map(|r| r.groups.iter())
            .flat_map(|g| g.conditions.iter())
    }

    /// Conditions that resolved UNKNOWN for any reason.
    pub fn unresolved_conditions(&self) -> impl Iterator<Item = &ConditionEvaluation> {
        self.conditions().filter(|c| c.status.is_unknown())
    }

    /// Data gaps in evaluation order, not de-duplicated.
    pub fn data_gaps(&self) -> impl Iterator<Item = DataGap> + '_ {
        self.unresolved_conditions().filter_map(ConditionEvaluation::data_gap)
    }
}

/// Format an amount with thousands separators and no decimals,
/// e.g. `850000000.0` → `"850,000,000"`.
pub(crate) fn format_amount(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
