//! Condition Evaluator
//!
//! **Question**: Does this entity's fact satisfy the threshold?
//!
//! The fact is selected by the condition's (metric, scope) pair. Missing,
//! unknown or unmapped facts resolve UNKNOWN; evaluation never fails.

use crate::config::GroupFactKeys;
use crate::evidence::{format_amount, ConditionEvaluation, UnknownCause};
use crate::facts::{FactValue, FactView};
use crate::rules::{resolve_fact_ref, Condition};
use crate::types::ConditionStatus;

/// Evaluates single conditions against a fact view.
#[derive(Debug, Clone, Default)]
pub struct ConditionEvaluator {
    keys: GroupFactKeys,
}

impl ConditionEvaluator {
    pub fn new(keys: GroupFactKeys) -> Self {
        Self { keys }
    }

    pub fn evaluate(&self, condition: &Condition, facts: &FactView<'_>) -> ConditionEvaluation {
        if condition.metric.is_always() {
            return resolved(condition, None, ConditionStatus::True, "Always required".to_string());
        }

        let Some(fact) = resolve_fact_ref(&condition.metric, &condition.scope) else {
            return unresolved(
                condition,
                UnknownCause::UnmappedMetricScope,
                format!(
                    "No fact mapping for {} ({})",
                    condition.metric, condition.scope
                ),
            );
        };

        match *facts.lookup(fact, &self.keys) {
            FactValue::Known(value) => {
                let satisfied = condition.operator.apply(value, condition.threshold);
                let reason = format!(
                    "{} ({}): {} {} {}{}",
                    condition.metric,
                    condition.scope,
                    format_amount(value),
                    condition.operator,
                    format_amount(condition.threshold),
                    condition
                        .currency
                        .as_deref()
                        .map(|c| format!(" {}", c))
                        .unwrap_or_default(),
                );
                resolved(condition, Some(value), ConditionStatus::from_bool(satisfied), reason)
            }
            FactValue::Unknown => unresolved(
                condition,
                UnknownCause::FactUnknown,
                format!("{} ({}) data marked unknown", condition.metric, condition.scope),
            ),
            FactValue::NotProvided => unresolved(
                condition,
                UnknownCause::FactNotProvided,
                format!("{} ({}) data not provided", condition.metric, condition.scope),
            ),
        }
    }
}

fn resolved(
    condition: &Condition,
    value: Option<f64>,
    status: ConditionStatus,
    reason: String,
) -> ConditionEvaluation {
    ConditionEvaluation {
        metric: condition.metric.clone(),
        scope: condition.scope.clone(),
        operator: condition.operator,
        threshold: condition.threshold,
        currency: condition.currency.clone(),
        value,
        status,
        unknown_cause: None,
        reason,
    }
}

fn unresolved(condition: &Condition, cause: UnknownCause, reason: String) -> ConditionEvaluation {
    ConditionEvaluation {
        unknown_cause: Some(cause),
        ..resolved(condition, None, ConditionStatus::Unknown, reason)
    }
}
