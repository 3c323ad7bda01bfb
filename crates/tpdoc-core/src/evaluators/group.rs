//! Group Aggregator
//!
//! Conditions within a group are combined with OR:
//! 1. If ANY condition is TRUE → TRUE
//! 2. Else if ANY condition is UNKNOWN → UNKNOWN
//! 3. Else → FALSE (including an empty group)

use crate::evidence::GroupEvaluation;
use crate::facts::FactView;
use crate::rules::ConditionGroup;
use crate::types::ConditionStatus;

use super::condition::ConditionEvaluator;

/// Tri-state OR.
pub fn any_of(statuses: impl IntoIterator<Item = ConditionStatus>) -> ConditionStatus {
    let mut saw_unknown = false;
    for status in statuses {
        match status {
            ConditionStatus::True => return ConditionStatus::True,
            ConditionStatus::Unknown => saw_unknown = true,
            ConditionStatus::False => {}
        }
    }
    if saw_unknown {
        ConditionStatus::Unknown
    } else {
        ConditionStatus::False
    }
}

/// Evaluates every condition of a group and combines the results.
#[derive(Debug, Clone, Default)]
pub struct GroupAggregator {
    conditions: ConditionEvaluator,
}

impl GroupAggregator {
    pub fn new(conditions: ConditionEvaluator) -> Self {
        Self { conditions }
    }

    pub fn evaluate(&self, group: &ConditionGroup, facts: &FactView<'_>) -> GroupEvaluation {
        // Every condition is evaluated so the evidence trail is complete
        let conditions: Vec<_> = group
            .conditions
            .iter()
            .map(|c| self.conditions.evaluate(c, facts))
            .collect();

        GroupEvaluation {
            group_id: group.id.clone(),
            logic: group.logic,
            status: any_of(conditions.iter().map(|c| c.status)),
            conditions,
        }
    }
}
