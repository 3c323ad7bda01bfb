//! Rule Aggregator
//!
//! Combines the groups of one rule id into a rule verdict. The default
//! policy treats groups as alternatives:
//! 1. If ANY group is TRUE → Required (High)
//! 2. Else if ALL groups are UNKNOWN → Unknown (Low)
//! 3. Else → NotRequired (High)
//!
//! A mix of FALSE and UNKNOWN groups is NotRequired under this policy.
//! In `Labelled` mode, rules whose group logic is AND use Kleene AND
//! instead, see [`all_groups_verdict`].

use crate::config::GroupLogicMode;
use crate::evidence::RuleEvaluation;
use crate::facts::FactView;
use crate::rules::{GroupLogic, Rule};
use crate::types::{ConditionStatus, Confidence, RuleStatus};

use super::group::GroupAggregator;

/// Default combination: any TRUE group triggers the rule.
pub fn any_group_verdict(groups: &[ConditionStatus]) -> (RuleStatus, Confidence) {
    if groups.iter().any(ConditionStatus::is_true) {
        (RuleStatus::Required, Confidence::High)
    } else if !groups.is_empty() && groups.iter().all(ConditionStatus::is_unknown) {
        (RuleStatus::Unknown, Confidence::Low)
    } else {
        (RuleStatus::NotRequired, Confidence::High)
    }
}

/// Kleene AND: any FALSE group rules it out, any UNKNOWN leaves it open.
pub fn all_groups_verdict(groups: &[ConditionStatus]) -> (RuleStatus, Confidence) {
    if groups.contains(&ConditionStatus::False) {
        (RuleStatus::NotRequired, Confidence::High)
    } else if groups.iter().any(ConditionStatus::is_unknown) {
        (RuleStatus::Unknown, Confidence::Low)
    } else if groups.is_empty() {
        (RuleStatus::NotRequired, Confidence::High)
    } else {
        (RuleStatus::Required, Confidence::High)
    }
}

/// Evaluates all groups of a rule and combines them.
#[derive(Debug, Clone, Default)]
pub struct RuleAggregator {
    groups: GroupAggregator,
    mode: GroupLogicMode,
}

impl RuleAggregator {
    pub fn new(groups: GroupAggregator, mode: GroupLogicMode) -> Self {
        Self { groups, mode }
    }

    /// The logic actually applied to a rule under the current mode.
    pub fn combination_for(&self, rule: &Rule) -> GroupLogic {
        match self.mode {
            GroupLogicMode::AnyGroup => GroupLogic::Or,
            GroupLogicMode::Labelled => rule.group_logic(),
        }
    }

    pub fn evaluate(&self, rule: &Rule, facts: &FactView<'_>) -> RuleEvaluation {
        let groups: Vec<_> = rule
            .groups
            .iter()
            .map(|g| self.groups.evaluate(g, facts))
            .collect();
        let statuses: Vec<_> = groups.iter().map(|g| g.status).collect();

        let combined_with = self.combination_for(rule);
        let (status, confidence) = match combined_with {
            GroupLogic::Or => any_group_verdict(&statuses),
            GroupLogic::And => all_groups_verdict(&statuses),
        };

        RuleEvaluation {
            rule_id: rule.id.clone(),
            country: rule.country.clone(),
            status,
            confidence,
            combined_with,
            groups,
        }
    }
}
