//! The three evaluation layers: condition → group → rule.
//!
//! Each layer is a pure function of the layer below and the facts in view.

mod condition;
mod group;
mod rule;

pub use condition::ConditionEvaluator;
pub use group::{any_of, GroupAggregator};
pub use rule::{all_groups_verdict, any_group_verdict, RuleAggregator};

use crate::config::AssessmentConfig;

/// Build the full evaluator stack for a configuration.
pub fn rule_aggregator(config: &AssessmentConfig) -> RuleAggregator {
    let conditions = ConditionEvaluator::new(config.group_fact_keys.clone());
    RuleAggregator::new(GroupAggregator::new(conditions), config.group_logic)
}
