//! Rule source parsing and the rule data model.
//!
//! Rule sources are structured data validated against JSON Schema.
//! This module parses YAML/JSON rule sources, validates every row, and
//! assembles rows into rules and condition groups.

mod metric;
mod model;
mod operator;
mod parser;

pub use metric::{
    resolve_fact_ref, EntityField, FactRef, GroupMetric, MetricScope, MetricType, RptCategory,
};
pub use model::{same_country, Condition, ConditionGroup, FormRule, FormTrigger, GroupLogic, Rule};
pub use operator::ComparisonOperator;
pub use parser::{
    DiagnosticKind, FormRecord, RuleBook, RuleDiagnostic, RuleRecord, RuleSourceDocument, Scalar,
};
