//! # tpdoc-core
//!
//! Deterministic transfer-pricing documentation obligation engine.
//!
//! For every legal entity of a client group this crate answers:
//! - Is a Master File required?
//! - Is a Local File required?
//! - Is a Country-by-Country Report required?
//! - Which client data is still missing to be sure?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same rules and facts always produce the same verdicts
//! 2. **Tolerant**: Missing data yields UNKNOWN, never an error
//! 3. **Traceable**: Every verdict carries its rule → group → condition trail
//! 4. **Pure**: Evaluation does no I/O; only source loading can fail
//!
//! ## Example
//!
//! ```rust,ignore
//! use tpdoc_core::{assess, FactSet, RuleBook, ReportSink, TextReport};
//!
//! let rules = RuleBook::from_file("rules.yaml")?;
//! let facts = FactSet::from_file("client.yaml")?;
//! let report = assess(&rules, &facts);
//!
//! for entity in &report.entities {
//!     println!("{}: Master File {}", entity.entity_name, entity.master_file.status);
//! }
//! TextReport::new().write_report(&report, &mut std::io::stdout())?;
//! ```

pub mod assessment;
pub mod config;
pub mod evaluators;
pub mod evidence;
pub mod facts;
pub mod forms;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod schema;
pub mod source;
pub mod types;

// Re-export main types at crate root
pub use assessment::{collect_data_gaps, Assessor};
pub use config::{AssessmentConfig, ConfigError, GroupFactKeys, GroupLogicMode};
pub use evaluators::{ConditionEvaluator, GroupAggregator, RuleAggregator};
pub use evidence::{
    ConditionEvaluation, DocumentVerdict, GroupEvaluation, RuleEvaluation, UnknownCause,
};
pub use facts::{ClientInfo, EntityFacts, FactSet, FactValue, FactView, GroupFacts};
pub use forms::resolve_form;
pub use report::{JsonReport, ReportError, ReportSink, TextReport};
pub use resolver::RuleSetResolver;
pub use rules::{
    Condition, ConditionGroup, DiagnosticKind, FormRule, FormTrigger, GroupLogic, MetricScope,
    MetricType, Rule, RuleBook, RuleDiagnostic,
};
pub use schema::{validate_source, SchemaError, SourceKind};
pub use source::{FactSource, FileSource, RuleSource, SourceError};
pub use types::{
    AssessmentReport, ConditionStatus, Confidence, DataGap, DocumentStatus, DocumentType,
    EntityAssessment, FormRequirement, RuleStatus,
};

use thiserror::Error;

/// Errors that can occur during an assessment run
#[derive(Error, Debug)]
pub enum AssessmentError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Assess every entity of a fact set with the default configuration.
///
/// This is the main entry point for in-memory inputs.
pub fn assess(book: &RuleBook, facts: &FactSet) -> AssessmentReport {
    assess_with_config(book, facts, &AssessmentConfig::default())
}

/// Assess with an explicit configuration.
pub fn assess_with_config(
    book: &RuleBook,
    facts: &FactSet,
    config: &AssessmentConfig,
) -> AssessmentReport {
    Assessor::new(config).assess(book, facts)
}

/// Load both sources, then assess.
///
/// # Arguments
///
/// * `rules` - Supplies the rule book
/// * `facts` - Supplies the client facts
/// * `config` - Group logic mode and group fact key names
///
/// # Returns
///
/// An `AssessmentReport`, or the first source that failed to load.
pub fn assess_sources(
    rules: &dyn RuleSource,
    facts: &dyn FactSource,
    config: &AssessmentConfig,
) -> Result<AssessmentReport, AssessmentError> {
    let book = rules.load_rules()?;
    let facts = facts.load_facts()?;
    Ok(assess_with_config(&book, &facts, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
cbcr:
  - rule_id: CBCR-FR-1
    country: France
    condition_group: 1
    metric_type: Revenue
    metric_scope: Group (Consolidated)
    threshold: 750000000
    currency: EUR
    operator: ">="
"#;

    const FACTS: &str = r#"
client:
  name: Example Group
group:
  Group Revenue (EUR): 900000000
entities:
  - country: France
    entity_name: Example SAS
"#;

    #[test]
    fn test_basic_assessment() {
        let book = RuleBook::from_yaml(RULES).unwrap();
        let facts = FactSet::from_yaml(FACTS).unwrap();
        let report = assess(&book, &facts);

        assert_eq!(report.client.name.as_deref(), Some("Example Group"));
        assert_eq!(report.entities.len(), 1);
        assert_eq!(report.entities[0].cbcr.status, DocumentStatus::Required);
        assert_eq!(report.entities[0].master_file.confidence, Confidence::NotApplicable);
        assert!(report.entities[0].data_gaps.is_empty());
    }

    #[test]
    fn test_assess_in_memory_sources() {
        let book = RuleBook::from_yaml(RULES).unwrap();
        let facts = FactSet::from_yaml(FACTS).unwrap();
        let report = assess_sources(&book, &facts, &AssessmentConfig::default()).unwrap();
        assert_eq!(report.entities[0].cbcr.status, DocumentStatus::Required);
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let book = RuleBook::from_yaml(RULES).unwrap();
        let missing = FileSource::new("/nonexistent/client.yaml");
        let result = assess_sources(&book, &missing, &AssessmentConfig::default());

        match result {
            Err(AssessmentError::Source(err)) => {
                assert_eq!(
                    err.path(),
                    Some(std::path::Path::new("/nonexistent/client.yaml"))
                );
            }
            other => panic!("expected source error, got {:?}", other.map(|_| ())),
        }
    }
}
