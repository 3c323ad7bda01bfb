//! Assessment orchestration.
//!
//! For every entity (in fact-source order) and every document type the
//! applicable rules are resolved, forms are derived from the resulting
//! verdicts, and the data gaps of all three verdicts are merged.

use chrono::Utc;
use tracing::{debug, info};

use crate::config::AssessmentConfig;
use crate::evaluators::rule_aggregator;
use crate::evidence::DocumentVerdict;
use crate::facts::{EntityFacts, FactSet, FactView, GroupFacts};
use crate::forms::resolve_form;
use crate::resolver::RuleSetResolver;
use crate::rules::RuleBook;
use crate::types::{AssessmentReport, DataGap, DocumentType, EntityAssessment};

/// Runs the resolver over every entity of a fact set.
#[derive(Debug, Clone, Default)]
pub struct Assessor {
    resolver: RuleSetResolver,
}

impl Assessor {
    pub fn new(config: &AssessmentConfig) -> Self {
        Self {
            resolver: RuleSetResolver::new(rule_aggregator(config)),
        }
    }

    /// Assess every entity in the fact set.
    pub fn assess(&self, book: &RuleBook, facts: &FactSet) -> AssessmentReport {
        let entities: Vec<_> = facts
            .entities
            .iter()
            .map(|entity| self.assess_entity(book, &facts.group, entity))
            .collect();

        info!(
            entities = entities.len(),
            rules = book.rules().len(),
            diagnostics = book.diagnostics().len(),
            "Assessment complete"
        );

        AssessmentReport {
            client: facts.client.clone(),
            generated_at: Utc::now(),
            entities,
            diagnostics: book.diagnostics().to_vec(),
        }
    }

    /// Assess a single entity.
    pub fn assess_entity(
        &self,
        book: &RuleBook,
        group: &GroupFacts,
        entity: &EntityFacts,
    ) -> EntityAssessment {
        let view = FactView::new(group, entity);
        let [master_file, local_file, cbcr] = DocumentType::ALL.map(|document| {
            self.resolver
                .resolve(document, book.rules_for(&entity.country, document), &view)
        });

        let forms = book
            .forms_for(&entity.country)
            .map(|form| {
                resolve_form(form, |document| match document {
                    DocumentType::MasterFile => &master_file,
                    DocumentType::LocalFile => &local_file,
                    DocumentType::Cbcr => &cbcr,
                })
            })
            .collect();

        let data_gaps = collect_data_gaps([&master_file, &local_file, &cbcr]);
        debug!(
            entity = %entity.entity_name,
            country = %entity.country,
            data_gaps = data_gaps.len(),
            "Assessed entity"
        );

        EntityAssessment {
            entity_name: entity.entity_name.clone(),
            country: entity.country.clone(),
            master_file,
            local_file,
            cbcr,
            forms,
            data_gaps,
        }
    }
}

/// Merge the data gaps of several verdicts, keeping the first occurrence
/// of each (metric, scope) pair.
pub fn collect_data_gaps<'a>(verdicts: impl IntoIterator<Item = &'a DocumentVerdict>) -> Vec<DataGap> {
    let mut gaps: Vec<DataGap> = Vec::new();
    for gap in verdicts.into_iter().flat_map(DocumentVerdict::data_gaps) {
        if !gaps.iter().any(|seen| seen.key() == gap.key()) {
            gaps.push(gap);
        }
    }
    gaps
}
