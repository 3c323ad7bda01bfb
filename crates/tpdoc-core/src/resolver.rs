//! Rule-Set Resolver: combines every rule for one (country, document type)
//! into a single document verdict.
//!
//! The resolver applies a fixed policy:
//! 1. If ANY rule is Required → Required (High)
//! 2. Else if ANY rule is Unknown → LikelyRequired (Low)
//! 3. Else → NotRequired (High)
//!
//! With no applicable rules at all the document is NotRequired with
//! confidence N/A.

use tracing::debug;

use crate::evaluators::RuleAggregator;
use crate::evidence::{DocumentVerdict, RuleEvaluation};
use crate::facts::FactView;
use crate::rules::Rule;
use crate::types::{Confidence, DocumentStatus, DocumentType, RuleStatus};

/// Resolves document verdicts from rule evaluations.
#[derive(Debug, Clone, Default)]
pub struct RuleSetResolver {
    rules: RuleAggregator,
}

impl RuleSetResolver {
    pub fn new(rules: RuleAggregator) -> Self {
        Self { rules }
    }

    /// Evaluate and combine the given rules for one entity.
    pub fn resolve<'r>(
        &self,
        document: DocumentType,
        rules: impl IntoIterator<Item = &'r Rule>,
        facts: &FactView<'_>,
    ) -> DocumentVerdict {
        let evaluations: Vec<_> = rules
            .into_iter()
            .map(|rule| self.rules.evaluate(rule, facts))
            .collect();

        let verdict = Self::combine(document, evaluations);
        debug!(
            entity = %facts.entity.entity_name,
            document = %document,
            status = %verdict.status,
            confidence = %verdict.confidence,
            rules = verdict.rules.len(),
            "Resolved document verdict"
        );
        verdict
    }

    /// Combine already-evaluated rules.
    pub fn combine(document: DocumentType, rules: Vec<RuleEvaluation>) -> DocumentVerdict {
        let (status, confidence) = if rules.is_empty() {
            (DocumentStatus::NotRequired, Confidence::NotApplicable)
        } else if rules.iter().any(|r| r.status == RuleStatus::Required) {
            (DocumentStatus::Required, Confidence::High)
        } else if rules.iter().any(|r| r.status == RuleStatus::Unknown) {
            (DocumentStatus::LikelyRequired, Confidence::Low)
        } else {
            (DocumentStatus::NotRequired, Confidence::High)
        };

        DocumentVerdict {
            document,
            status,
            confidence,
            rules,
        }
    }
}
