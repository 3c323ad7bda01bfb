//! Statutory form requirements.
//!
//! A form's status follows the document verdict its trigger names.

use crate::evidence::DocumentVerdict;
use crate::rules::{FormRule, FormTrigger};
use crate::types::{Confidence, DocumentStatus, DocumentType, FormRequirement};

/// Resolve one form against the entity's document verdicts.
pub fn resolve_form<'a>(
    form: &FormRule,
    verdict: impl Fn(DocumentType) -> &'a DocumentVerdict,
) -> FormRequirement {
    let follow = |document: DocumentType| {
        let v = verdict(document);
        (
            v.status,
            v.confidence,
            format!("{} is {}", document, v.status),
        )
    };

    let (status, confidence, rationale) = match &form.trigger {
        FormTrigger::Always => (
            DocumentStatus::Required,
            Confidence::High,
            "Always required".to_string(),
        ),
        FormTrigger::IfMasterFile => follow(DocumentType::MasterFile),
        FormTrigger::IfLocalFile => follow(DocumentType::LocalFile),
        FormTrigger::IfCbcr => follow(DocumentType::Cbcr),
        FormTrigger::IfMasterOrLocalFile => {
            let mf = verdict(DocumentType::MasterFile);
            let lf = verdict(DocumentType::LocalFile);
            // Ties go to the Master File
            let (document, stronger) = if lf.status.strength() > mf.status.strength() {
                (DocumentType::LocalFile, lf)
            } else {
                (DocumentType::MasterFile, mf)
            };
            (
                stronger.status,
                stronger.confidence,
                format!("{} is {}", document, stronger.status),
            )
        }
        FormTrigger::Other(trigger) => (
            DocumentStatus::LikelyRequired,
            Confidence::Low,
            format!("Manual review: trigger \"{}\" is not evaluated", trigger),
        ),
    };

    FormRequirement {
        form_name: form.form_name.clone(),
        form_type: form.form_type.clone(),
        trigger: form.trigger.clone(),
        status,
        confidence,
        rationale,
        notes: form.notes.clone(),
    }
}
