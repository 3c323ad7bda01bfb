//! Report sinks.

use std::io;

use thiserror::Error;

use crate::evidence::DocumentVerdict;
use crate::types::{AssessmentReport, DocumentStatus, EntityAssessment};

const WIDTH: usize = 80;

/// Errors that can occur while writing a report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Consumes a finished assessment.
pub trait ReportSink {
    fn write_report(&self, report: &AssessmentReport, out: &mut dyn io::Write) -> Result<(), ReportError>;

    /// Render into a string.
    fn render(&self, report: &AssessmentReport) -> Result<String, ReportError> {
        let mut buf = Vec::new();
        self.write_report(report, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Human-readable console layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReport;

impl TextReport {
    pub fn new() -> Self {
        Self
    }

    fn write_verdict(&self, verdict: &DocumentVerdict, out: &mut dyn io::Write) -> io::Result<()> {
        let status = match verdict.status {
            DocumentStatus::LikelyRequired => format!(
                "{} {} - VERIFICATION NEEDED",
                verdict.status.icon(),
                verdict.status
            ),
            _ => format!("{} {}", verdict.status.icon(), verdict.status),
        };
        writeln!(out)?;
        writeln!(out, "{}: {}", verdict.document, status)?;
        writeln!(out, "Confidence: {}", verdict.confidence)?;

        for condition in verdict.conditions() {
            writeln!(out, "  {} {}", condition.status.icon(), condition.reason)?;
        }
        Ok(())
    }

    fn write_entity(&self, entity: &EntityAssessment, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", "─".repeat(WIDTH))?;
        writeln!(out, "ENTITY: {}", entity.entity_name)?;
        writeln!(out, "Country: {}", entity.country)?;
        writeln!(out, "{}", "─".repeat(WIDTH))?;

        for verdict in entity.verdicts() {
            self.write_verdict(verdict, out)?;
        }

        if !entity.forms.is_empty() {
            writeln!(out)?;
            writeln!(out, "📄 FORMS:")?;
            for form in &entity.forms {
                let name = match &form.form_type {
                    Some(form_type) => format!("{} ({})", form.form_name, form_type),
                    None => form.form_name.clone(),
                };
                writeln!(
                    out,
                    "  {} {}: {} [{}] - {}",
                    form.status.icon(),
                    name,
                    form.status,
                    form.confidence,
                    form.rationale
                )?;
            }
        }

        if !entity.data_gaps.is_empty() {
            writeln!(out)?;
            writeln!(out, "📋 DATA NEEDED:")?;
            for gap in &entity.data_gaps {
                writeln!(out, "  - {}", gap)?;
            }
        }
        Ok(())
    }
}

impl ReportSink for TextReport {
    fn write_report(&self, report: &AssessmentReport, out: &mut dyn io::Write) -> Result<(), ReportError> {
        let fye = match (report.client.fiscal_year_end_date(), &report.client.fiscal_year_end) {
            (Some(date), _) => date.format("%Y-%m-%d").to_string(),
            (None, Some(raw)) => raw.clone(),
            (None, None) => "Unknown".to_string(),
        };

        writeln!(out)?;
        writeln!(out, "{}", "=".repeat(WIDTH))?;
        writeln!(
            out,
            "TP COMPLIANCE ASSESSMENT - {}",
            report.client.name.as_deref().unwrap_or("Unknown Client")
        )?;
        writeln!(out, "FYE: {}", fye)?;
        writeln!(out, "Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(out, "{}", "=".repeat(WIDTH))?;

        for entity in &report.entities {
            self.write_entity(entity, out)?;
        }

        if !report.diagnostics.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", "─".repeat(WIDTH))?;
            writeln!(out, "RULE SOURCE DIAGNOSTICS: {}", report.diagnostics.len())?;
            for d in &report.diagnostics {
                writeln!(
                    out,
                    "  - {} row {} ({}): {}",
                    d.section,
                    d.row,
                    d.rule_id.as_deref().unwrap_or("no rule id"),
                    d.message
                )?;
            }
        }

        writeln!(out)?;
        writeln!(out, "{}", "=".repeat(WIDTH))?;
        Ok(())
    }
}

/// Pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReport;

impl JsonReport {
    pub fn new() -> Self {
        Self
    }
}

impl ReportSink for JsonReport {
    fn write_report(&self, report: &AssessmentReport, out: &mut dyn io::Write) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{EntityFacts, FactSet, FactValue, GroupFacts};
    use crate::rules::{EntityField, RuleBook};
    use crate::Assessor;

    const RULES: &str = r#"
master_file:
  - { rule_id: MF-DE-1, country: Germany, condition_group: 1, metric_type: Revenue, metric_scope: Group (Consolidated), threshold: 750000000, currency: EUR, operator: ">=" }
  - { rule_id: MF-DE-1, country: Germany, condition_group: 1, metric_type: Revenue, metric_scope: Local Entity, threshold: 100000000, currency: EUR, operator: ">=" }
local_file:
  - { rule_id: LF-DE-1, country: Germany, metric_type: Revenue, metric_scope: Local Entity, operator: ">=" }
forms:
  - { country: Germany, form_name: Master File Submission, form_type: Filing, trigger: If MF Required }
"#;

    fn report() -> AssessmentReport {
        let book = RuleBook::from_yaml(RULES).unwrap();
        let mut group = GroupFacts::new();
        group.insert("Group Revenue (EUR)", FactValue::Known(850_000_000.0));
        let facts = FactSet {
            group,
            entities: vec![EntityFacts::new("Germany", "Example GmbH")
                .with(EntityField::Revenue, FactValue::Unknown)],
            ..Default::default()
        };
        Assessor::default().assess(&book, &facts)
    }

    #[test]
    fn test_text_report_layout() {
        let text = TextReport::new().render(&report()).unwrap();

        assert!(text.contains("TP COMPLIANCE ASSESSMENT - Unknown Client"));
        assert!(text.contains("FYE: Unknown"));
        assert!(text.contains("ENTITY: Example GmbH"));
        assert!(text.contains("Master File: ✓ REQUIRED"));
        assert!(text.contains("  ✓ Revenue (Group (Consolidated)): 850,000,000 >= 750,000,000 EUR"));
        assert!(text.contains("  ? Revenue (Local Entity) data marked unknown"));
        assert!(text.contains("Local File: ✗ NOT REQUIRED"));
        assert!(text.contains("Confidence: N/A"));
        assert!(text.contains("Master File Submission (Filing): REQUIRED [HIGH]"));
        assert!(text.contains("📋 DATA NEEDED:\n  - Revenue (Local Entity)"));
        assert!(text.contains("RULE SOURCE DIAGNOSTICS: 1"));
    }

    #[test]
    fn test_json_report_roundtrip() {
        let report = report();
        let json = JsonReport::new().render(&report).unwrap();
        let parsed: AssessmentReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
