//! Rule book loading.
//!
//! Rule sources are flat record lists, one row per condition, exactly like
//! the country rules library spreadsheet. Rows sharing rule id, country and
//! document type are assembled into one [`Rule`]; rows sharing a condition
//! group inside that rule form one [`ConditionGroup`].
//!
//! Bad rows never abort loading. They are skipped (or kept, for unmapped
//! metric/scope pairs) and recorded as [`RuleDiagnostic`]s.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::facts::parse_number;
use crate::schema::SourceKind;
use crate::source::{parse_document, read_source, Format, SourceError};
use crate::types::DocumentType;

use super::metric::{resolve_fact_ref, MetricScope, MetricType};
use super::model::{same_country, Condition, ConditionGroup, FormRule, FormTrigger, GroupLogic, Rule};
use super::operator::ComparisonOperator;

/// A cell that may hold text or a number.
///
/// Booleans, lists and maps land in `Other` so that the loader can skip the
/// row with a diagnostic instead of rejecting the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Scalar {
    /// Text form; blank text is treated as absent.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Scalar::Number(n) => Some(n.to_string()),
            Scalar::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Scalar::Other(_) => None,
        }
    }

    /// Numeric form, accepting numeric text with thousands separators.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) if n.is_finite() => Some(*n),
            Scalar::Number(_) => None,
            Scalar::Text(s) => parse_number(s),
            Scalar::Other(_) => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Scalar::Other(_))
    }
}

fn text(cell: &Option<Scalar>) -> Option<String> {
    cell.as_ref().and_then(Scalar::as_text)
}

/// Names of the cells holding something other than text or a number.
fn unsupported<'a>(cells: &[(&'a str, &Option<Scalar>)]) -> Vec<&'a str> {
    cells
        .iter()
        .filter(|(_, cell)| cell.as_ref().is_some_and(|c| !c.is_supported()))
        .map(|(name, _)| *name)
        .collect()
}

/// One row of a rule section, as written in the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(default)]
    pub rule_id: Option<Scalar>,
    #[serde(default)]
    pub country: Option<Scalar>,
    #[serde(default)]
    pub condition_group: Option<Scalar>,
    #[serde(default)]
    pub group_logic: Option<Scalar>,
    #[serde(default)]
    pub metric_type: Option<Scalar>,
    #[serde(default)]
    pub metric_scope: Option<Scalar>,
    #[serde(default)]
    pub threshold: Option<Scalar>,
    #[serde(default)]
    pub currency: Option<Scalar>,
    #[serde(default)]
    pub operator: Option<Scalar>,
    #[serde(default)]
    pub notes: Option<Scalar>,
}

impl RuleRecord {
    fn unsupported_fields(&self) -> Vec<&'static str> {
        unsupported(&[
            ("rule_id", &self.rule_id),
            ("country", &self.country),
            ("condition_group", &self.condition_group),
            ("group_logic", &self.group_logic),
            ("metric_type", &self.metric_type),
            ("metric_scope", &self.metric_scope),
            ("threshold", &self.threshold),
            ("currency", &self.currency),
            ("operator", &self.operator),
            ("notes", &self.notes),
        ])
    }
}

/// One row of the forms section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormRecord {
    #[serde(default)]
    pub country: Option<Scalar>,
    #[serde(default)]
    pub form_name: Option<Scalar>,
    #[serde(default)]
    pub form_type: Option<Scalar>,
    #[serde(default)]
    pub trigger: Option<Scalar>,
    #[serde(default)]
    pub notes: Option<Scalar>,
}

impl FormRecord {
    fn unsupported_fields(&self) -> Vec<&'static str> {
        unsupported(&[
            ("country", &self.country),
            ("form_name", &self.form_name),
            ("form_type", &self.form_type),
            ("trigger", &self.trigger),
            ("notes", &self.notes),
        ])
    }
}

/// A whole rule source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSourceDocument {
    #[serde(default)]
    pub master_file: Vec<RuleRecord>,
    #[serde(default)]
    pub local_file: Vec<RuleRecord>,
    #[serde(default)]
    pub cbcr: Vec<RuleRecord>,
    #[serde(default)]
    pub forms: Vec<FormRecord>,
}

impl RuleSourceDocument {
    fn section(&self, document: DocumentType) -> &[RuleRecord] {
        match document {
            DocumentType::MasterFile => &self.master_file,
            DocumentType::LocalFile => &self.local_file,
            DocumentType::Cbcr => &self.cbcr,
        }
    }
}

/// What went wrong with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Row skipped
    MalformedRule,
    /// Row kept; its condition will always evaluate UNKNOWN
    UnresolvedMetricScope,
    /// Row kept; label treated as OR
    UnrecognizedGroupLogic,
}

/// A structured load-time warning about one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDiagnostic {
    /// Source section, e.g. "master_file" or "forms"
    pub section: String,

    /// 1-based row number within the section
    pub row: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    pub kind: DiagnosticKind,
    pub message: String,
}

/// A parsed row before assembly.
struct ParsedRow {
    rule_id: String,
    country: String,
    group_id: String,
    logic: GroupLogic,
    condition: Condition,
}

/// The loaded, assembled rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleBook {
    rules: Vec<Rule>,
    forms: Vec<FormRule>,
    diagnostics: Vec<RuleDiagnostic>,
}

impl RuleBook {
    /// Parse a rule book from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, SourceError> {
        let document = parse_document(yaml, Format::Yaml, SourceKind::Rules)?;
        Ok(Self::from_document(document))
    }

    /// Parse a rule book from JSON.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let document = parse_document(json, Format::Json, SourceKind::Rules)?;
        Ok(Self::from_document(document))
    }

    /// Load a rule book from a YAML or JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let contents = read_source(path)?;
        let document = parse_document(&contents, Format::from_path(path), SourceKind::Rules)
            .map_err(|e| e.in_file(path))?;
        let book = Self::from_document(document);
        info!(
            path = %path.display(),
            rules = book.rules.len(),
            forms = book.forms.len(),
            diagnostics = book.diagnostics.len(),
            "Loaded rule source"
        );
        Ok(book)
    }

    /// Assemble rules from raw records.
    pub fn from_document(document: RuleSourceDocument) -> Self {
        let mut book = RuleBook::default();
        let mut index: HashMap<(DocumentType, String, String), usize> = HashMap::new();

        for doc_type in DocumentType::ALL {
            for (i, record) in document.section(doc_type).iter().enumerate() {
                let row = i + 1;
                let parsed = match book.parse_row(doc_type, row, record) {
                    Some(parsed) => parsed,
                    None => continue,
                };

                let key = (
                    doc_type,
                    parsed.country.trim().to_ascii_lowercase(),
                    parsed.rule_id.clone(),
                );
                let rule_idx = *index.entry(key).or_insert_with(|| {
                    book.rules.push(Rule {
                        id: parsed.rule_id.clone(),
                        country: parsed.country.clone(),
                        document: doc_type,
                        groups: Vec::new(),
                    });
                    book.rules.len() - 1
                });

                let rule = &mut book.rules[rule_idx];
                match rule.groups.iter_mut().find(|g| g.id == parsed.group_id) {
                    Some(group) => group.conditions.push(parsed.condition),
                    None => rule.groups.push(ConditionGroup {
                        id: parsed.group_id,
                        logic: parsed.logic,
                        conditions: vec![parsed.condition],
                    }),
                }
            }
        }

        for (i, record) in document.forms.iter().enumerate() {
            if let Some(form) = book.parse_form(i + 1, record) {
                book.forms.push(form);
            }
        }

        book
    }

    fn record(&mut self, diagnostic: RuleDiagnostic) {
        warn!(
            section = %diagnostic.section,
            row = diagnostic.row,
            rule_id = diagnostic.rule_id.as_deref().unwrap_or("-"),
            kind = ?diagnostic.kind,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    /// Validate one record. Returns `None` (after recording why) when the
    /// row must be skipped.
    fn parse_row(
        &mut self,
        document: DocumentType,
        row: usize,
        record: &RuleRecord,
    ) -> Option<ParsedRow> {
        let section = document.section();

        let invalid = record.unsupported_fields();
        if !invalid.is_empty() {
            self.record(RuleDiagnostic {
                section: section.to_string(),
                row,
                rule_id: text(&record.rule_id),
                kind: DiagnosticKind::MalformedRule,
                message: format!("Expected text or a number in: {}", invalid.join(", ")),
            });
            return None;
        }

        let (rule_id, country, metric_label, operator_label) = match (
            text(&record.rule_id),
            text(&record.country),
            text(&record.metric_type),
            text(&record.operator),
        ) {
            (Some(rule_id), Some(country), Some(metric), Some(operator)) => {
                (rule_id, country, metric, operator)
            }
            (rule_id, country, metric, operator) => {
                let missing: Vec<&str> = [
                    ("rule_id", rule_id.is_none()),
                    ("country", country.is_none()),
                    ("metric_type", metric.is_none()),
                    ("operator", operator.is_none()),
                ]
                .iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| *name)
                .collect();

                self.record(RuleDiagnostic {
                    section: section.to_string(),
                    row,
                    rule_id,
                    kind: DiagnosticKind::MalformedRule,
                    message: format!("Missing required field(s): {}", missing.join(", ")),
                });
                return None;
            }
        };

        let operator = match ComparisonOperator::from_symbol(&operator_label) {
            Some(op) => op,
            None => {
                self.record(RuleDiagnostic {
                    section: section.to_string(),
                    row,
                    rule_id: Some(rule_id),
                    kind: DiagnosticKind::MalformedRule,
                    message: format!("Unrecognized operator '{}'", operator_label),
                });
                return None;
            }
        };

        let metric = MetricType::from_label(&metric_label);
        let scope = MetricScope::from_label(&text(&record.metric_scope).unwrap_or_default());

        let threshold = match record.threshold.as_ref().and_then(Scalar::as_number) {
            Some(t) => t,
            None if metric.is_always() => 0.0,
            None => {
                self.record(RuleDiagnostic {
                    section: section.to_string(),
                    row,
                    rule_id: Some(rule_id),
                    kind: DiagnosticKind::MalformedRule,
                    message: "Missing or non-numeric threshold".to_string(),
                });
                return None;
            }
        };

        if !metric.is_always() && resolve_fact_ref(&metric, &scope).is_none() {
            self.record(RuleDiagnostic {
                section: section.to_string(),
                row,
                rule_id: Some(rule_id.clone()),
                kind: DiagnosticKind::UnresolvedMetricScope,
                message: format!(
                    "No fact mapping for metric '{}' with scope '{}'; condition will evaluate UNKNOWN",
                    metric, scope
                ),
            });
        }

        let logic = match text(&record.group_logic) {
            None => GroupLogic::Or,
            Some(label) => match GroupLogic::from_label(&label) {
                Some(logic) => logic,
                None => {
                    self.record(RuleDiagnostic {
                        section: section.to_string(),
                        row,
                        rule_id: Some(rule_id.clone()),
                        kind: DiagnosticKind::UnrecognizedGroupLogic,
                        message: format!("Unrecognized group logic '{}', using OR", label),
                    });
                    GroupLogic::Or
                }
            },
        };

        Some(ParsedRow {
            rule_id,
            country,
            group_id: text(&record.condition_group).unwrap_or_else(|| "1".to_string()),
            logic,
            condition: Condition {
                metric,
                scope,
                threshold,
                currency: text(&record.currency),
                operator,
                notes: text(&record.notes),
            },
        })
    }

    fn parse_form(&mut self, row: usize, record: &FormRecord) -> Option<FormRule> {
        let invalid = record.unsupported_fields();
        if !invalid.is_empty() {
            self.record(RuleDiagnostic {
                section: "forms".to_string(),
                row,
                rule_id: text(&record.form_name),
                kind: DiagnosticKind::MalformedRule,
                message: format!("Expected text or a number in: {}", invalid.join(", ")),
            });
            return None;
        }

        let country = text(&record.country);
        let form_name = text(&record.form_name);

        match (country, form_name) {
            (Some(country), Some(form_name)) => Some(FormRule {
                country,
                form_name,
                form_type: text(&record.form_type),
                trigger: FormTrigger::from_label(&text(&record.trigger).unwrap_or_default()),
                notes: text(&record.notes),
            }),
            (country, form_name) => {
                let mut missing = Vec::new();
                if country.is_none() {
                    missing.push("country");
                }
                if form_name.is_none() {
                    missing.push("form_name");
                }
                self.record(RuleDiagnostic {
                    section: "forms".to_string(),
                    row,
                    rule_id: form_name,
                    kind: DiagnosticKind::MalformedRule,
                    message: format!("Missing required field(s): {}", missing.join(", ")),
                });
                None
            }
        }
    }

    /// All assembled rules, in first-seen order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules for one country and document type.
    pub fn rules_for<'a>(
        &'a self,
        country: &'a str,
        document: DocumentType,
    ) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules
            .iter()
            .filter(move |r| r.document == document && r.applies_to(country))
    }

    pub fn forms(&self) -> &[FormRule] {
        &self.forms
    }

    /// Forms for one country.
    pub fn forms_for<'a>(&'a self, country: &'a str) -> impl Iterator<Item = &'a FormRule> + 'a {
        self.forms
            .iter()
            .filter(move |f| same_country(&f.country, country))
    }

    pub fn diagnostics(&self) -> &[RuleDiagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.forms.is_empty()
    }
}
