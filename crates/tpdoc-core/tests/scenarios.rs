//! End-to-end assessment scenarios for German and French rule sets.

use tpdoc_core::rules::{MetricScope, MetricType, RptCategory};
use tpdoc_core::{
    assess, assess_with_config, AssessmentConfig, Confidence, DiagnosticKind, DocumentStatus,
    EntityAssessment, FactSet, FactValue, GroupLogicMode, RuleBook, RuleStatus,
};

const GERMANY: &str = r#"
master_file:
  - rule_id: MF-DE-1
    country: Germany
    condition_group: 1
    group_logic: OR
    metric_type: Revenue
    metric_scope: Group (Consolidated)
    threshold: 750000000
    currency: EUR
    operator: ">="
  - rule_id: MF-DE-1
    country: Germany
    condition_group: 2
    group_logic: OR
    metric_type: Revenue
    metric_scope: Local Entity
    threshold: 100000000
    currency: EUR
    operator: ">="
local_file:
  - rule_id: LF-DE-1
    country: Germany
    condition_group: 1
    group_logic: OR
    metric_type: RPTs
    metric_scope: Transaction (Goods)
    threshold: 6,000,000
    currency: EUR
    operator: ">"
  - rule_id: LF-DE-1
    country: Germany
    condition_group: 1
    group_logic: OR
    metric_type: RPTs
    metric_scope: Transaction (Other)
    threshold: 600000
    currency: EUR
    operator: ">"
cbcr:
  - rule_id: CBCR-DE-1
    country: Germany
    condition_group: 1
    metric_type: Revenue
    metric_scope: Group (Consolidated)
    threshold: 750000000
    currency: EUR
    operator: ">="
forms:
  - country: Germany
    form_name: CbCR Notification
    form_type: Notification
    trigger: If CbCR Required
  - country: Germany
    form_name: TP Documentation Request Readiness
    trigger: If MF or LF Required
"#;

fn germany(group_revenue: &str, local_revenue: &str, goods: &str, other: &str) -> EntityAssessment {
    let facts = FactSet::from_yaml(&format!(
        r#"
client:
  name: Example Group
  fiscal_year_end: "31.12.2025"
group:
  Group Revenue (EUR): {group_revenue}
entities:
  - country: Germany
    entity_name: Example GmbH
    local_revenue: {local_revenue}
    rpts_goods: {goods}
    rpts_other: {other}
"#
    ))
    .unwrap();
    let book = RuleBook::from_yaml(GERMANY).unwrap();
    assert!(book.diagnostics().is_empty());

    let mut report = assess(&book, &facts);
    report.entities.remove(0)
}

fn gap_keys(entity: &EntityAssessment) -> Vec<(MetricType, MetricScope)> {
    entity
        .data_gaps
        .iter()
        .map(|g| (g.metric.clone(), g.scope.clone()))
        .collect()
}

#[test]
fn scenario_a_group_revenue_triggers_master_file() {
    let entity = germany("850000000", "'?'", "~", "~");

    assert_eq!(entity.master_file.status, DocumentStatus::Required);
    assert_eq!(entity.master_file.confidence, Confidence::High);
    assert_eq!(entity.master_file.rules[0].rule_id, "MF-DE-1");
    assert_eq!(entity.master_file.rules[0].groups.len(), 2);
    assert_eq!(entity.master_file.rules[0].status, RuleStatus::Required);
}

#[test]
fn scenario_b_all_unknown_is_likely_required() {
    let entity = germany("'?'", "'?'", "~", "~");

    assert_eq!(entity.master_file.status, DocumentStatus::LikelyRequired);
    assert_eq!(entity.master_file.confidence, Confidence::Low);

    let gaps = gap_keys(&entity);
    assert!(gaps.contains(&(MetricType::Revenue, MetricScope::Group)));
    assert!(gaps.contains(&(MetricType::Revenue, MetricScope::LocalEntity)));
}

#[test]
fn scenario_c_below_thresholds_is_not_required() {
    let entity = germany("500000000", "50000000", "1000000", "100000");

    assert_eq!(entity.master_file.status, DocumentStatus::NotRequired);
    assert_eq!(entity.master_file.confidence, Confidence::High);
    assert_eq!(entity.local_file.status, DocumentStatus::NotRequired);
    assert_eq!(entity.cbcr.status, DocumentStatus::NotRequired);
    assert!(entity.data_gaps.is_empty());
}

#[test]
fn scenario_d_goods_transactions_trigger_local_file() {
    let entity = germany("500000000", "50000000", "7000000", "unknown");

    assert_eq!(entity.local_file.status, DocumentStatus::Required);
    assert_eq!(entity.local_file.confidence, Confidence::High);
    assert_eq!(
        gap_keys(&entity),
        vec![(
            MetricType::RelatedPartyTransactions,
            MetricScope::Transaction(RptCategory::Other)
        )]
    );
}

#[test]
fn data_gaps_are_deduplicated_across_documents() {
    // Group revenue feeds both MF-DE-1 and CBCR-DE-1
    let entity = germany("~", "~", "~", "~");

    assert_eq!(
        gap_keys(&entity),
        vec![
            (MetricType::Revenue, MetricScope::Group),
            (MetricType::Revenue, MetricScope::LocalEntity),
            (
                MetricType::RelatedPartyTransactions,
                MetricScope::Transaction(RptCategory::Goods)
            ),
            (
                MetricType::RelatedPartyTransactions,
                MetricScope::Transaction(RptCategory::Other)
            ),
        ]
    );
    assert_eq!(entity.cbcr.status, DocumentStatus::LikelyRequired);
}

#[test]
fn forms_follow_document_verdicts() {
    let entity = germany("850000000", "50000000", "1000000", "100000");

    let cbcr_form = &entity.forms[0];
    assert_eq!(cbcr_form.form_name, "CbCR Notification");
    assert_eq!(cbcr_form.status, DocumentStatus::Required);

    let readiness = &entity.forms[1];
    assert_eq!(readiness.status, DocumentStatus::Required);
    assert_eq!(readiness.rationale, "Master File is REQUIRED");
}

const FRANCE: &str = r#"
local_file:
  - { rule_id: LF-FR-1, country: France, condition_group: 1, group_logic: AND, metric_type: Revenue, metric_scope: Local Entity, threshold: 50000000, operator: ">=" }
  - { rule_id: LF-FR-1, country: France, condition_group: 2, group_logic: AND, metric_type: RPTs, metric_scope: Transaction (All), threshold: 1000000, operator: ">" }
  - { rule_id: LF-FR-2, country: France, condition_group: 1, group_logic: OR, metric_type: Employees, metric_scope: Local Entity, threshold: 500, operator: ">=" }
  - { rule_id: LF-FR-2, country: France, condition_group: 2, group_logic: OR, metric_type: Balance Sheet, metric_scope: Local Entity, threshold: 400000000, operator: ">=" }
"#;

fn france(config: &AssessmentConfig, facts: &str) -> EntityAssessment {
    let book = RuleBook::from_yaml(FRANCE).unwrap();
    let facts = FactSet::from_yaml(facts).unwrap();
    assess_with_config(&book, &facts, config).entities.remove(0)
}

#[test]
fn labelled_mode_requires_every_group_of_and_rules() {
    let facts = r#"
entities:
  - { country: France, entity_name: Example SAS, local_revenue: 60000000, rpts_total: 500000, local_employees: 10, balance_sheet: 1000 }
"#;

    let any_group = france(&AssessmentConfig::default(), facts);
    assert_eq!(any_group.local_file.status, DocumentStatus::Required);

    let labelled = AssessmentConfig::default().with_group_logic(GroupLogicMode::Labelled);
    let entity = france(&labelled, facts);
    assert_eq!(entity.local_file.status, DocumentStatus::NotRequired);
    assert_eq!(entity.local_file.rules[0].status, RuleStatus::NotRequired);
    assert_eq!(entity.local_file.rules[1].status, RuleStatus::NotRequired);
}

#[test]
fn labelled_mode_leaves_or_rules_alone() {
    // LF-FR-2 group 1 fires; LF-FR-1 group 2 is unknown
    let facts = r#"
entities:
  - { country: France, entity_name: Example SAS, local_revenue: 60000000, local_employees: 800 }
"#;
    let labelled = AssessmentConfig::default().with_group_logic(GroupLogicMode::Labelled);
    let entity = france(&labelled, facts);

    assert_eq!(entity.local_file.rules[0].status, RuleStatus::Unknown);
    assert_eq!(entity.local_file.rules[1].status, RuleStatus::Required);
    assert_eq!(entity.local_file.status, DocumentStatus::Required);
}

#[test]
fn mixed_false_and_unknown_groups_are_not_required() {
    let facts = r#"
entities:
  - { country: France, entity_name: Example SAS, local_revenue: 10000000, local_employees: 20 }
"#;
    let entity = france(&AssessmentConfig::default(), facts);

    // LF-FR-1: group 1 FALSE, group 2 UNKNOWN
    assert_eq!(entity.local_file.rules[0].status, RuleStatus::NotRequired);
    assert_eq!(entity.local_file.rules[0].confidence, Confidence::High);
}

#[test]
fn malformed_rows_are_skipped_without_aborting() {
    let rules = r#"
master_file:
  - { rule_id: MF-IT-1, country: Italy, condition_group: 1, metric_type: Revenue, metric_scope: Group (Consolidated), threshold: 750000000, operator: ">=" }
  - { rule_id: MF-IT-1, country: Italy, condition_group: 1, metric_type: Revenue, metric_scope: Local Entity, threshold: lots, operator: ">=" }
  - { rule_id: MF-IT-2, country: Italy, condition_group: 1, metric_type: Revenue, metric_scope: Local Entity, threshold: 1, operator: "~" }
  - { country: Italy, metric_type: Revenue, metric_scope: Local Entity, threshold: 1, operator: ">=" }
  - { rule_id: MF-IT-3, country: Italy, condition_group: 1, metric_type: RPTs, metric_scope: Group (Consolidated), threshold: 1, operator: ">=" }
"#;
    let facts = r#"
group:
  Group Revenue (EUR): 100
entities:
  - { country: Italy, entity_name: Example SpA }
"#;
    let book = RuleBook::from_yaml(rules).unwrap();
    let kinds: Vec<_> = book.diagnostics().iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::MalformedRule,
            DiagnosticKind::MalformedRule,
            DiagnosticKind::MalformedRule,
            DiagnosticKind::UnresolvedMetricScope,
        ]
    );

    let report = assess(&book, &FactSet::from_yaml(facts).unwrap());
    let entity = &report.entities[0];

    // MF-IT-1 keeps its valid row; MF-IT-3 is kept but can never resolve
    assert_eq!(entity.master_file.rules.len(), 2);
    assert_eq!(entity.master_file.rules[0].status, RuleStatus::NotRequired);
    assert_eq!(entity.master_file.rules[1].status, RuleStatus::Unknown);
    assert_eq!(entity.master_file.status, DocumentStatus::LikelyRequired);
    assert!(entity.data_gaps.is_empty());
    assert_eq!(report.diagnostics.len(), 4);
}

#[test]
fn non_scalar_cells_skip_only_their_row() {
    let rules = r#"
master_file:
  - { rule_id: MF-DE-1, country: Germany, condition_group: 1, metric_type: Revenue, metric_scope: Group (Consolidated), threshold: 750000000, operator: ">=" }
  - { rule_id: MF-DE-2, country: Germany, condition_group: 1, metric_type: Revenue, metric_scope: Local Entity, threshold: true, operator: ">=" }
"#;
    let facts = r#"
group:
  Group Revenue (EUR): 850000000
entities:
  - { country: Germany, entity_name: Example GmbH, local_revenue: 1 }
  - { country: Germany, entity_name: Example Services GmbH, rpts_goods: true, local_revenue: [1, 2] }
"#;
    let book = RuleBook::from_yaml(rules).unwrap();
    assert_eq!(book.rules().len(), 1);
    assert_eq!(book.diagnostics().len(), 1);
    assert_eq!(book.diagnostics()[0].kind, DiagnosticKind::MalformedRule);
    assert!(book.diagnostics()[0].message.contains("threshold"));

    let facts = FactSet::from_yaml(facts).unwrap();
    assert_eq!(facts.entities[1].rpts_goods, FactValue::Unknown);
    assert_eq!(facts.entities[1].local_revenue, FactValue::Unknown);

    let report = assess(&book, &facts);
    assert_eq!(report.entities.len(), 2);
    for entity in &report.entities {
        assert_eq!(entity.master_file.status, DocumentStatus::Required);
    }
}

#[test]
fn country_without_rules_is_not_applicable() {
    let book = RuleBook::from_yaml(GERMANY).unwrap();
    let facts = FactSet::from_yaml(
        r#"
entities:
  - { country: Japan, entity_name: Example KK, local_revenue: 1 }
"#,
    )
    .unwrap();

    let report = assess(&book, &facts);
    for verdict in report.entities[0].verdicts() {
        assert_eq!(verdict.status, DocumentStatus::NotRequired);
        assert_eq!(verdict.confidence, Confidence::NotApplicable);
    }
    assert!(report.entities[0].forms.is_empty());
}
