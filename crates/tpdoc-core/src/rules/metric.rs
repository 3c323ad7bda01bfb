//! Metric vocabulary for threshold conditions.
//!
//! Rule sources describe what a condition measures with two free-text
//! columns, metric type and metric scope. Both are parsed once at load
//! time into the enums below; evaluation then goes through
//! [`resolve_fact_ref`], a single exhaustive table from (type, scope) to
//! the fact that must be read.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

lazy_static! {
    static ref ALWAYS_LABEL: Regex = Regex::new(r"(?i)^\s*always\s*$").unwrap();

    static ref RPT_LABEL: Regex = Regex::new(
        r"(?i)\b(rpts?|related[\s-]party|intercompany|transactions?)\b"
    ).unwrap();

    static ref REVENUE_LABEL: Regex = Regex::new(r"(?i)\b(revenue|turnover|sales)\b").unwrap();

    static ref EMPLOYEES_LABEL: Regex = Regex::new(r"(?i)\b(employees?|headcount|fte)\b").unwrap();

    static ref BALANCE_SHEET_LABEL: Regex = Regex::new(
        r"(?i)\b(balance[\s-]sheet|total\s+assets|assets)\b"
    ).unwrap();

    static ref GROUP_SCOPE: Regex = Regex::new(r"(?i)^\s*(group|consolidated)\b").unwrap();

    static ref LOCAL_SCOPE: Regex = Regex::new(r"(?i)^\s*(local|entity)\b").unwrap();

    /// "Transaction (Goods)", "Transactions - Services", "RPT (All)"
    static ref TRANSACTION_SCOPE: Regex = Regex::new(
        r"(?i)^\s*(?:transactions?|rpts?)\s*(?:\(\s*(?P<paren>[^)]*?)\s*\)|[-:]\s*(?P<dash>.+?))?\s*$"
    ).unwrap();
}

/// What a condition measures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricType {
    Revenue,
    Employees,
    BalanceSheet,
    /// Related-party transaction amount; the category comes from the scope
    RelatedPartyTransactions,
    /// Unconditional trigger, no fact is read
    Always,
    /// Label that matches no known metric
    Unrecognized(String),
}

impl MetricType {
    /// Parse a metric type label such as "Group Revenue" or "RPTs".
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();

        if ALWAYS_LABEL.is_match(trimmed) {
            MetricType::Always
        } else if RPT_LABEL.is_match(trimmed) {
            MetricType::RelatedPartyTransactions
        } else if REVENUE_LABEL.is_match(trimmed) {
            MetricType::Revenue
        } else if EMPLOYEES_LABEL.is_match(trimmed) {
            MetricType::Employees
        } else if BALANCE_SHEET_LABEL.is_match(trimmed) {
            MetricType::BalanceSheet
        } else {
            MetricType::Unrecognized(trimmed.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MetricType::Revenue => "Revenue",
            MetricType::Employees => "Employees",
            MetricType::BalanceSheet => "Balance Sheet",
            MetricType::RelatedPartyTransactions => "RPTs",
            MetricType::Always => "Always",
            MetricType::Unrecognized(label) => label,
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, MetricType::Always)
    }
}

/// Related-party transaction categories carried on entity records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RptCategory {
    Goods,
    Services,
    Financing,
    IntellectualProperty,
    Other,
    /// Total across all categories
    All,
}

impl RptCategory {
    /// Parse a category keyword. Returns `None` for anything unrecognized.
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.trim().to_lowercase();
        let category = if lower.contains("good") {
            RptCategory::Goods
        } else if lower.contains("service") {
            RptCategory::Services
        } else if lower.contains("financ") || lower.contains("loan") || lower.contains("interest") {
            RptCategory::Financing
        } else if lower == "ip"
            || lower.contains("intangible")
            || lower.contains("intellectual")
            || lower.contains("royalt")
        {
            RptCategory::IntellectualProperty
        } else if lower.contains("other") {
            RptCategory::Other
        } else if lower == "all" || lower.contains("total") {
            RptCategory::All
        } else {
            return None;
        };
        Some(category)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RptCategory::Goods => "Goods",
            RptCategory::Services => "Services",
            RptCategory::Financing => "Financing",
            RptCategory::IntellectualProperty => "IP",
            RptCategory::Other => "Other",
            RptCategory::All => "All",
        }
    }
}

/// At which level a metric is measured.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricScope {
    /// Consolidated group figure
    Group,
    LocalEntity,
    Transaction(RptCategory),
    Unrecognized(String),
}

impl MetricScope {
    /// Parse a scope label such as "Group (Consolidated)" or
    /// "Transaction (Goods)".
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();

        if let Some(caps) = TRANSACTION_SCOPE.captures(trimmed) {
            let category = caps
                .name("paren")
                .or_else(|| caps.name("dash"))
                .and_then(|m| RptCategory::from_label(m.as_str()));
            return match category {
                Some(category) => MetricScope::Transaction(category),
                None => MetricScope::Unrecognized(trimmed.to_string()),
            };
        }

        if GROUP_SCOPE.is_match(trimmed) {
            MetricScope::Group
        } else if LOCAL_SCOPE.is_match(trimmed) {
            MetricScope::LocalEntity
        } else {
            MetricScope::Unrecognized(trimmed.to_string())
        }
    }

    pub fn label(&self) -> String {
        match self {
            MetricScope::Group => "Group (Consolidated)".to_string(),
            MetricScope::LocalEntity => "Local Entity".to_string(),
            MetricScope::Transaction(category) => format!("Transaction ({})", category.label()),
            MetricScope::Unrecognized(label) => label.clone(),
        }
    }
}

/// A group-level fact read from the group fact bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupMetric {
    Revenue,
    Employees,
    BalanceSheet,
}

/// A field on an entity fact record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityField {
    Revenue,
    Employees,
    BalanceSheet,
    Rpt(RptCategory),
}

/// Where the value for a condition comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactRef {
    Group(GroupMetric),
    Entity(EntityField),
}

/// Map a (metric type, scope) pair to the fact it reads.
///
/// Returns `None` for combinations that have no fact behind them.
/// `Always` also returns `None`: it never reads a fact.
pub fn resolve_fact_ref(metric: &MetricType, scope: &MetricScope) -> Option<FactRef> {
    use MetricScope as S;
    use MetricType as M;

    match (metric, scope) {
        (M::Always, _) => None,
        (M::Unrecognized(_), _) => None,
        (_, S::Unrecognized(_)) => None,

        (M::Revenue, S::Group) => Some(FactRef::Group(GroupMetric::Revenue)),
        (M::Employees, S::Group) => Some(FactRef::Group(GroupMetric::Employees)),
        (M::BalanceSheet, S::Group) => Some(FactRef::Group(GroupMetric::BalanceSheet)),

        (M::Revenue, S::LocalEntity) => Some(FactRef::Entity(EntityField::Revenue)),
        (M::Employees, S::LocalEntity) => Some(FactRef::Entity(EntityField::Employees)),
        (M::BalanceSheet, S::LocalEntity) => Some(FactRef::Entity(EntityField::BalanceSheet)),

        (M::RelatedPartyTransactions, S::Transaction(category)) => {
            Some(FactRef::Entity(EntityField::Rpt(*category)))
        }
        (M::RelatedPartyTransactions, S::Group | S::LocalEntity) => None,
        (M::Revenue | M::Employees | M::BalanceSheet, S::Transaction(_)) => None,
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for MetricScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for MetricType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for MetricType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(MetricType::from_label(&label))
    }
}

impl Serialize for MetricScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MetricScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(MetricScope::from_label(&label))
    }
}
