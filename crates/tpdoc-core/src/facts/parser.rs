//! Fact source parsing.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::GroupFactKeys;
use crate::rules::{EntityField, FactRef, RptCategory};
use crate::schema::SourceKind;
use crate::source::{parse_document, read_source, Format, SourceError};

use super::value::FactValue;

static NOT_PROVIDED: FactValue = FactValue::NotProvided;

const FISCAL_YEAR_END_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Client-level descriptive information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default)]
    pub name: Option<String>,

    /// Kept as written; see [`ClientInfo::fiscal_year_end_date`]
    #[serde(default)]
    pub fiscal_year_end: Option<String>,
}

impl ClientInfo {
    /// Parse the fiscal year end, trying ISO then common European formats.
    pub fn fiscal_year_end_date(&self) -> Option<NaiveDate> {
        let raw = self.fiscal_year_end.as_deref()?.trim();
        FISCAL_YEAR_END_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    }
}

/// Group-level facts keyed by metric name, e.g. "Group Revenue (EUR)".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupFacts(BTreeMap<String, FactValue>);

impl GroupFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FactValue) {
        self.0.insert(key.into(), value);
    }

    /// Look up a fact by exact key, falling back to a case-insensitive match.
    pub fn get(&self, key: &str) -> &FactValue {
        self.0
            .get(key)
            .or_else(|| {
                self.0
                    .iter()
                    .find(|(k, _)| k.trim().eq_ignore_ascii_case(key.trim()))
                    .map(|(_, v)| v)
            })
            .unwrap_or(&NOT_PROVIDED)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FactValue)> for GroupFacts {
    fn from_iter<I: IntoIterator<Item = (K, FactValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Financial facts for one legal entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityFacts {
    pub country: String,
    pub entity_name: String,

    #[serde(default)]
    pub local_revenue: FactValue,
    #[serde(default)]
    pub local_employees: FactValue,
    #[serde(default)]
    pub balance_sheet: FactValue,

    #[serde(default)]
    pub rpts_goods: FactValue,
    #[serde(default)]
    pub rpts_services: FactValue,
    #[serde(default)]
    pub rpts_financing: FactValue,
    #[serde(default)]
    pub rpts_ip: FactValue,
    #[serde(default)]
    pub rpts_other: FactValue,
    #[serde(default)]
    pub rpts_total: FactValue,
}

impl EntityFacts {
    /// An entity with every fact not provided.
    pub fn new(country: impl Into<String>, entity_name: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            entity_name: entity_name.into(),
            ..Default::default()
        }
    }

    pub fn field(&self, field: EntityField) -> &FactValue {
        match field {
            EntityField::Revenue => &self.local_revenue,
            EntityField::Employees => &self.local_employees,
            EntityField::BalanceSheet => &self.balance_sheet,
            EntityField::Rpt(category) => match category {
                RptCategory::Goods => &self.rpts_goods,
                RptCategory::Services => &self.rpts_services,
                RptCategory::Financing => &self.rpts_financing,
                RptCategory::IntellectualProperty => &self.rpts_ip,
                RptCategory::Other => &self.rpts_other,
                RptCategory::All => &self.rpts_total,
            },
        }
    }

    pub fn field_mut(&mut self, field: EntityField) -> &mut FactValue {
        match field {
            EntityField::Revenue => &mut self.local_revenue,
            EntityField::Employees => &mut self.local_employees,
            EntityField::BalanceSheet => &mut self.balance_sheet,
            EntityField::Rpt(category) => match category {
                RptCategory::Goods => &mut self.rpts_goods,
                RptCategory::Services => &mut self.rpts_services,
                RptCategory::Financing => &mut self.rpts_financing,
                RptCategory::IntellectualProperty => &mut self.rpts_ip,
                RptCategory::Other => &mut self.rpts_other,
                RptCategory::All => &mut self.rpts_total,
            },
        }
    }

    /// Builder-style setter used by tests and embedders.
    pub fn with(mut self, field: EntityField, value: FactValue) -> Self {
        *self.field_mut(field) = value;
        self
    }
}

/// The facts one condition can see: the shared group bag and one entity.
#[derive(Debug, Clone, Copy)]
pub struct FactView<'a> {
    pub group: &'a GroupFacts,
    pub entity: &'a EntityFacts,
}

impl<'a> FactView<'a> {
    pub fn new(group: &'a GroupFacts, entity: &'a EntityFacts) -> Self {
        Self { group, entity }
    }

    /// Read the fact behind a reference.
    pub fn lookup(&self, fact: FactRef, keys: &GroupFactKeys) -> &'a FactValue {
        match fact {
            FactRef::Group(metric) => self.group.get(keys.key_for(metric)),
            FactRef::Entity(field) => self.entity.field(field),
        }
    }
}

/// A whole fact source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactSet {
    #[serde(default)]
    pub client: ClientInfo,

    #[serde(default)]
    pub group: GroupFacts,

    #[serde(default)]
    pub entities: Vec<EntityFacts>,
}

impl FactSet {
    /// Parse facts from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, SourceError> {
        parse_document(yaml, Format::Yaml, SourceKind::Facts)
    }

    /// Parse facts from JSON.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        parse_document(json, Format::Json, SourceKind::Facts)
    }

    /// Load facts from a YAML or JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let contents = read_source(path)?;
        let facts: FactSet = parse_document(&contents, Format::from_path(path), SourceKind::Facts)
            .map_err(|e| e.in_file(path))?;
        info!(
            path = %path.display(),
            entities = facts.entities.len(),
            group_facts = facts.group.len(),
            "Loaded fact source"
        );
        Ok(facts)
    }
}
