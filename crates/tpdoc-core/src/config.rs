//! Assessment configuration.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::GroupMetric;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// How a rule's condition groups are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupLogicMode {
    /// Any TRUE group triggers the rule; the group logic label is ignored.
    #[default]
    AnyGroup,
    /// Rules labelled AND require every group; rules labelled OR behave
    /// as in `AnyGroup`.
    Labelled,
}

impl fmt::Display for GroupLogicMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupLogicMode::AnyGroup => "any-group",
            GroupLogicMode::Labelled => "labelled",
        })
    }
}

/// Names of the group fact bag keys read for group-scope conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupFactKeys {
    pub revenue: String,
    pub employees: String,
    pub balance_sheet: String,
}

impl Default for GroupFactKeys {
    fn default() -> Self {
        Self {
            revenue: "Group Revenue (EUR)".to_string(),
            employees: "Group Employees".to_string(),
            balance_sheet: "Group Balance Sheet (EUR)".to_string(),
        }
    }
}

impl GroupFactKeys {
    pub fn key_for(&self, metric: GroupMetric) -> &str {
        match metric {
            GroupMetric::Revenue => &self.revenue,
            GroupMetric::Employees => &self.employees,
            GroupMetric::BalanceSheet => &self.balance_sheet,
        }
    }
}

/// Settings for one assessment run. Every field has a default, so an empty
/// file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssessmentConfig {
    pub group_logic: GroupLogicMode,
    pub group_fact_keys: GroupFactKeys,
}

impl AssessmentConfig {
    /// Parse configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Override the group logic mode.
    pub fn with_group_logic(mut self, mode: GroupLogicMode) -> Self {
        self.group_logic = mode;
        self
    }
}
