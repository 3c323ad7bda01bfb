//! JSON Schema validation for source documents.
//!
//! Rule and fact sources are validated against schema/rule-source.schema.json
//! and schema/fact-source.schema.json before they are deserialized. The
//! schemas check document shape only; row-level problems are left to the
//! rule loader so that one bad row never rejects a whole document.

use std::sync::OnceLock;
use thiserror::Error;

const RULE_SOURCE_SCHEMA_JSON: &str = include_str!("../../../schema/rule-source.schema.json");
const FACT_SOURCE_SCHEMA_JSON: &str = include_str!("../../../schema/fact-source.schema.json");

static RULE_SOURCE_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();
static FACT_SOURCE_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema loading.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

/// Which source document a value claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Rules,
    Facts,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Rules => "rule source",
            SourceKind::Facts => "fact source",
        }
    }
}

fn compile(schema_json: &str) -> Result<jsonschema::Validator, String> {
    let schema_value: serde_json::Value = match serde_json::from_str(schema_json) {
        Ok(v) => v,
        Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
    };

    match jsonschema::options().build(&schema_value) {
        Ok(v) => Ok(v),
        Err(e) => Err(format!("Failed to compile schema: {}", e)),
    }
}

/// Get or initialize the compiled validator for a source kind.
fn get_validator(kind: SourceKind) -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = match kind {
        SourceKind::Rules => RULE_SOURCE_SCHEMA.get_or_init(|| compile(RULE_SOURCE_SCHEMA_JSON)),
        SourceKind::Facts => FACT_SOURCE_SCHEMA.get_or_init(|| compile(FACT_SOURCE_SCHEMA_JSON)),
    };

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a source document against its schema.
///
/// Returns every violation as "message at /instance/path".
pub fn validate_source(kind: SourceKind, document: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator(kind).map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(document)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
