//! Rule and fact sources.
//!
//! A source document is read as YAML or JSON (by file extension), validated
//! against its JSON Schema, then deserialized. Any failure here is fatal to
//! the run and carries the offending path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::facts::FactSet;
use crate::rules::RuleBook;
use crate::schema::{validate_source, SourceKind};

/// Errors that can occur while loading a source document.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {kind}: {}", errors.join("; "))]
    Schema { kind: &'static str, errors: Vec<String> },

    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<SourceError>,
    },
}

impl SourceError {
    /// Attach the file path to a parse or schema error.
    pub(crate) fn in_file(self, path: &Path) -> Self {
        match self {
            SourceError::NotFound { .. } | SourceError::Io { .. } | SourceError::InFile { .. } => {
                self
            }
            other => SourceError::InFile {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// The path of the source that failed, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            SourceError::NotFound { path }
            | SourceError::Io { path, .. }
            | SourceError::InFile { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Document encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` files are JSON, everything else is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Parse, validate and deserialize a source document from a string.
pub(crate) fn parse_document<T: DeserializeOwned>(
    contents: &str,
    format: Format,
    kind: SourceKind,
) -> Result<T, SourceError> {
    let value: serde_json::Value = match format {
        Format::Yaml => serde_yaml::from_str(contents)?,
        Format::Json => serde_json::from_str(contents)?,
    };

    // An empty YAML document is an empty object, not null
    let value = if value.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        value
    };

    validate_source(kind, &value).map_err(|errors| SourceError::Schema {
        kind: kind.name(),
        errors,
    })?;

    Ok(serde_json::from_value(value)?)
}

/// Read a source file, distinguishing a missing file from other I/O errors.
pub(crate) fn read_source(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            SourceError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            SourceError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Supplies rule records.
pub trait RuleSource {
    fn load_rules(&self) -> Result<RuleBook, SourceError>;
}

/// Supplies entity and group facts.
pub trait FactSource {
    fn load_facts(&self) -> Result<FactSet, SourceError>;
}

/// A YAML or JSON document on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleSource for FileSource {
    fn load_rules(&self) -> Result<RuleBook, SourceError> {
        RuleBook::from_file(&self.path)
    }
}

impl FactSource for FileSource {
    fn load_facts(&self) -> Result<FactSet, SourceError> {
        FactSet::from_file(&self.path)
    }
}

impl RuleSource for RuleBook {
    fn load_rules(&self) -> Result<RuleBook, SourceError> {
        Ok(self.clone())
    }
}

impl FactSource for FactSet {
    fn load_facts(&self) -> Result<FactSet, SourceError> {
        Ok(self.clone())
    }
}
