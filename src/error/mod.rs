//! Error handling for the mapping engine and canonical store.

pub mod util;

use std::io;
use std::path::PathBuf;

/// Specialized error type for mapping and persistence operations
#[derive(Debug, thiserror::Error)]
pub enum CircusError {
    /// A template references a column the source record does not have
    #[error("source table has no column '{column}'")]
    MissingField {
        /// The placeholder name that could not be resolved
        column: String,
    },

    /// A template is not well-formed (unbalanced braces)
    #[error("malformed template '{template}': {reason}")]
    TemplateSyntax { template: String, reason: String },

    /// Any failure while applying a rule; `context` names the company and identifier
    /// (or the rule file) involved
    #[error("mapping failed for {context}: {source}")]
    Mapping {
        context: String,
        #[source]
        source: Box<CircusError>,
    },

    /// A source table has a header but no data rows
    #[error("source table has no rows")]
    EmptySource,

    /// No rule variant could be picked from the match set
    #[error("rule selection {index} is out of range ({available} variants available)")]
    InvalidSelection { index: usize, available: usize },

    /// A record batch or stored table lacks required columns
    #[error("{context}: missing required columns [{}]", missing.join(", "))]
    SchemaValidation {
        context: String,
        missing: Vec<String>,
    },

    /// The rule cache has no entry for the given identity
    #[error("no cached rule for {company} / {prefix}")]
    UnknownRule { company: String, prefix: String },

    /// A rule file row could not be interpreted
    #[error("malformed rule row {row}: {reason}")]
    MalformedRule { row: usize, reason: String },

    /// The upsert key is empty or names a column the store or batch lacks
    #[error("invalid upsert key: {reason}")]
    InvalidKey { reason: String },

    /// No further rule id can be allocated
    #[error("rule id space exhausted after {last}")]
    IdExhausted { last: u32 },

    /// Error opening, reading or writing a file
    #[error("IO error on {} ({purpose}): {source}", path.display())]
    Io {
        path: PathBuf,
        purpose: String,
        #[source]
        source: io::Error,
    },

    /// Error decoding or encoding delimited data
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CircusError {
    /// Wrap an error as a mapping failure for the given company and identifier
    pub fn mapping(company: &str, identifier: &str, source: CircusError) -> Self {
        Self::mapping_in(format!("{company} / {identifier}"), source)
    }

    /// Wrap an error as a mapping failure with a free-form context
    pub fn mapping_in(context: impl Into<String>, source: CircusError) -> Self {
        Self::Mapping {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Create a schema validation error
    pub fn schema(context: impl Into<String>, missing: Vec<String>) -> Self {
        Self::SchemaValidation {
            context: context.into(),
            missing,
        }
    }

    /// The innermost error, looking through mapping wrappers
    #[must_use]
    pub fn root(&self) -> &CircusError {
        match self {
            Self::Mapping { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type for mapping and store operations
pub type Result<T> = std::result::Result<T, CircusError>;
