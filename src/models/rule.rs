//! Mapping rule model

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::Record;
use crate::schema::{COMPANY_NAME, IDENTIFIER_PREFIX, RULE_ID, normalize_column};

/// A company- and identifier-prefix-scoped set of destination-field templates
///
/// The rule file may hold several variants for the same
/// `(company_name, identifier_prefix)` pair; file order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    /// Rule id from the `No.` column, when the row carries one
    pub id: Option<u32>,
    /// Company the rule applies to
    pub company_name: String,
    /// Identifier prefix the rule applies to
    pub identifier_prefix: String,
    /// Destination field → template, in file column order
    pub fields: IndexMap<String, String>,
}

impl MappingRule {
    /// Create a rule without an id
    pub fn new(company_name: impl Into<String>, identifier_prefix: impl Into<String>) -> Self {
        Self {
            id: None,
            company_name: company_name.into(),
            identifier_prefix: identifier_prefix.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a destination field template (builder style)
    #[must_use]
    pub fn with_field(mut self, destination: impl Into<String>, template: impl Into<String>) -> Self {
        self.fields.insert(destination.into(), template.into());
        self
    }

    /// Split a rule-file row into identity and destination templates
    ///
    /// Returns `Err` with a reason when the id column holds a non-numeric value.
    pub fn from_row(row: &Record) -> std::result::Result<Self, String> {
        let mut rule = Self::new(
            row.get(COMPANY_NAME).cloned().unwrap_or_default(),
            row.get(IDENTIFIER_PREFIX).cloned().unwrap_or_default(),
        );

        for (column, value) in row {
            match normalize_column(column) {
                RULE_ID => {
                    let value = value.trim();
                    if !value.is_empty() {
                        let id = value
                            .parse::<u32>()
                            .map_err(|_| format!("id '{value}' is not a number"))?;
                        rule.id = Some(id);
                    }
                }
                COMPANY_NAME | IDENTIFIER_PREFIX => {}
                destination => {
                    rule.fields.insert(destination.to_string(), value.clone());
                }
            }
        }

        Ok(rule)
    }
}
