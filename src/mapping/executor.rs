//! Applies one mapping rule to a company source table.

use log::{info, warn};
use rustc_hash::FxHashSet;

use crate::error::{CircusError, Result};
use crate::mapping::template::{self, Mode};
use crate::models::{CanonicalRecord, MappingRule, Record, SourceRecord};
use crate::reader::Table;
use crate::schema::{COMPANY_NAME, MANAGEMENT_NUMBER, validate_records};

/// Render every destination field of `rule` against `record`
fn apply_rule(rule: &MappingRule, record: &SourceRecord, mode: Mode) -> Result<Record> {
    let mut out = Record::with_capacity(rule.fields.len());
    for (destination, template) in &rule.fields {
        let value = template::resolve(template, record, mode)?;
        out.insert(destination.clone(), value);
    }
    Ok(out)
}

/// Render `rule` against one record in preview mode; never fails
#[must_use]
pub fn preview(rule: &MappingRule, record: &SourceRecord) -> Record {
    rule.fields
        .iter()
        .map(|(destination, template)| {
            let value = template::resolve(template, record, Mode::Preview).unwrap_or_default();
            (destination.clone(), value)
        })
        .collect()
}

/// Check every template of `rule` against the columns of `table`
pub fn validate_rule(rule: &MappingRule, table: &Table) -> Result<()> {
    let columns: FxHashSet<&str> = table.headers.iter().map(String::as_str).collect();
    for template in rule.fields.values().filter(|t| !t.is_empty()) {
        template::validate(template, &columns)?;
    }
    Ok(())
}

fn map_rows(
    company_name: &str,
    identifier: &str,
    rule: &MappingRule,
    source: &Table,
) -> Result<Vec<CanonicalRecord>> {
    if source.is_empty() {
        return Err(CircusError::EmptySource);
    }
    if !source.has_column(MANAGEMENT_NUMBER) {
        return Err(CircusError::MissingField {
            column: MANAGEMENT_NUMBER.to_string(),
        });
    }
    validate_rule(rule, source)?;

    let mut produced = Vec::new();
    for row in &source.rows {
        let row_identifier = row.get(MANAGEMENT_NUMBER).map_or("", String::as_str);
        if !row_identifier.contains(identifier) {
            continue;
        }

        let mut record = CanonicalRecord::with_capacity(rule.fields.len() + 2);
        record.insert(COMPANY_NAME.to_string(), company_name.to_string());
        record.insert(MANAGEMENT_NUMBER.to_string(), identifier.to_string());
        for (destination, value) in apply_rule(rule, row, Mode::Execute)? {
            if destination != COMPANY_NAME && destination != MANAGEMENT_NUMBER {
                record.insert(destination, value);
            }
        }
        produced.push(record);
    }

    validate_records(&produced, "mapped records")?;
    Ok(produced)
}

/// Apply `rule` to every row of `source` whose `管理番号` contains `identifier`
///
/// The identity columns of each produced record are set from the call, not
/// from the templates. Any failure aborts the whole application with
/// [`CircusError::Mapping`]; nothing is persisted here.
pub fn execute(
    company_name: &str,
    identifier: &str,
    rule: &MappingRule,
    source: &Table,
) -> Result<Vec<CanonicalRecord>> {
    let produced = map_rows(company_name, identifier, rule, source)
        .map_err(|e| CircusError::mapping(company_name, identifier, e))?;

    if produced.is_empty() {
        warn!(
            "No rows of the {company_name} table belong to identifier '{identifier}' ({} rows scanned)",
            source.len()
        );
    } else {
        info!(
            "Mapped {} of {} rows for {company_name} / {identifier}",
            produced.len(),
            source.len()
        );
    }
    Ok(produced)
}
