//! Rule selection and rule file loading.
//!
//! Rules stay in rule-file order; when several rules match, the first one
//! wins. No best-prefix ranking is applied.

use std::path::Path;

use log::{debug, info};

use crate::error::{CircusError, Result};
use crate::models::MappingRule;
use crate::reader::read_table;

/// Whether `rule` applies to `(company_name, identifier)`
///
/// An empty prefix never matches.
#[must_use]
pub fn matches(rule: &MappingRule, company_name: &str, identifier: &str) -> bool {
    !rule.identifier_prefix.is_empty()
        && rule.company_name == company_name
        && identifier.starts_with(rule.identifier_prefix.as_str())
}

/// The first rule matching `(company_name, identifier)`, if any
#[must_use]
pub fn select<'a>(
    rules: &'a [MappingRule],
    company_name: &str,
    identifier: &str,
) -> Option<&'a MappingRule> {
    rules
        .iter()
        .find(|rule| matches(rule, company_name, identifier))
}

/// Every rule matching `(company_name, identifier)`, in rule-set order
#[must_use]
pub fn matching_variants<'a>(
    rules: &'a [MappingRule],
    company_name: &str,
    identifier: &str,
) -> Vec<&'a MappingRule> {
    rules
        .iter()
        .filter(|rule| matches(rule, company_name, identifier))
        .collect()
}

/// Rule variants registered for exactly `(company_name, prefix)`
#[must_use]
pub fn variants_for<'a>(
    rules: &'a [MappingRule],
    company_name: &str,
    prefix: &str,
) -> Vec<&'a MappingRule> {
    rules
        .iter()
        .filter(|rule| rule.company_name == company_name && rule.identifier_prefix == prefix)
        .collect()
}

/// Pick variant `index` from a match set
pub fn choose<'a>(variants: &[&'a MappingRule], index: usize) -> Result<&'a MappingRule> {
    variants
        .get(index)
        .copied()
        .ok_or(CircusError::InvalidSelection {
            index,
            available: variants.len(),
        })
}

/// Load every rule variant from the rule file, preserving file order
pub fn load_rules(path: &Path, delimiter: u8) -> Result<Vec<MappingRule>> {
    let context = format!("rule file {}", path.display());
    let table = read_table(path, delimiter, "reading mapping rules")
        .map_err(|e| CircusError::mapping_in(context.as_str(), e))?;

    let rules = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            MappingRule::from_row(row).map_err(|reason| {
                CircusError::mapping_in(
                    context.as_str(),
                    CircusError::MalformedRule { row: i + 1, reason },
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Loaded {} mapping rules from {}", rules.len(), path.display());
    debug!(
        "Rule identities: {:?}",
        rules
            .iter()
            .map(|r| (r.id, r.company_name.as_str(), r.identifier_prefix.as_str()))
            .collect::<Vec<_>>()
    );
    Ok(rules)
}
