//! Rule-driven mapping of company source tables into canonical records.
//!
//! - [`template`]: placeholder substitution
//! - [`selector`]: rule loading and variant selection
//! - [`executor`]: applying one rule to a source table

pub mod executor;
pub mod selector;
pub mod template;

use std::path::PathBuf;

use chrono::Local;
use log::{info, warn};
use serde::Serialize;

pub use executor::{execute, preview, validate_rule};
pub use selector::{choose, load_rules, matching_variants, select, variants_for};
pub use template::Mode;

use crate::config::CircusConfig;
use crate::error::{CircusError, Result};
use crate::models::{Metadata, Record};
use crate::reader::read_table;
use crate::schema::{META_MAPPED_AT, META_MAPPING_ID, META_RULE_NO};
use crate::store::{CsvRecordStore, KeyFields, RecordStore, UpsertSummary};

/// One mapping run: which records to map and with which rule variant
#[derive(Debug, Clone)]
pub struct MappingRequest {
    pub company: String,
    pub identifier: String,
    /// Zero-based index into the matching variants
    pub variant: usize,
    /// Source table override; defaults to the company table under the data dir
    pub source_path: Option<PathBuf>,
}

impl MappingRequest {
    pub fn new(company: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            identifier: identifier.into(),
            variant: 0,
            source_path: None,
        }
    }

    #[must_use]
    pub fn with_variant(mut self, variant: usize) -> Self {
        self.variant = variant;
        self
    }

    #[must_use]
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Value of the `マッピング識別` metadata column
    #[must_use]
    pub fn mapping_id(&self) -> String {
        format!("{}_{}", self.company, self.identifier)
    }
}

/// What a mapping run produced and how the store changed
#[derive(Debug, Clone, Serialize)]
pub struct MappingOutcome {
    /// 1-based variant number written to `ルールNo.`
    pub rule_no: usize,
    pub rule_id: Option<u32>,
    pub mapping_id: String,
    pub mapped_at: String,
    /// Canonical records produced by the rule
    pub produced: usize,
    pub store: UpsertSummary,
}

/// One rule variant rendered against a sample source row
#[derive(Debug, Clone, Serialize)]
pub struct VariantPreview {
    pub rule_no: usize,
    pub rule_id: Option<u32>,
    pub fields: Record,
}

fn mapped_at() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Map one company/identifier with a chosen rule variant and upsert the result
///
/// Nothing is written when mapping fails or no source row matches.
pub fn run_mapping(config: &CircusConfig, request: &MappingRequest) -> Result<MappingOutcome> {
    let rules = load_rules(&config.rule_path, config.delimiter)?;
    let variants = matching_variants(&rules, &request.company, &request.identifier);
    info!(
        "{} rule variants match {} / {}",
        variants.len(),
        request.company,
        request.identifier
    );
    let rule = choose(&variants, request.variant)?;

    let source_path = request
        .source_path
        .clone()
        .unwrap_or_else(|| config.company_table_path(&request.company));
    let source = read_table(&source_path, config.delimiter, "reading company table")
        .map_err(|e| CircusError::mapping(&request.company, &request.identifier, e))?;

    let records = execute(&request.company, &request.identifier, rule, &source)?;

    let rule_no = request.variant + 1;
    let mapping_id = request.mapping_id();
    let mapped_at = mapped_at();

    let store = if records.is_empty() {
        warn!("Nothing to save for {mapping_id}; store left untouched");
        UpsertSummary::default()
    } else {
        let metadata: Metadata = [
            (META_RULE_NO.to_string(), rule_no.to_string()),
            (META_MAPPING_ID.to_string(), mapping_id.clone()),
            (META_MAPPED_AT.to_string(), mapped_at.clone()),
        ]
        .into_iter()
        .collect();

        CsvRecordStore::new(&config.store_path, config.delimiter, config.store_bom).upsert_batch(
            &records,
            &KeyFields::default(),
            Some(&metadata),
        )?
    };

    Ok(MappingOutcome {
        rule_no,
        rule_id: rule.id,
        mapping_id,
        mapped_at,
        produced: records.len(),
        store,
    })
}

/// Render every variant registered for `(company, prefix)` against the first source row
///
/// Rendering uses preview semantics, so unresolved placeholders show as empty.
pub fn preview_variants(
    config: &CircusConfig,
    company: &str,
    prefix: &str,
    source_path: Option<PathBuf>,
) -> Result<Vec<VariantPreview>> {
    let rules = load_rules(&config.rule_path, config.delimiter)?;
    let path = source_path.unwrap_or_else(|| config.company_table_path(company));
    let source = read_table(&path, config.delimiter, "reading company table")
        .map_err(|e| CircusError::mapping(company, prefix, e))?;

    let sample = source
        .rows
        .first()
        .ok_or_else(|| CircusError::mapping(company, prefix, CircusError::EmptySource))?;

    Ok(variants_for(&rules, company, prefix)
        .into_iter()
        .enumerate()
        .map(|(index, rule)| VariantPreview {
            rule_no: index + 1,
            rule_id: rule.id,
            fields: preview(rule, sample),
        })
        .collect())
}
