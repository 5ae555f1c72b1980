//! Building company source tables from pasted spreadsheet text.
//!
//! Pasted text is tab-delimited. Every record starts on a line beginning with
//! `\`; any other line continues the previous record (cells copied out of a
//! spreadsheet can contain line breaks). The first record is the header.

use std::path::PathBuf;

use log::{debug, info, warn};

use crate::config::CircusConfig;
use crate::error::Result;
use crate::locality::{UNKNOWN, extract_locality};
use crate::models::Record;
use crate::reader::{Table, write_table};
use crate::schema::{LOCALITY, MANAGEMENT_NUMBER};

/// Header keywords that suggest a work-location address column
const ADDRESS_KEYWORDS: [&str; 3] = ["勤務地", "住所", "派遣先"];

const RECORD_MARKER: char = '\\';

/// Split pasted text into records of exactly `width` cells, dropping the header record
#[must_use]
pub fn clean_pasted_rows(text: &str, width: usize) -> Vec<Vec<String>> {
    let mut records: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in text.trim().split('\n') {
        match line.trim_start().strip_prefix(RECORD_MARKER) {
            Some(rest) => {
                if !current.is_empty() {
                    records.push(std::mem::take(&mut current));
                }
                current = rest.trim().to_string();
            }
            None => {
                current.push(' ');
                current.push_str(line.trim());
            }
        }
    }
    if !current.is_empty() {
        records.push(current);
    }

    records
        .iter()
        .skip(1)
        .map(|record| {
            let mut cells: Vec<String> = record.trim().split('\t').map(str::to_string).collect();
            if cells.len() != width {
                debug!("Record has {} cells, expected {width}: {cells:?}", cells.len());
            }
            cells.resize(width, String::new());
            cells
        })
        .collect()
}

/// Parse pasted text into a table keyed by its first line
#[must_use]
pub fn parse_pasted(text: &str) -> Table {
    let first_line = text.trim().lines().next().unwrap_or_default();
    let headers: Vec<String> = first_line.split('\t').map(|h| h.trim().to_string()).collect();

    let rows = clean_pasted_rows(text, headers.len())
        .into_iter()
        .map(|cells| headers.iter().cloned().zip(cells).collect::<Record>())
        .collect();

    Table { headers, rows }
}

/// Headers that look like address columns, or every header when none do
#[must_use]
pub fn address_column_candidates(headers: &[String]) -> Vec<&str> {
    let candidates: Vec<&str> = headers
        .iter()
        .map(String::as_str)
        .filter(|h| ADDRESS_KEYWORDS.iter().any(|k| h.contains(k)))
        .collect();

    if candidates.is_empty() {
        headers.iter().map(String::as_str).collect()
    } else {
        candidates
    }
}

/// `管理番号` first, `勤務地市町村` last, everything else in between in original order
#[must_use]
pub fn company_table_headers(headers: &[String]) -> Vec<String> {
    std::iter::once(MANAGEMENT_NUMBER.to_string())
        .chain(
            headers
                .iter()
                .filter(|h| *h != MANAGEMENT_NUMBER && *h != LOCALITY)
                .cloned(),
        )
        .chain(std::iter::once(LOCALITY.to_string()))
        .collect()
}

/// Write the locality derived from `address_column` into every row
pub fn annotate_locality(table: &mut Table, address_column: &str) {
    if !table.has_column(address_column) {
        warn!("Address column '{address_column}' not in table; every locality will be {UNKNOWN}");
    }

    for row in &mut table.rows {
        let locality = match row.get(address_column).map(|a| a.trim()).filter(|a| !a.is_empty()) {
            Some(address) => extract_locality(address),
            None => UNKNOWN.to_string(),
        };
        debug!("{:?} -> {locality}", row.get(address_column));
        row.insert(LOCALITY.to_string(), locality);
    }

    table.headers = company_table_headers(&table.headers);
}

/// Save `table` as the source table of `company`, returning the written path
pub fn save_company_table(config: &CircusConfig, company: &str, table: &Table) -> Result<PathBuf> {
    let path = config.company_table_path(company);
    write_table(
        &path,
        table,
        config.delimiter,
        config.company_table_bom,
        "saving company table",
    )?;
    info!("Saved {} rows for {company} to {}", table.len(), path.display());
    Ok(path)
}
