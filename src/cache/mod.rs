//! Editable working set of mapping rules.
//!
//! Entries are keyed by the rule id (`No.`) and kept in insertion order. The
//! cache is loaded from and saved to the rule file explicitly; it does not
//! notice edits other processes make to that file in between.

use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::error::{CircusError, Result};
use crate::models::Record;
use crate::reader::{Table, read_table_if_exists, write_table};
use crate::schema::{
    COMPANY_NAME, IDENTIFIER_PREFIX, RULE_FILE_COLUMNS, RULE_ID, normalize_column,
    rule_destination_columns,
};

/// In-memory rule rows keyed by id
#[derive(Debug, Clone)]
pub struct MappingRuleCache {
    entries: IndexMap<u32, Record>,
    next_id: u32,
}

impl Default for MappingRuleCache {
    fn default() -> Self {
        Self::new()
    }
}

fn is_entry_for(row: &Record, company_name: &str, prefix: &str) -> bool {
    row.get(COMPANY_NAME).is_some_and(|c| c == company_name)
        && row.get(IDENTIFIER_PREFIX).is_some_and(|p| p == prefix)
}

impl MappingRuleCache {
    /// An empty cache whose first id is 1
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            next_id: 1,
        }
    }

    /// Number of cached rule rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id the next new entry will receive
    #[must_use]
    pub const fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Reset the cache and fill it from the rule file at `path`
    ///
    /// A missing file leaves the cache empty. Rows without an id get the next
    /// sequential one; the id counter always ends past the largest id seen.
    pub fn load(&mut self, path: &Path, delimiter: u8) -> Result<()> {
        self.entries.clear();
        self.next_id = 1;

        let Some(table) = read_table_if_exists(path, delimiter, "loading rule cache")? else {
            debug!("No rule file at {}, cache starts empty", path.display());
            return Ok(());
        };

        for (index, row) in table.rows.into_iter().enumerate() {
            let mut normalized: Record = row
                .into_iter()
                .map(|(column, value)| (normalize_column(&column).to_string(), value))
                .collect();

            let id = match normalized.get(RULE_ID).map(|v| v.trim()).filter(|v| !v.is_empty()) {
                Some(raw) => raw.parse::<u32>().map_err(|_| CircusError::MalformedRule {
                    row: index + 1,
                    reason: format!("id '{raw}' is not a number"),
                })?,
                None => self.next_id,
            };
            normalized.insert(RULE_ID.to_string(), id.to_string());

            let after = id.checked_add(1).ok_or_else(|| CircusError::MalformedRule {
                row: index + 1,
                reason: format!("id {id} leaves no room for further ids"),
            })?;
            if self.entries.insert(id, normalized).is_some() {
                warn!("Rule id {id} appears more than once in {}; keeping the last row", path.display());
            }
            self.next_id = self.next_id.max(after);
        }

        info!(
            "Loaded {} cached rules from {} (next id {})",
            self.entries.len(),
            path.display(),
            self.next_id
        );
        Ok(())
    }

    /// Id of the entry for `(company_name, prefix)`, if cached
    #[must_use]
    pub fn id_of(&self, company_name: &str, prefix: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(_, row)| is_entry_for(row, company_name, prefix))
            .map(|(id, _)| *id)
    }

    fn allocate(&mut self) -> Result<u32> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or(CircusError::IdExhausted { last: id })?;
        Ok(id)
    }

    /// Insert or wholesale-replace the entry for `(company_name, prefix)`
    ///
    /// The identity and id columns of the stored row are set from the call;
    /// a legacy BOM-prefixed id column in `row` is dropped.
    pub fn upsert_entry(&mut self, company_name: &str, prefix: &str, row: Record) -> Result<u32> {
        let id = match self.id_of(company_name, prefix) {
            Some(id) => id,
            None => self.allocate()?,
        };

        let mut row: Record = row
            .into_iter()
            .map(|(column, value)| (normalize_column(&column).to_string(), value))
            .collect();

        row.insert(RULE_ID.to_string(), id.to_string());
        row.insert(COMPANY_NAME.to_string(), company_name.to_string());
        row.insert(IDENTIFIER_PREFIX.to_string(), prefix.to_string());
        self.entries.insert(id, row);
        Ok(id)
    }

    /// Existing id for `(company_name, prefix)`, or a new blank entry with every rule column
    pub fn register(&mut self, company_name: &str, prefix: &str) -> Result<u32> {
        if let Some(id) = self.id_of(company_name, prefix) {
            return Ok(id);
        }
        let blank: Record = RULE_FILE_COLUMNS
            .iter()
            .map(|c| ((*c).to_string(), String::new()))
            .collect();
        self.upsert_entry(company_name, prefix, blank)
    }

    /// The cached row for `(company_name, prefix)`
    #[must_use]
    pub fn get(&self, company_name: &str, prefix: &str) -> Option<&Record> {
        self.entries
            .values()
            .find(|row| is_entry_for(row, company_name, prefix))
    }

    /// Every cached row in insertion order
    #[must_use]
    pub fn get_all(&self) -> Vec<&Record> {
        self.entries.values().collect()
    }

    fn entry_mut(&mut self, company_name: &str, prefix: &str) -> Result<&mut Record> {
        self.entries
            .values_mut()
            .find(|row| is_entry_for(row, company_name, prefix))
            .ok_or_else(|| CircusError::UnknownRule {
                company: company_name.to_string(),
                prefix: prefix.to_string(),
            })
    }

    /// Record a revision of one destination field
    ///
    /// The trimmed `text` is appended to any existing content on a new line
    /// rather than replacing it. Use [`Self::clear_field`] first to overwrite.
    pub fn append_field(
        &mut self,
        company_name: &str,
        prefix: &str,
        field: &str,
        text: &str,
    ) -> Result<String> {
        let field = normalize_column(field);
        if !rule_destination_columns().any(|c| c == field) {
            warn!("'{field}' is not a rule destination column; storing it as an extra column");
        }
        let row = self.entry_mut(company_name, prefix)?;
        let text = text.trim();
        let updated = match row.get(field).filter(|existing| !existing.is_empty()) {
            Some(existing) => format!("{existing}\n{text}"),
            None => text.to_string(),
        };
        row.insert(field.to_string(), updated.clone());
        Ok(updated)
    }

    /// Empty one destination field
    pub fn clear_field(&mut self, company_name: &str, prefix: &str, field: &str) -> Result<()> {
        let row = self.entry_mut(company_name, prefix)?;
        row.insert(field.to_string(), String::new());
        Ok(())
    }

    /// Rule-file table: the fixed columns first, then any extra columns in first-seen order
    #[must_use]
    pub fn to_table(&self) -> Table {
        let mut table = Table::with_headers(RULE_FILE_COLUMNS);
        for row in self.entries.values() {
            for column in row.keys() {
                if !table.has_column(column) {
                    table.headers.push(column.clone());
                }
            }
        }

        let mut ids: Vec<u32> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        table.rows = ids.iter().map(|id| self.entries[id].clone()).collect();
        table
    }

    /// Write the whole cache to the rule file at `path`
    pub fn save(&self, path: &Path, delimiter: u8, bom: bool) -> Result<()> {
        write_table(path, &self.to_table(), delimiter, bom, "saving rule cache")?;
        info!("Saved {} cached rules to {}", self.entries.len(), path.display());
        Ok(())
    }
}
