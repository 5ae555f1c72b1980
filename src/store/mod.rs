//! Canonical record store with key-based, duplicate-safe upsert.
//!
//! Persistence sits behind [`RecordStore`]. The only backend,
//! [`CsvRecordStore`], reads the whole file, applies the batch in memory and
//! rewrites the whole file. Nothing locks the file between the read and the
//! write: two processes upserting at the same time can silently lose each
//! other's updates.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;
use smallvec::SmallVec;

use crate::error::{CircusError, Result};
use crate::models::{CanonicalRecord, Metadata};
use crate::reader::{Table, read_table_if_exists, write_table};
use crate::schema::{COMPANY_NAME, MANAGEMENT_NUMBER, REQUIRED_COLUMNS, validate_columns, validate_records};

/// Columns used to locate an existing row during upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFields(SmallVec<[String; 2]>);

impl KeyFields {
    /// Key over the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(columns.into_iter().map(Into::into).collect())
    }

    /// Iterate the key columns
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for KeyFields {
    fn default() -> Self {
        Self::new([COMPANY_NAME, MANAGEMENT_NUMBER])
    }
}

/// Outcome counts of one upsert batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertSummary {
    /// Records whose key was not present before
    pub inserted: usize,
    /// Records that replaced one or more existing rows
    pub replaced: usize,
    /// Records identical to what was already stored
    pub unchanged: usize,
}

impl UpsertSummary {
    /// Whether the batch changed any row
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.inserted + self.replaced > 0
    }
}

fn cell<'a>(record: &'a CanonicalRecord, column: &str) -> &'a str {
    record.get(column).map_or("", String::as_str)
}

/// Field-for-field equality over the union of both column sets; an absent cell equals ""
fn same_row(a: &CanonicalRecord, b: &CanonicalRecord) -> bool {
    a.keys()
        .chain(b.keys())
        .all(|column| cell(a, column) == cell(b, column))
}

/// The full ordered collection of canonical records held in one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalStore {
    headers: Vec<String>,
    rows: Vec<CanonicalRecord>,
}

impl Default for CanonicalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalStore {
    /// An empty store with the required header
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: REQUIRED_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Adopt a loaded table; its header must contain every required column
    pub fn from_table(table: Table) -> Result<Self> {
        validate_columns(table.headers.iter().map(String::as_str), "canonical store file")?;
        Ok(Self {
            headers: table.headers,
            rows: table.rows,
        })
    }

    /// Header order used when the store is written
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Stored rows in order
    #[must_use]
    pub fn rows(&self) -> &[CanonicalRecord] {
        &self.rows
    }

    /// Number of stored rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store holds no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Snapshot as a plain table
    #[must_use]
    pub fn to_table(&self) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.clone(),
        }
    }

    fn extend_headers(&mut self, record: &CanonicalRecord) {
        for column in record.keys() {
            if !self.headers.iter().any(|h| h == column) {
                self.headers.push(column.clone());
            }
        }
    }

    /// Every key column must exist in the stored header (once rows exist) and
    /// in every record after metadata is attached
    fn check_keys(
        &self,
        records: &[CanonicalRecord],
        keys: &KeyFields,
        metadata: Option<&Metadata>,
    ) -> Result<()> {
        if keys.iter().next().is_none() {
            return Err(CircusError::InvalidKey {
                reason: "no key columns given".to_string(),
            });
        }
        for key in keys.iter() {
            if !self.rows.is_empty() && !self.headers.iter().any(|h| h == key) {
                return Err(CircusError::InvalidKey {
                    reason: format!("store has no column '{key}'"),
                });
            }
            let in_metadata = metadata.is_some_and(|m| m.contains_key(key));
            if let Some(index) = records.iter().position(|r| !in_metadata && !r.contains_key(key)) {
                return Err(CircusError::InvalidKey {
                    reason: format!("record {} has no column '{key}'", index + 1),
                });
            }
        }
        Ok(())
    }

    /// Insert or replace `records` by `keys`
    ///
    /// Every metadata entry is attached to each record first (overriding
    /// same-named fields). A record whose key rows are all identical to it is
    /// skipped; otherwise every row sharing its key is removed and the record
    /// appended. Replacement is wholesale: fields of the old row are not
    /// carried over. The batch and the key columns are checked before any row
    /// is touched.
    pub fn upsert(
        &mut self,
        records: &[CanonicalRecord],
        keys: &KeyFields,
        metadata: Option<&Metadata>,
    ) -> Result<UpsertSummary> {
        validate_records(records, "records to save")?;
        self.check_keys(records, keys, metadata)?;

        let mut summary = UpsertSummary::default();
        for record in records {
            let mut row = record.clone();
            if let Some(metadata) = metadata {
                for (column, value) in metadata {
                    row.insert(column.clone(), value.clone());
                }
            }

            let matched: Vec<usize> = self
                .rows
                .iter()
                .enumerate()
                .filter(|(_, stored)| keys.iter().all(|key| cell(stored, key) == cell(&row, key)))
                .map(|(i, _)| i)
                .collect();

            if !matched.is_empty() && matched.iter().all(|&i| same_row(&self.rows[i], &row)) {
                debug!(
                    "Unchanged: {:?}",
                    keys.iter().map(|k| cell(&row, k)).collect::<Vec<_>>()
                );
                summary.unchanged += 1;
                continue;
            }

            if matched.is_empty() {
                summary.inserted += 1;
            } else {
                summary.replaced += 1;
                let mut index = 0;
                self.rows.retain(|_| {
                    let keep = !matched.contains(&index);
                    index += 1;
                    keep
                });
            }
            self.extend_headers(&row);
            self.rows.push(row);
        }

        Ok(summary)
    }
}

/// Persistence backend for the canonical store
pub trait RecordStore {
    /// Load the whole store
    fn load(&self) -> Result<CanonicalStore>;

    /// Replace the persisted store with `store`
    fn save(&self, store: &CanonicalStore) -> Result<()>;

    /// Read-modify-write one upsert batch
    ///
    /// The store is rewritten after every successful batch. Nothing is
    /// written when the batch fails validation or the existing store cannot
    /// be loaded.
    fn upsert_batch(
        &self,
        records: &[CanonicalRecord],
        keys: &KeyFields,
        metadata: Option<&Metadata>,
    ) -> Result<UpsertSummary> {
        validate_records(records, "records to save")?;

        let mut store = self.load()?;
        let before = store.len();
        let summary = store.upsert(records, keys, metadata)?;

        self.save(&store)?;
        info!(
            "Upserted {} records: {} inserted, {} replaced, {} unchanged ({} -> {} rows)",
            records.len(),
            summary.inserted,
            summary.replaced,
            summary.unchanged,
            before,
            store.len()
        );
        Ok(summary)
    }
}

/// Whole-file delimited-text backend
#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    path: PathBuf,
    delimiter: u8,
    bom: bool,
}

impl CsvRecordStore {
    /// Store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>, delimiter: u8, bom: bool) -> Self {
        Self {
            path: path.into(),
            delimiter,
            bom,
        }
    }

    /// Backing file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for CsvRecordStore {
    fn load(&self) -> Result<CanonicalStore> {
        match read_table_if_exists(&self.path, self.delimiter, "reading canonical store")? {
            Some(table) => CanonicalStore::from_table(table),
            None => {
                debug!("No store at {}, starting empty", self.path.display());
                Ok(CanonicalStore::new())
            }
        }
    }

    fn save(&self, store: &CanonicalStore) -> Result<()> {
        write_table(
            &self.path,
            &store.to_table(),
            self.delimiter,
            self.bom,
            "writing canonical store",
        )
    }
}
