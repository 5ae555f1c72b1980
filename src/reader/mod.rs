//! Module for reading and writing delimited tables.
//!
//! Every table is read whole into memory and written whole from an in-memory
//! buffer; there is no streaming or partial update.

use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::error::util::{safe_read_to_string, safe_write};
use crate::models::Record;

/// Byte-order mark some producers put at the start of UTF-8 files
pub const BOM: char = '\u{feff}';

/// A header plus the rows keyed by it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names in file order
    pub headers: Vec<String>,
    /// Rows keyed by header name
    pub rows: Vec<Record>,
}

impl Table {
    /// Create an empty table with the given header
    pub fn with_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Whether the header contains `column`
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Number of data rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse delimited text into a [`Table`]; a leading BOM is stripped
pub fn parse_table(content: &str, delimiter: u8) -> Result<Table> {
    let content = content.strip_prefix(BOM).unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let fields = result?;
        let row: Record = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), fields.get(i).unwrap_or_default().to_string()))
            .collect();
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

/// Read a whole table from `path`
pub fn read_table(path: &Path, delimiter: u8, purpose: &str) -> Result<Table> {
    let content = safe_read_to_string(path, purpose)?;
    let table = parse_table(&content, delimiter)?;
    debug!(
        "Read {} rows x {} columns from {}",
        table.rows.len(),
        table.headers.len(),
        path.display()
    );
    Ok(table)
}

/// Read a table, or `None` when the file does not exist yet
pub fn read_table_if_exists(path: &Path, delimiter: u8, purpose: &str) -> Result<Option<Table>> {
    if !path.exists() {
        return Ok(None);
    }
    read_table(path, delimiter, purpose).map(Some)
}

/// Render a table to bytes; cells absent from a row are written empty
pub fn render_table(table: &Table, delimiter: u8, bom: bool) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if bom {
        let mut encoded = [0u8; 4];
        buffer.extend_from_slice(BOM.encode_utf8(&mut encoded).as_bytes());
    }

    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(&mut buffer);
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(
                table
                    .headers
                    .iter()
                    .map(|h| row.get(h).map_or("", String::as_str)),
            )?;
        }
        writer.flush().map_err(csv::Error::from)?;
    }

    Ok(buffer)
}

/// Write a whole table to `path`
///
/// The table is rendered fully before the file is touched, so an encoding
/// failure leaves the previous file content in place.
pub fn write_table(path: &Path, table: &Table, delimiter: u8, bom: bool, purpose: &str) -> Result<()> {
    let buffer = render_table(table, delimiter, bom)?;
    safe_write(path, &buffer, purpose)?;
    debug!("Wrote {} rows to {}", table.rows.len(), path.display());
    Ok(())
}
