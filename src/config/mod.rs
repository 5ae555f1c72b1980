//! Configuration for the mapping tool.
//!
//! File paths are the only external configuration surface; the surrounding
//! tooling (or the CLI) overrides the defaults field by field.

use std::path::{Path, PathBuf};

/// Configuration for mapping runs and file layout
#[derive(Debug, Clone)]
pub struct CircusConfig {
    /// Canonical store file
    pub store_path: PathBuf,
    /// Mapping rule file
    pub rule_path: PathBuf,
    /// Directory holding one `{company}_db.csv` source table per company
    pub data_dir: PathBuf,
    /// Field delimiter for every table file
    pub delimiter: u8,
    /// Write a byte-order mark when saving the rule file
    pub rule_file_bom: bool,
    /// Write a byte-order mark when saving company tables
    pub company_table_bom: bool,
    /// Write a byte-order mark when saving the canonical store
    pub store_bom: bool,
}

impl Default for CircusConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("circus_db.csv"),
            rule_path: PathBuf::from("circus_db_mapping.csv"),
            data_dir: PathBuf::from("data"),
            delimiter: b',',
            rule_file_bom: true,
            company_table_bom: true,
            store_bom: false,
        }
    }
}

impl CircusConfig {
    /// Path of the source table for `company`
    #[must_use]
    pub fn company_table_path(&self, company: &str) -> PathBuf {
        self.data_dir.join(format!("{company}_db.csv"))
    }

    /// Same configuration rooted under `base`, for scratch runs
    #[must_use]
    pub fn rooted_at(base: &Path) -> Self {
        let defaults = Self::default();
        Self {
            store_path: base.join(&defaults.store_path),
            rule_path: base.join(&defaults.rule_path),
            data_dir: base.join(&defaults.data_dir),
            ..defaults
        }
    }
}
