use std::path::Path;

use circus_mapper::reader::write_table;
use circus_mapper::schema::{COMPANY_NAME, IDENTIFIER_PREFIX, MANAGEMENT_NUMBER, RULE_FILE_COLUMNS, RULE_ID};
use circus_mapper::{CircusConfig, Record, Table};
use tempfile::TempDir;

pub const COMPANY: &str = "テスト商事";

/// Scratch directory with a configuration rooted inside it
pub fn workspace() -> (TempDir, CircusConfig) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = CircusConfig::rooted_at(dir.path());
    (dir, config)
}

/// A rule-file row with every column present; `templates` fill the named destinations
pub fn rule_row(id: u32, company: &str, prefix: &str, templates: &[(&str, &str)]) -> Record {
    let mut row: Record = RULE_FILE_COLUMNS
        .iter()
        .map(|c| ((*c).to_string(), String::new()))
        .collect();
    row.insert(RULE_ID.to_string(), id.to_string());
    row.insert(COMPANY_NAME.to_string(), company.to_string());
    row.insert(IDENTIFIER_PREFIX.to_string(), prefix.to_string());
    for (destination, template) in templates {
        row.insert((*destination).to_string(), (*template).to_string());
    }
    row
}

/// Write `rows` as the rule file of `config`
pub fn write_rules(config: &CircusConfig, rows: Vec<Record>) {
    let table = Table {
        headers: RULE_FILE_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
        rows,
    };
    write_table(&config.rule_path, &table, config.delimiter, config.rule_file_bom, "test rules")
        .expect("write rule file");
}

/// Company source table with three postings, two of them under identifier A1
pub fn company_table() -> Table {
    let headers = [MANAGEMENT_NUMBER, "職種", "勤務地", "給与"];
    let rows = [
        ["A1-001", "営業", "東京都渋谷区神南1-1", "月給25万円"],
        ["A1-002", "事務", "大阪府大阪市北区梅田3-1", "時給1200円"],
        ["B2-001", "製造", "北海道虻田郡倶知安町北1条", "日給9000円"],
    ];
    Table {
        headers: headers.iter().map(|h| (*h).to_string()).collect(),
        rows: rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .zip(row.iter())
                    .map(|(h, v)| ((*h).to_string(), (*v).to_string()))
                    .collect()
            })
            .collect(),
    }
}

/// Write the standard company table under the data dir of `config`
pub fn write_company_table(config: &CircusConfig) {
    let path = config.company_table_path(COMPANY);
    write_table(&path, &company_table(), config.delimiter, config.company_table_bom, "test source")
        .expect("write company table");
}

/// Raw bytes of a file, for byte-for-byte comparisons
pub fn file_bytes(path: &Path) -> Vec<u8> {
    std::fs::read(path).expect("read file")
}
