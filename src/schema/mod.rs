//! Column vocabulary and required-schema checks for canonical records.
//!
//! The canonical store, the rule file and the mapping metadata all share the
//! column names defined here.

use itertools::Itertools;
use rustc_hash::FxHashSet;

use crate::error::{CircusError, Result};
use crate::models::Record;

/// Company name (identity column)
pub const COMPANY_NAME: &str = "企業名";
/// Management number (identity column)
pub const MANAGEMENT_NUMBER: &str = "管理番号";
/// Identifier prefix a rule applies to
pub const IDENTIFIER_PREFIX: &str = "管理番号の文字列";
/// Rule id column
pub const RULE_ID: &str = "No.";
/// Rule id column as written by producers that prefix a byte-order mark
pub const LEGACY_RULE_ID: &str = "\u{feff}No.";

/// 1-based index of the rule variant used for a mapping
pub const META_RULE_NO: &str = "ルールNo.";
/// Composite `{company}_{identifier}` mapping identity
pub const META_MAPPING_ID: &str = "マッピング識別";
/// Timestamp of the mapping run
pub const META_MAPPED_AT: &str = "マッピング日時";

/// Locality column added to company tables
pub const LOCALITY: &str = "勤務地市町村";

/// Every canonical record must carry these columns
pub const REQUIRED_COLUMNS: [&str; 22] = [
    COMPANY_NAME,
    MANAGEMENT_NUMBER,
    "求人タイトル",
    "募集予定人数",
    "仕事内容",
    "PRポイント",
    "勤務地住所",
    "勤務時間補足",
    "勤務地・勤務時間_資料",
    "年収例",
    "給与条件補足",
    "給与・賞与_資料",
    "休日休暇補足",
    "休日・休暇_資料",
    "福利厚生・諸手当",
    "福利厚生・諸手当_資料",
    "応募時必須条件",
    "求める人材_資料",
    "成果報酬金額",
    "支払いサイト",
    "返戻金規定",
    "手数料設定_資料",
];

/// Column order of the rule file
pub const RULE_FILE_COLUMNS: [&str; 24] = [
    RULE_ID,
    COMPANY_NAME,
    IDENTIFIER_PREFIX,
    "求人タイトル",
    "募集予定人数",
    "仕事内容",
    "PRポイント",
    "募集概要_資料",
    "勤務地住所",
    "勤務時間補足",
    "勤務地・勤務時間_資料",
    "年収例",
    "給与条件補足",
    "給与・賞与_資料",
    "休日休暇補足",
    "休日・休暇_資料",
    "福利厚生・諸手当",
    "福利厚生・諸手当_資料",
    "応募時必須条件",
    "求める人材_資料",
    "成果報酬金額",
    "支払いサイト",
    "返戻金規定",
    "手数料設定_資料",
];

/// Destination fields a rule row may carry (the rule file columns minus the rule identity)
pub fn rule_destination_columns() -> impl Iterator<Item = &'static str> {
    RULE_FILE_COLUMNS.iter().copied().skip(3)
}

/// Normalize a header name, mapping the BOM-prefixed id column to the canonical one
#[must_use]
pub fn normalize_column(name: &str) -> &str {
    if name == LEGACY_RULE_ID {
        RULE_ID
    } else {
        name
    }
}

/// Result of checking a set of columns against the required schema
#[derive(Debug, Default)]
pub struct SchemaReport {
    /// Whether every required column is present
    pub compatible: bool,
    /// Required columns that are absent, in schema order
    pub missing: Vec<String>,
}

/// Check `columns` against [`REQUIRED_COLUMNS`]
#[must_use]
pub fn check_columns<'a, I>(columns: I) -> SchemaReport
where
    I: IntoIterator<Item = &'a str>,
{
    let present: FxHashSet<&str> = columns.into_iter().collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !present.contains(**col))
        .map(|col| (*col).to_string())
        .collect();

    SchemaReport {
        compatible: missing.is_empty(),
        missing,
    }
}

/// Fail with [`CircusError::SchemaValidation`] unless every required column is present
pub fn validate_columns<'a, I>(columns: I, context: &str) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let report = check_columns(columns);
    if report.compatible {
        Ok(())
    } else {
        Err(CircusError::schema(context, report.missing))
    }
}

/// Validate a whole batch of records; the union of missing columns is reported
pub fn validate_records(records: &[Record], context: &str) -> Result<()> {
    let missing: Vec<String> = records
        .iter()
        .flat_map(|record| check_columns(record.keys().map(String::as_str)).missing)
        .unique()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CircusError::schema(context, missing))
    }
}
