use circus_mapper::schema::{COMPANY_NAME, MANAGEMENT_NUMBER, META_RULE_NO, REQUIRED_COLUMNS};
use circus_mapper::{CanonicalRecord, CircusError, CsvRecordStore, KeyFields, Metadata, RecordStore};

use crate::utils::{file_bytes, workspace};

fn canonical(company: &str, number: &str, title: &str) -> CanonicalRecord {
    let mut record: CanonicalRecord = REQUIRED_COLUMNS
        .iter()
        .map(|c| ((*c).to_string(), String::new()))
        .collect();
    record.insert(COMPANY_NAME.to_string(), company.to_string());
    record.insert(MANAGEMENT_NUMBER.to_string(), number.to_string());
    record.insert("求人タイトル".to_string(), title.to_string());
    record
}

#[test]
fn test_missing_store_is_created_with_required_header() -> circus_mapper::Result<()> {
    let (_dir, config) = workspace();
    let store = CsvRecordStore::new(&config.store_path, config.delimiter, config.store_bom);

    let summary = store.upsert_batch(&[canonical("A社", "A1", "営業")], &KeyFields::default(), None)?;
    assert_eq!(summary.inserted, 1);

    let written = std::fs::read_to_string(&config.store_path).expect("store written");
    let header = written.lines().next().unwrap_or_default();
    assert_eq!(header, REQUIRED_COLUMNS.join(","));
    Ok(())
}

#[test]
fn test_identical_batch_is_a_no_op() -> circus_mapper::Result<()> {
    let (_dir, config) = workspace();
    let store = CsvRecordStore::new(&config.store_path, config.delimiter, config.store_bom);
    let batch = [canonical("A社", "A1", "営業"), canonical("A社", "A2", "事務")];

    store.upsert_batch(&batch, &KeyFields::default(), None)?;
    let before = file_bytes(&config.store_path);

    let summary = store.upsert_batch(&batch, &KeyFields::default(), None)?;
    assert_eq!(summary.unchanged, 2);
    assert!(!summary.changed());
    assert_eq!(file_bytes(&config.store_path), before);
    Ok(())
}

#[test]
fn test_schema_failure_leaves_file_byte_for_byte() -> circus_mapper::Result<()> {
    let (_dir, config) = workspace();
    let store = CsvRecordStore::new(&config.store_path, config.delimiter, config.store_bom);
    store.upsert_batch(&[canonical("A社", "A1", "営業")], &KeyFields::default(), None)?;
    let before = file_bytes(&config.store_path);

    let mut broken = canonical("A社", "A2", "事務");
    broken.shift_remove("返戻金規定");
    broken.shift_remove("支払いサイト");

    let err = store
        .upsert_batch(&[canonical("A社", "A3", "製造"), broken], &KeyFields::default(), None)
        .unwrap_err();
    match err {
        CircusError::SchemaValidation { missing, .. } => {
            assert_eq!(missing, vec!["支払いサイト", "返戻金規定"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(file_bytes(&config.store_path), before);
    Ok(())
}

#[test]
fn test_store_missing_required_columns_is_rejected() {
    let (_dir, config) = workspace();
    std::fs::write(&config.store_path, "企業名,管理番号\nA社,A1\n").expect("seed store");
    let before = file_bytes(&config.store_path);

    let store = CsvRecordStore::new(&config.store_path, config.delimiter, config.store_bom);
    let err = store
        .upsert_batch(&[canonical("A社", "A1", "営業")], &KeyFields::default(), None)
        .unwrap_err();
    assert!(matches!(err, CircusError::SchemaValidation { .. }));
    assert_eq!(file_bytes(&config.store_path), before);
}

#[test]
fn test_replacement_and_extra_columns_survive_reload() -> circus_mapper::Result<()> {
    let (_dir, config) = workspace();
    let store = CsvRecordStore::new(&config.store_path, config.delimiter, config.store_bom);
    let metadata: Metadata = [(META_RULE_NO.to_string(), "3".to_string())].into_iter().collect();

    let mut tagged = canonical("A社", "A1", "営業");
    tagged.insert("社内メモ".to_string(), "要確認".to_string());
    store.upsert_batch(&[tagged, canonical("B社", "B1", "製造")], &KeyFields::default(), Some(&metadata))?;

    let summary = store.upsert_batch(&[canonical("A社", "A1", "営業（改）")], &KeyFields::default(), None)?;
    assert_eq!(summary.replaced, 1);

    let loaded = store.load()?;
    assert_eq!(loaded.len(), 2);
    assert!(loaded.headers().iter().any(|h| h == "社内メモ"));
    assert!(loaded.headers().iter().any(|h| h == META_RULE_NO));

    let replaced = loaded
        .rows()
        .iter()
        .find(|row| row[MANAGEMENT_NUMBER] == "A1")
        .expect("A1 row");
    assert_eq!(replaced["求人タイトル"], "営業（改）");
    assert_eq!(replaced.get("社内メモ").map(String::as_str).unwrap_or_default(), "");
    assert_eq!(replaced.get(META_RULE_NO).map(String::as_str).unwrap_or_default(), "");
    Ok(())
}

#[test]
fn test_misspelled_key_leaves_store_file_untouched() -> circus_mapper::Result<()> {
    let (_dir, config) = workspace();
    let store = CsvRecordStore::new(&config.store_path, config.delimiter, config.store_bom);
    let batch = [canonical("A社", "A1", "営業"), canonical("B社", "B1", "製造"), canonical("C社", "C1", "事務")];
    store.upsert_batch(&batch, &KeyFields::default(), None)?;
    let before = file_bytes(&config.store_path);

    let err = store
        .upsert_batch(&[canonical("D社", "D1", "受付")], &KeyFields::new(["管理番后"]), None)
        .unwrap_err();
    assert!(matches!(err, CircusError::InvalidKey { .. }));
    assert_eq!(file_bytes(&config.store_path), before);
    assert_eq!(store.load()?.len(), 3);
    Ok(())
}
