use circus_mapper::mapping::load_rules;
use circus_mapper::reader::BOM;
use circus_mapper::schema::{COMPANY_NAME, IDENTIFIER_PREFIX, RULE_ID};
use circus_mapper::{CircusError, MappingRuleCache};

use crate::utils::{COMPANY, rule_row, workspace, write_rules};

#[test]
fn test_load_normalizes_bom_id_column() -> circus_mapper::Result<()> {
    let (_dir, config) = workspace();
    // File BOM plus a BOM baked into the id header by an older writer
    std::fs::write(
        &config.rule_path,
        format!("{BOM}\u{feff}No.,企業名,管理番号の文字列,求人タイトル\n4,A社,A,{{職種}}\n,B社,B,固定\n"),
    )
    .expect("seed rule file");

    let mut cache = MappingRuleCache::new();
    cache.load(&config.rule_path, config.delimiter)?;
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("A社", "A").map(|r| r[RULE_ID].as_str()), Some("4"));
    assert_eq!(cache.get("B社", "B").map(|r| r[RULE_ID].as_str()), Some("5"));
    assert_eq!(cache.next_id(), 6);
    Ok(())
}

#[test]
fn test_save_then_reload_round_trips() -> circus_mapper::Result<()> {
    let (_dir, config) = workspace();
    let mut cache = MappingRuleCache::new();
    cache.register(COMPANY, "A1")?;
    cache.append_field(COMPANY, "A1", "求人タイトル", "{職種}募集")?;
    cache.append_field(COMPANY, "A1", "仕事内容", "1行目")?;
    cache.append_field(COMPANY, "A1", "仕事内容", "2行目")?;
    cache.register("別会社", "Z")?;
    cache.save(&config.rule_path, config.delimiter, config.rule_file_bom)?;

    let raw = std::fs::read_to_string(&config.rule_path).expect("rule file written");
    assert!(raw.starts_with(BOM));

    let mut reloaded = MappingRuleCache::new();
    reloaded.load(&config.rule_path, config.delimiter)?;
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.next_id(), 3);
    let row = reloaded.get(COMPANY, "A1").expect("entry survives");
    assert_eq!(row["仕事内容"], "1行目\n2行目");

    let rules = load_rules(&config.rule_path, config.delimiter)?;
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].id, Some(1));
    assert_eq!(rules[0].fields["求人タイトル"], "{職種}募集");
    assert!(!rules[0].fields.contains_key(COMPANY_NAME));
    assert!(!rules[0].fields.contains_key(IDENTIFIER_PREFIX));
    Ok(())
}

#[test]
fn test_cache_keeps_rows_written_by_the_rule_helpers() -> circus_mapper::Result<()> {
    let (_dir, config) = workspace();
    write_rules(
        &config,
        vec![
            rule_row(2, COMPANY, "A1", &[("求人タイトル", "{職種}")]),
            rule_row(9, COMPANY, "B2", &[]),
        ],
    );

    let mut cache = MappingRuleCache::new();
    cache.load(&config.rule_path, config.delimiter)?;
    let id = cache.register(COMPANY, "C3")?;
    assert_eq!(id, 10);
    assert_eq!(cache.register(COMPANY, "A1")?, 2);
    Ok(())
}

#[test]
fn test_non_numeric_id_is_rejected() {
    let (_dir, config) = workspace();
    std::fs::write(&config.rule_path, "No.,企業名,管理番号の文字列\nabc,A社,A\n").expect("seed rule file");

    let mut cache = MappingRuleCache::new();
    assert!(matches!(
        cache.load(&config.rule_path, config.delimiter),
        Err(CircusError::MalformedRule { row: 1, .. })
    ));

    let err = load_rules(&config.rule_path, config.delimiter).unwrap_err();
    assert!(matches!(err.root(), CircusError::MalformedRule { row: 1, .. }));
}

#[test]
fn test_missing_rule_file_gives_empty_cache() -> circus_mapper::Result<()> {
    let (_dir, config) = workspace();
    let mut cache = MappingRuleCache::new();
    cache.load(&config.rule_path, config.delimiter)?;
    assert!(cache.is_empty());
    assert_eq!(cache.next_id(), 1);
    Ok(())
}

#[test]
fn test_largest_id_is_rejected_without_panicking() {
    let (_dir, config) = workspace();
    std::fs::write(&config.rule_path, "No.,企業名,管理番号の文字列\n3,A社,A\n4294967295,B社,B\n").expect("seed rule file");

    let mut cache = MappingRuleCache::new();
    let err = cache.load(&config.rule_path, config.delimiter).unwrap_err();
    assert!(matches!(err, CircusError::MalformedRule { row: 2, .. }));
}

#[test]
fn test_legacy_id_column_never_reaches_the_file() -> circus_mapper::Result<()> {
    let (_dir, config) = workspace();
    let mut row = rule_row(0, COMPANY, "A1", &[("求人タイトル", "{職種}")]);
    row.shift_remove(RULE_ID);
    row.insert("\u{feff}No.".to_string(), "1".to_string());

    let mut cache = MappingRuleCache::new();
    cache.upsert_entry(COMPANY, "A1", row)?;
    cache.save(&config.rule_path, config.delimiter, config.rule_file_bom)?;

    let raw = std::fs::read_to_string(&config.rule_path).expect("rule file written");
    let header = raw.strip_prefix(BOM).unwrap_or(&raw).lines().next().unwrap_or_default();
    assert!(header.starts_with("No.,"));
    assert!(!header.contains('\u{feff}'));
    Ok(())
}
