//! Prefecture + municipality extraction from free-text Japanese addresses.

use std::sync::LazyLock;

use regex::Regex;

/// Returned when no locality can be derived
pub const UNKNOWN: &str = "不明";

/// Prefectures in the order they are tried; no name is a prefix of another
pub const PREFECTURES: [&str; 47] = [
    "北海道", "青森県", "岩手県", "宮城県", "秋田県", "山形県", "福島県",
    "茨城県", "栃木県", "群馬県", "埼玉県", "千葉県", "東京都", "神奈川県",
    "新潟県", "富山県", "石川県", "福井県", "山梨県", "長野県", "岐阜県",
    "静岡県", "愛知県", "三重県", "滋賀県", "京都府", "大阪府", "兵庫県",
    "奈良県", "和歌山県", "鳥取県", "島根県", "岡山県", "広島県", "山口県",
    "徳島県", "香川県", "愛媛県", "高知県", "福岡県", "佐賀県", "長崎県",
    "熊本県", "大分県", "宮崎県", "鹿児島県", "沖縄県",
];

// Shortest leading run ending in a city/ward/town/village suffix.
static MUNICIPALITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?[市区町村])").expect("valid municipality pattern"));

// County (郡) followed by a town or village.
static COUNTY_TOWN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?郡.+?[町村])").expect("valid county pattern"));

// Block and lot markers; everything from the first one on is dropped.
static BLOCK_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[丁目番地]").expect("valid block pattern"));

fn municipality(remaining: &str) -> Option<&str> {
    if let Some(m) = MUNICIPALITY.captures(remaining).and_then(|c| c.get(1)) {
        return Some(m.as_str());
    }
    if let Some(m) = COUNTY_TOWN.captures(remaining).and_then(|c| c.get(1)) {
        return Some(m.as_str());
    }
    let cleaned = BLOCK_MARKER.split(remaining).next().unwrap_or_default();
    MUNICIPALITY
        .captures(cleaned)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Derive `"{prefecture} {municipality}"` from `address`
///
/// Returns [`UNKNOWN`] for an empty address or one that does not start with
/// a prefecture, and `"{prefecture} 不明"` when no municipality is found.
/// Line breaks are removed from the address before matching, so a
/// municipality split across lines is still recognized.
#[must_use]
pub fn extract_locality(address: &str) -> String {
    let address = address.replace(['\n', '\r'], "");
    if address.trim().is_empty() {
        return UNKNOWN.to_string();
    }

    let Some(prefecture) = PREFECTURES.iter().find(|p| address.starts_with(**p)) else {
        return UNKNOWN.to_string();
    };

    let remaining = address[prefecture.len()..].trim();
    match municipality(remaining) {
        Some(name) => format!("{prefecture} {name}"),
        None => format!("{prefecture} {UNKNOWN}"),
    }
}
