//! Record and rule models shared by the mapping engine and the stores.
//!
//! Source tables have arbitrary per-company columns, so every record is an
//! ordered string-keyed map rather than a fixed struct.

pub mod rule;

pub use rule::MappingRule;

use indexmap::IndexMap;

/// Ordered column → value mapping
pub type Record = IndexMap<String, String>;

/// One row of a company-specific source table
pub type SourceRecord = Record;

/// One row of the canonical store; validated against [`crate::schema::REQUIRED_COLUMNS`]
pub type CanonicalRecord = Record;

/// Extra columns attached to canonical records during upsert
pub type Metadata = IndexMap<String, String>;

/// Build a record from `(column, value)` pairs
pub fn record<K, V, I>(pairs: I) -> Record
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
