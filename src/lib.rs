//! A Rust library for mapping company job tables into one canonical store
//! through per-company template rules, with rule caching and address
//! locality extraction.

pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod locality;
pub mod mapping;
pub mod models;
pub mod reader;
pub mod schema;
pub mod store;

// Re-export the most common types for easier use
// Core types
pub use config::CircusConfig;
pub use error::{CircusError, Result};
pub use models::{CanonicalRecord, MappingRule, Metadata, Record, SourceRecord};
pub use reader::Table;
pub use schema::SchemaReport;

// Mapping
pub use mapping::{MappingOutcome, MappingRequest, VariantPreview, preview_variants, run_mapping};
pub use mapping::{execute, preview, select};

// Persistence
pub use cache::MappingRuleCache;
pub use store::{CanonicalStore, CsvRecordStore, KeyFields, RecordStore, UpsertSummary};

// Address locality
pub use locality::extract_locality;
