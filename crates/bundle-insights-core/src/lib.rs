//! # Bundle Insights Core
//!
//! Pure logic shared by the Bundle Insights ingestion pipeline: the insight
//! data model, keyword tables, tabular shape detection, free-text keyword
//! matching, and the archive-level aggregator.
//!
//! This crate performs no filesystem or archive I/O. Parsers in the
//! `bundle-insights` crate turn raw files into [`table::Table`]s or text and
//! hand them to [`classify::InsightClassifier`].

pub mod aggregate;
pub mod classify;
pub mod error;
pub mod keywords;
pub mod models;
pub mod table;
pub mod text;

pub use aggregate::Aggregator;
pub use classify::{ClassifierConfig, InsightClassifier, TableClassification, TableShape};
pub use error::ClassificationError;
pub use keywords::KeywordConfig;
pub use models::{
    Bucket, FileFormat, FragmentData, InsightData, InsightFragment, Insights, KeywordMatch,
    ParsedData, SourceFileRecord, SourcedEntry,
};
pub use table::Table;
