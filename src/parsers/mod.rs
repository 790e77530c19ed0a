//! Format parsers and the intermediate record they produce.
//!
//! Dispatch is by [`FileFormat`] only. Every parser is a pure function of
//! the file's bytes; [`parse_file`] never fails, a parser error becomes a
//! [`Payload::Failed`] record carrying the message.

pub mod delimited;
pub mod encoding;
pub mod pdf;
pub mod plain_text;
pub mod raster;
pub mod workbook;

use std::collections::BTreeMap;
use std::path::Path;

use bundle_insights_core::models::{FileFormat, Insights};
use bundle_insights_core::{InsightClassifier, Table, TableClassification, TableShape};
use serde::Serialize;
use serde_json::Value;

use crate::config::ParsingConfig;
use crate::error::ParseError;

/// Normalized output of one parser call for one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntermediateRecord {
    #[serde(rename = "type")]
    pub format: FileFormat,
    pub source: String,
    #[serde(flatten)]
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Table(TablePayload),
    Workbook(WorkbookPayload),
    Document(DocumentPayload),
    Text(TextPayload),
    Image(ImagePayload),
    Failed { error: String },
}

/// Row/column metadata, sample rows and insights of one classified table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
    pub sample_rows: Vec<BTreeMap<String, Value>>,
    pub shape: TableShape,
    pub skipped_units: usize,
    pub insights: Insights,
}

impl TableSummary {
    pub fn new(table: &Table, classification: TableClassification, sample_rows: usize) -> Self {
        Self {
            row_count: table.row_count(),
            column_count: table.column_count(),
            columns: table.columns().to_vec(),
            sample_rows: table.sample_rows(sample_rows),
            shape: classification.shape,
            skipped_units: classification.skipped.len(),
            insights: classification.insights,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePayload {
    #[serde(flatten)]
    pub summary: TableSummary,
    pub encoding: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbookPayload {
    pub sheets: Vec<SheetRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRecord {
    pub sheet: String,
    #[serde(flatten)]
    pub outcome: SheetOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SheetOutcome {
    Parsed(TableSummary),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPayload {
    pub page_count: usize,
    pub char_count: usize,
    pub text_sample: String,
    pub insights: Insights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPayload {
    pub char_count: usize,
    pub encoding: String,
    pub text_sample: String,
    pub insights: Insights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePayload {
    pub width: u32,
    pub height: u32,
    pub color_mode: String,
    pub format: Option<String>,
    pub possibly_chart: bool,
    pub insights: ImageInsight,
}

/// Fixed description attached to images; no content analysis is done.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInsight {
    pub description: String,
}

impl IntermediateRecord {
    pub fn error(&self) -> Option<&str> {
        match &self.payload {
            Payload::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Every insight structure carried by the record, in file order. A
    /// workbook contributes one per successfully parsed sheet.
    pub fn insights(&self) -> Vec<&Insights> {
        match &self.payload {
            Payload::Table(t) => vec![&t.summary.insights],
            Payload::Workbook(w) => w
                .sheets
                .iter()
                .filter_map(|s| match &s.outcome {
                    SheetOutcome::Parsed(summary) => Some(&summary.insights),
                    SheetOutcome::Failed { .. } => None,
                })
                .collect(),
            Payload::Document(d) => vec![&d.insights],
            Payload::Text(t) => vec![&t.insights],
            Payload::Image(_) | Payload::Failed { .. } => Vec::new(),
        }
    }
}

/// Read and parse one file. Failures are folded into the record.
pub fn parse_file(
    path: &Path,
    source: &str,
    format: FileFormat,
    classifier: &InsightClassifier,
    config: &ParsingConfig,
) -> IntermediateRecord {
    let result = std::fs::read(path)
        .map_err(ParseError::from)
        .and_then(|bytes| parse_bytes(&bytes, format, classifier, config));

    let payload = match result {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(file = source, format = %format, error = %e, "parse failed");
            Payload::Failed {
                error: e.to_string(),
            }
        }
    };

    IntermediateRecord {
        format,
        source: source.to_string(),
        payload,
    }
}

pub fn parse_bytes(
    bytes: &[u8],
    format: FileFormat,
    classifier: &InsightClassifier,
    config: &ParsingConfig,
) -> Result<Payload, ParseError> {
    match format {
        FileFormat::Csv => delimited::parse(bytes, classifier, config).map(Payload::Table),
        FileFormat::Excel => workbook::parse(bytes, classifier, config).map(Payload::Workbook),
        FileFormat::Pdf => pdf::parse(bytes, classifier, config).map(Payload::Document),
        FileFormat::Image => raster::parse(bytes, config).map(Payload::Image),
        FileFormat::Text => plain_text::parse(bytes, classifier, config).map(Payload::Text),
    }
}

/// First `max_chars` characters, with `...` appended when cut.
pub fn text_sample(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
