//! CSV parsing: decode, read into a [`Table`], classify.

use bundle_insights_core::{InsightClassifier, Table};

use super::encoding::decode_text;
use super::{TablePayload, TableSummary};
use crate::config::ParsingConfig;
use crate::error::ParseError;

pub fn parse(
    bytes: &[u8],
    classifier: &InsightClassifier,
    config: &ParsingConfig,
) -> Result<TablePayload, ParseError> {
    let decoded = decode_text(bytes);
    let table = read_table(&decoded.text)?;
    tracing::debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        encoding = decoded.encoding,
        "csv read"
    );
    let classification = classifier.classify_table(&table);

    Ok(TablePayload {
        summary: TableSummary::new(&table, classification, config.sample_rows),
        encoding: decoded.encoding.to_string(),
    })
}

/// Header row plus data rows. Short and long rows are kept as-is; quoted
/// fields may contain delimiters and newlines.
pub fn read_table(text: &str) -> Result<Table, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quote(b'"')
        .double_quote(true)
        .from_reader(text.as_bytes());

    let columns = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(columns, rows))
}
