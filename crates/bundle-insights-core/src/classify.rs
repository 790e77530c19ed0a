//! Table-shape detection and per-shape insight extraction.
//!
//! Audience exports arrive in a handful of layouts. [`detect_shape`] looks
//! only at the header row and picks exactly one [`TableShape`], first match
//! wins:
//!
//! 1. [`TableShape::InsightValue`]: `Insight` + `Insight Value` columns,
//!    one metric per row.
//! 2. [`TableShape::CategoryIndex`]: `Category` + `Category Index`.
//! 3. [`TableShape::Domain`]: `Domain Name`.
//! 4. [`TableShape::Fallback`]: anything else, treated as a wide table with
//!    one column per attribute.
//!
//! A table carrying both `Insight`/`Insight Value` and `Category Index` is
//! classified as Insight/Value only; the category-index rows are not read.
//!
//! Failures are contained per row (Insight/Value, category, domain) or per
//! column (fallback): the unit is skipped, recorded in
//! [`TableClassification::skipped`], logged, and the rest of the table is
//! still processed.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClassificationError;
use crate::keywords::{contains_any, first_match, KeywordConfig};
use crate::models::{
    Bucket, CategoryIndexData, DomainData, FragmentData, InsightFragment, InsightValueData,
    Insights, TopValuesData,
};
use crate::table::{infer_scalar, normalize_header, Table};
use crate::text::keyword_insights;

pub const MEDIA_PLATFORMS: &str = "media_platforms";
pub const SHOPPING_BEHAVIOR: &str = "shopping_behavior";
pub const VALUES_INTERESTS: &str = "values_interests";
pub const WEB_BEHAVIOR: &str = "web_behavior";
pub const WEBSITE_PREFERENCES: &str = "website_preferences";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// How many values a demographic column keeps in a wide table.
    pub demographic_top_values: usize,
    /// How many values a media or brand column keeps in a wide table.
    pub column_top_values: usize,
    pub keywords: KeywordConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            demographic_top_values: 5,
            column_top_values: 10,
            keywords: KeywordConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableShape {
    InsightValue,
    CategoryIndex,
    Domain,
    Fallback,
}

impl TableShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableShape::InsightValue => "insight_value",
            TableShape::CategoryIndex => "category_index",
            TableShape::Domain => "domain",
            TableShape::Fallback => "fallback",
        }
    }
}

/// Result of classifying one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableClassification {
    pub shape: TableShape,
    pub insights: Insights,
    pub skipped: Vec<ClassificationError>,
}

struct InsightValueColumns {
    insight: usize,
    value: usize,
    composition: Option<usize>,
    category: Option<usize>,
    subcategory: Option<usize>,
}

struct CategoryIndexColumns {
    category: usize,
    index: usize,
    share: Option<usize>,
}

struct DomainColumns {
    domain: usize,
    rating: Option<usize>,
    category: Option<usize>,
}

/// A detected shape together with the column positions its handler reads.
enum ShapeColumns {
    InsightValue(InsightValueColumns),
    CategoryIndex(CategoryIndexColumns),
    Domain(DomainColumns),
    Fallback,
}

impl ShapeColumns {
    fn shape(&self) -> TableShape {
        match self {
            ShapeColumns::InsightValue(_) => TableShape::InsightValue,
            ShapeColumns::CategoryIndex(_) => TableShape::CategoryIndex,
            ShapeColumns::Domain(_) => TableShape::Domain,
            ShapeColumns::Fallback => TableShape::Fallback,
        }
    }
}

fn position(normalized: &[String], pred: impl Fn(&str) -> bool) -> Option<usize> {
    normalized.iter().position(|n| pred(n))
}

fn resolve_shape(columns: &[String]) -> ShapeColumns {
    let normalized: Vec<String> = columns.iter().map(|c| normalize_header(c)).collect();

    if let (Some(insight), Some(value)) = (
        position(&normalized, |n| n == "insight"),
        position(&normalized, |n| n == "insightvalue"),
    ) {
        return ShapeColumns::InsightValue(InsightValueColumns {
            insight,
            value,
            composition: position(&normalized, |n| n.starts_with("composition")),
            category: position(&normalized, |n| n == "category"),
            subcategory: position(&normalized, |n| n == "subcategory1")
                .or_else(|| position(&normalized, |n| n == "subcategory")),
        });
    }

    if let (Some(category), Some(index)) = (
        position(&normalized, |n| n == "category"),
        position(&normalized, |n| n == "categoryindex"),
    ) {
        return ShapeColumns::CategoryIndex(CategoryIndexColumns {
            category,
            index,
            share: position(&normalized, |n| n.contains("share")),
        });
    }

    if let Some(domain) = position(&normalized, |n| n == "domainname") {
        return ShapeColumns::Domain(DomainColumns {
            domain,
            rating: position(&normalized, |n| n.contains("rating")),
            category: position(&normalized, |n| n == "category"),
        });
    }

    ShapeColumns::Fallback
}

/// Pick the extraction strategy for a header row.
pub fn detect_shape(columns: &[String]) -> TableShape {
    resolve_shape(columns).shape()
}

fn required_cell(table: &Table, row: usize, column: usize) -> Result<&str, ClassificationError> {
    table
        .cell(row, column)
        .ok_or_else(|| ClassificationError::ShortRow {
            row: row + 1,
            column: table.columns()[column].clone(),
        })
}

fn optional_value(table: &Table, row: usize, column: Option<usize>) -> Value {
    column
        .and_then(|c| table.cell(row, c))
        .map(infer_scalar)
        .unwrap_or(Value::Null)
}

/// Rule-based classifier over immutable keyword tables.
#[derive(Debug, Clone, Default)]
pub struct InsightClassifier {
    config: ClassifierConfig,
}

impl InsightClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify a table with the single strategy its header selects.
    pub fn classify_table(&self, table: &Table) -> TableClassification {
        let columns = resolve_shape(table.columns());
        let mut out = TableClassification {
            shape: columns.shape(),
            insights: Insights::new(),
            skipped: Vec::new(),
        };

        match columns {
            ShapeColumns::InsightValue(cols) => self.extract_insight_values(table, &cols, &mut out),
            ShapeColumns::CategoryIndex(cols) => extract_category_index(table, &cols, &mut out),
            ShapeColumns::Domain(cols) => extract_domains(table, &cols, &mut out),
            ShapeColumns::Fallback => self.extract_wide(table, &mut out),
        }

        tracing::debug!(
            shape = out.shape.as_str(),
            rows = table.row_count(),
            skipped = out.skipped.len(),
            "table classified"
        );
        out
    }

    /// Keyword co-occurrence insights for unstructured text.
    pub fn classify_text(&self, text: &str) -> Insights {
        keyword_insights(text, &self.config.keywords.text_topics)
    }

    /// Bucket and sub-topic for one lowercased Insight text, or `None` when
    /// no keyword family matches.
    pub fn insight_topic(&self, insight: &str) -> Option<(Bucket, String)> {
        let kw = &self.config.keywords;
        if let Some(family) = first_match(insight, &kw.insight_demographics) {
            return Some((Bucket::Demographics, family.to_string()));
        }
        if contains_any(insight, &kw.insight_media) {
            return Some((Bucket::MediaConsumption, MEDIA_PLATFORMS.to_string()));
        }
        if contains_any(insight, &kw.insight_brand) {
            return Some((Bucket::BrandAffinity, SHOPPING_BEHAVIOR.to_string()));
        }
        if contains_any(insight, &kw.insight_psychographics) {
            return Some((Bucket::Psychographics, VALUES_INTERESTS.to_string()));
        }
        None
    }

    fn extract_insight_values(
        &self,
        table: &Table,
        cols: &InsightValueColumns,
        out: &mut TableClassification,
    ) {
        for row in 0..table.row_count() {
            match self.insight_value_row(table, row, cols) {
                Ok(Some((bucket, sub_topic, fragment))) => {
                    out.insights.push_fragment(bucket, &sub_topic, fragment)
                }
                Ok(None) => {}
                Err(e) => skip(out, e),
            }
        }
    }

    fn insight_value_row(
        &self,
        table: &Table,
        row: usize,
        cols: &InsightValueColumns,
    ) -> Result<Option<(Bucket, String, InsightFragment)>, ClassificationError> {
        let insight = required_cell(table, row, cols.insight)?;
        let value = required_cell(table, row, cols.value)?;
        let source = insight.to_lowercase();

        let Some((bucket, sub_topic)) = self.insight_topic(&source) else {
            return Ok(None);
        };

        let fragment = InsightFragment {
            source,
            data: FragmentData::InsightValue(InsightValueData {
                insight: insight.to_string(),
                value: infer_scalar(value),
                composition: optional_value(table, row, cols.composition),
                category: optional_value(table, row, cols.category),
                subcategory: optional_value(table, row, cols.subcategory),
            }),
        };
        Ok(Some((bucket, sub_topic, fragment)))
    }

    fn extract_wide(&self, table: &Table, out: &mut TableClassification) {
        let kw = &self.config.keywords;
        let lowered: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect();

        for family in &kw.demographic_columns {
            let Some(column) = lowered.iter().position(|c| family.matches(c)) else {
                continue;
            };
            match top_values(table, column, self.config.demographic_top_values) {
                Ok(top) => out.insights.push_fragment(
                    Bucket::Demographics,
                    &family.name,
                    top_values_fragment(table, &lowered, column, top),
                ),
                Err(e) => skip(out, e),
            }
        }

        for (column, name) in lowered.iter().enumerate() {
            let media = contains_any(name, &kw.media_columns);
            let brand = contains_any(name, &kw.brand_columns);
            if !media && !brand {
                continue;
            }
            match top_values(table, column, self.config.column_top_values) {
                Ok(top) => {
                    let fragment = top_values_fragment(table, &lowered, column, top);
                    if media {
                        out.insights
                            .push_fragment(Bucket::MediaConsumption, name, fragment.clone());
                    }
                    if brand {
                        out.insights.push_fragment(Bucket::BrandAffinity, name, fragment);
                    }
                }
                Err(e) => skip(out, e),
            }
        }
    }
}

fn skip(out: &mut TableClassification, error: ClassificationError) {
    tracing::warn!(shape = out.shape.as_str(), %error, "skipping unit during classification");
    out.skipped.push(error);
}

fn extract_category_index(table: &Table, cols: &CategoryIndexColumns, out: &mut TableClassification) {
    let source = table.columns()[cols.category].trim().to_lowercase();
    for row in 0..table.row_count() {
        let result = required_cell(table, row, cols.category).and_then(|category| {
            let index = required_cell(table, row, cols.index)?;
            Ok(CategoryIndexData {
                category: infer_scalar(category),
                index: infer_scalar(index),
                share: optional_value(table, row, cols.share),
            })
        });
        match result {
            Ok(data) => out.insights.push_fragment(
                Bucket::MediaConsumption,
                WEB_BEHAVIOR,
                InsightFragment {
                    source: source.clone(),
                    data: FragmentData::CategoryIndex(data),
                },
            ),
            Err(e) => skip(out, e),
        }
    }
}

fn extract_domains(table: &Table, cols: &DomainColumns, out: &mut TableClassification) {
    let source = table.columns()[cols.domain].trim().to_lowercase();
    for row in 0..table.row_count() {
        match required_cell(table, row, cols.domain) {
            Ok(domain) => out.insights.push_fragment(
                Bucket::MediaConsumption,
                WEBSITE_PREFERENCES,
                InsightFragment {
                    source: source.clone(),
                    data: FragmentData::Domain(DomainData {
                        domain: infer_scalar(domain),
                        rating: optional_value(table, row, cols.rating),
                        category: optional_value(table, row, cols.category),
                    }),
                },
            ),
            Err(e) => skip(out, e),
        }
    }
}

fn top_values_fragment(
    table: &Table,
    lowered: &[String],
    column: usize,
    top_values: BTreeMap<String, u64>,
) -> InsightFragment {
    InsightFragment {
        source: lowered[column].clone(),
        data: FragmentData::TopValues(TopValuesData {
            source_column: table.columns()[column].clone(),
            top_values,
        }),
    }
}

/// The `n` most frequent non-empty values of a column. Ties keep the order
/// of first appearance.
fn top_values(
    table: &Table,
    column: usize,
    n: usize,
) -> Result<BTreeMap<String, u64>, ClassificationError> {
    let mut counts: Vec<(String, u64)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in table.rows() {
        let Some(cell) = row.get(column) else {
            continue;
        };
        let value = cell.trim();
        if value.is_empty() {
            continue;
        }
        match positions.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                positions.insert(value.to_string(), counts.len());
                counts.push((value.to_string(), 1));
            }
        }
    }

    if counts.is_empty() {
        return Err(ClassificationError::EmptyColumn {
            column: table.columns()[column].clone(),
        });
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counts.into_iter().take(n).collect())
}
