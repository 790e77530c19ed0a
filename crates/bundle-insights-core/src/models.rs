//! Core data models shared by parsers, the classifier, and the aggregator.
//!
//! Everything here serializes to plain JSON (string-keyed objects, arrays,
//! scalars) so a [`ParsedData`] can be embedded directly in an HTTP response
//! or stored as a document, and decoded back without loss.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input formats the pipeline knows how to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Excel,
    Pdf,
    Image,
    Text,
}

impl FileFormat {
    /// Map a file extension (any case, without the dot) to a parser format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Excel),
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Csv => &["csv"],
            Self::Excel => &["xlsx", "xls"],
            Self::Pdf => &["pdf"],
            Self::Image => &["png", "jpg", "jpeg"],
            Self::Text => &["txt"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "excel",
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Text => "text",
        }
    }

    pub const ALL: [FileFormat; 5] = [
        FileFormat::Csv,
        FileFormat::Excel,
        FileFormat::Pdf,
        FileFormat::Image,
        FileFormat::Text,
    ];
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed top-level semantic categories insights are sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Demographics,
    Psychographics,
    MediaConsumption,
    BrandAffinity,
    Behavioral,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::Demographics,
        Bucket::Psychographics,
        Bucket::MediaConsumption,
        Bucket::BrandAffinity,
        Bucket::Behavioral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Demographics => "demographics",
            Bucket::Psychographics => "psychographics",
            Bucket::MediaConsumption => "media_consumption",
            Bucket::BrandAffinity => "brand_affinity",
            Bucket::Behavioral => "behavioral",
        }
    }
}

/// Top value frequencies of a single column in a wide table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopValuesData {
    pub source_column: String,
    pub top_values: BTreeMap<String, u64>,
}

/// One row of an Insight/Value table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsightValueData {
    pub insight: String,
    pub value: Value,
    pub composition: Value,
    pub category: Value,
    pub subcategory: Value,
}

/// One row of a category-index table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryIndexData {
    pub category: Value,
    pub index: Value,
    pub share: Value,
}

/// One row of a domain/site table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainData {
    pub domain: Value,
    pub rating: Value,
    pub category: Value,
}

/// Shape-specific payload of an [`InsightFragment`].
///
/// Untagged on the wire; the variant structs reject unknown fields so a
/// decoded payload always lands back in the variant it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FragmentData {
    InsightValue(InsightValueData),
    Domain(DomainData),
    CategoryIndex(CategoryIndexData),
    TopValues(TopValuesData),
}

/// One observed data point attributable to a single column or row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightFragment {
    /// Originating column name or Insight text, lowercased.
    pub source: String,
    pub data: FragmentData,
}

/// Keyword co-occurrence summary for free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub matched_keywords: Vec<String>,
    pub relevance_score: f64,
}

/// Content stored under one sub-topic of an [`Insights`] bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsightData {
    Fragments(Vec<InsightFragment>),
    Keywords(KeywordMatch),
}

/// Per-file insight structure with the five fixed buckets.
///
/// All five keys are always present on the wire; sub-topic keys appear on
/// first match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    #[serde(default)]
    pub demographics: BTreeMap<String, InsightData>,
    #[serde(default)]
    pub psychographics: BTreeMap<String, InsightData>,
    #[serde(default)]
    pub media_consumption: BTreeMap<String, InsightData>,
    #[serde(default)]
    pub brand_affinity: BTreeMap<String, InsightData>,
    #[serde(default)]
    pub behavioral: BTreeMap<String, InsightData>,
}

impl Insights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bucket(&self, bucket: Bucket) -> &BTreeMap<String, InsightData> {
        match bucket {
            Bucket::Demographics => &self.demographics,
            Bucket::Psychographics => &self.psychographics,
            Bucket::MediaConsumption => &self.media_consumption,
            Bucket::BrandAffinity => &self.brand_affinity,
            Bucket::Behavioral => &self.behavioral,
        }
    }

    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut BTreeMap<String, InsightData> {
        match bucket {
            Bucket::Demographics => &mut self.demographics,
            Bucket::Psychographics => &mut self.psychographics,
            Bucket::MediaConsumption => &mut self.media_consumption,
            Bucket::BrandAffinity => &mut self.brand_affinity,
            Bucket::Behavioral => &mut self.behavioral,
        }
    }

    /// Append a fragment under `bucket.sub_topic`, creating the sub-topic on
    /// first use.
    pub fn push_fragment(&mut self, bucket: Bucket, sub_topic: &str, fragment: InsightFragment) {
        let entry = self
            .bucket_mut(bucket)
            .entry(sub_topic.to_string())
            .or_insert_with(|| InsightData::Fragments(Vec::new()));
        match entry {
            InsightData::Fragments(list) => list.push(fragment),
            InsightData::Keywords(_) => {
                tracing::debug!(
                    bucket = bucket.as_str(),
                    sub_topic,
                    "sub-topic already holds keyword matches; fragment dropped"
                );
            }
        }
    }

    pub fn set_keywords(&mut self, bucket: Bucket, sub_topic: &str, matched: KeywordMatch) {
        self.bucket_mut(bucket)
            .insert(sub_topic.to_string(), InsightData::Keywords(matched));
    }

    /// Fragments stored under `bucket.sub_topic`, empty when absent.
    pub fn fragments(&self, bucket: Bucket, sub_topic: &str) -> &[InsightFragment] {
        match self.bucket(bucket).get(sub_topic) {
            Some(InsightData::Fragments(list)) => list,
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        Bucket::ALL.iter().all(|b| self.bucket(*b).is_empty())
    }

    /// Iterate buckets in their canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &BTreeMap<String, InsightData>)> {
        Bucket::ALL.into_iter().map(move |b| (b, self.bucket(b)))
    }
}

/// A sub-topic entry in the archive-level result, tagged with the file it
/// came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedEntry {
    pub source: String,
    pub data: InsightData,
}

/// Manifest line for one processed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFileRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: FileFormat,
    pub parsed: bool,
    pub insights_extracted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type BucketEntries = BTreeMap<String, Vec<SourcedEntry>>;

/// Archive-level merge of every file's insights.
///
/// All four buckets and the manifest are always written, empty or not.
/// Missing keys decode as empty, so the `{}` of a failed run reads back as
/// the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedData {
    #[serde(default)]
    pub demographics: BucketEntries,
    #[serde(default)]
    pub psychographics: BucketEntries,
    #[serde(default)]
    pub media_consumption: BucketEntries,
    #[serde(default)]
    pub brand_affinity: BucketEntries,
    #[serde(default)]
    pub source_files: Vec<SourceFileRecord>,
}

impl ParsedData {
    /// Archive-level entries for a bucket. `Behavioral` has no archive-level
    /// counterpart and returns `None`.
    pub fn bucket(&self, bucket: Bucket) -> Option<&BucketEntries> {
        match bucket {
            Bucket::Demographics => Some(&self.demographics),
            Bucket::Psychographics => Some(&self.psychographics),
            Bucket::MediaConsumption => Some(&self.media_consumption),
            Bucket::BrandAffinity => Some(&self.brand_affinity),
            Bucket::Behavioral => None,
        }
    }

    pub fn bucket_mut(&mut self, bucket: Bucket) -> Option<&mut BucketEntries> {
        match bucket {
            Bucket::Demographics => Some(&mut self.demographics),
            Bucket::Psychographics => Some(&mut self.psychographics),
            Bucket::MediaConsumption => Some(&mut self.media_consumption),
            Bucket::BrandAffinity => Some(&mut self.brand_affinity),
            Bucket::Behavioral => None,
        }
    }

    pub fn entries(&self, bucket: Bucket, sub_topic: &str) -> &[SourcedEntry] {
        self.bucket(bucket)
            .and_then(|b| b.get(sub_topic))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
