//! Keyword tables driving every classification decision.
//!
//! The tables are plain data owned by the classifier. Defaults cover the
//! column and Insight vocabularies seen in audience-research exports; any
//! list can be replaced from the `[classifier.keywords]` section of the
//! configuration file, and tests can pass their own fixtures.
//!
//! Order is significant wherever a list decides a sub-topic: the first
//! keyword (or family) that matches wins.

use serde::{Deserialize, Serialize};

use crate::models::Bucket;

/// A named group of keywords, e.g. the `age` family of column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordFamily {
    pub name: String,
    pub keywords: Vec<String>,
}

impl KeywordFamily {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: to_strings(keywords),
        }
    }

    /// True when `text` (already lowercased) equals or contains any keyword.
    pub fn matches(&self, text: &str) -> bool {
        contains_any(text, &self.keywords)
    }
}

/// Keywords used to score free text against one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicKeywords {
    pub bucket: Bucket,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Insight text → demographics. Each keyword is also the sub-topic name;
    /// list order is the precedence order.
    pub insight_demographics: Vec<String>,
    /// Insight text → `media_consumption.media_platforms`.
    pub insight_media: Vec<String>,
    /// Insight text → `brand_affinity.shopping_behavior`.
    pub insight_brand: Vec<String>,
    /// Insight text → `psychographics.values_interests`.
    pub insight_psychographics: Vec<String>,
    /// Wide-table column families for demographics, in precedence order.
    pub demographic_columns: Vec<KeywordFamily>,
    /// Wide-table columns kept verbatim under `media_consumption`.
    pub media_columns: Vec<String>,
    /// Wide-table columns kept verbatim under `brand_affinity`.
    pub brand_columns: Vec<String>,
    /// Free-text topic lists for PDF and plain-text documents.
    pub text_topics: Vec<TopicKeywords>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            insight_demographics: to_strings(&[
                "age",
                "gender",
                "income",
                "education",
                "location",
                "occupation",
            ]),
            insight_media: to_strings(&[
                "social media",
                "platform",
                "streaming",
                "tv",
                "digital",
                "mobile",
                "device",
            ]),
            insight_brand: to_strings(&["brand", "shopping", "purchase", "retail", "store"]),
            insight_psychographics: to_strings(&[
                "value",
                "lifestyle",
                "interest",
                "personality",
                "attitude",
            ]),
            demographic_columns: vec![
                KeywordFamily::new("age", &["age", "age_range", "age range", "age group"]),
                KeywordFamily::new("gender", &["gender", "sex"]),
                KeywordFamily::new(
                    "income",
                    &["income", "household income", "hhi", "salary"],
                ),
                KeywordFamily::new("education", &["education", "degree", "school"]),
                KeywordFamily::new(
                    "location",
                    &["location", "region", "state", "city", "country", "dma", "zip"],
                ),
                KeywordFamily::new(
                    "occupation",
                    &["occupation", "job", "profession", "employment", "industry"],
                ),
            ],
            media_columns: to_strings(&[
                "media",
                "platform",
                "channel",
                "tv",
                "streaming",
                "social",
                "website",
                "app",
                "device",
            ]),
            brand_columns: to_strings(&["brand", "product", "purchase", "retailer", "store"]),
            text_topics: vec![
                TopicKeywords {
                    bucket: Bucket::Demographics,
                    keywords: to_strings(&[
                        "age",
                        "gender",
                        "income",
                        "education",
                        "location",
                        "occupation",
                        "household",
                        "married",
                        "children",
                    ]),
                },
                TopicKeywords {
                    bucket: Bucket::Psychographics,
                    keywords: to_strings(&[
                        "values",
                        "lifestyle",
                        "interests",
                        "personality",
                        "attitudes",
                        "beliefs",
                        "motivations",
                        "opinions",
                    ]),
                },
                TopicKeywords {
                    bucket: Bucket::MediaConsumption,
                    keywords: to_strings(&[
                        "social media",
                        "television",
                        "streaming",
                        "podcast",
                        "radio",
                        "news",
                        "digital",
                        "mobile",
                    ]),
                },
                TopicKeywords {
                    bucket: Bucket::BrandAffinity,
                    keywords: to_strings(&[
                        "brand",
                        "loyalty",
                        "purchase",
                        "shopping",
                        "retail",
                        "product",
                        "store",
                    ]),
                },
            ],
        }
    }
}

impl KeywordConfig {
    /// Names of every empty list, for config validation.
    pub fn empty_lists(&self) -> Vec<String> {
        let mut empty = Vec::new();
        let named = [
            ("insight_demographics", &self.insight_demographics),
            ("insight_media", &self.insight_media),
            ("insight_brand", &self.insight_brand),
            ("insight_psychographics", &self.insight_psychographics),
        ];
        for (name, list) in named {
            if list.is_empty() {
                empty.push(name.to_string());
            }
        }
        for family in &self.demographic_columns {
            if family.keywords.is_empty() {
                empty.push(format!("demographic_columns.{}", family.name));
            }
        }
        for topic in &self.text_topics {
            if topic.keywords.is_empty() {
                empty.push(format!("text_topics.{}", topic.bucket.as_str()));
            }
        }
        empty
    }
}

/// First keyword in `keywords` that occurs in `text`.
pub fn first_match<'a>(text: &str, keywords: &'a [String]) -> Option<&'a str> {
    keywords
        .iter()
        .find(|k| text.contains(k.as_str()))
        .map(String::as_str)
}

pub fn contains_any(text: &str, keywords: &[String]) -> bool {
    first_match(text, keywords).is_some()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
