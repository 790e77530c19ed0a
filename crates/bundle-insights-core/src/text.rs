//! Keyword co-occurrence scoring for unstructured text (PDF and plain text).

use crate::keywords::TopicKeywords;
use crate::models::{Insights, KeywordMatch};

/// Sub-topic under which a bucket's keyword matches are stored.
pub const KEYWORD_MATCHES: &str = "keyword_matches";

/// Score `text` against each topic list.
///
/// A topic appears in the result only when at least one of its keywords
/// occurs in the lowercased text; `relevance_score` is the fraction of the
/// topic's keywords found.
pub fn keyword_insights(text: &str, topics: &[TopicKeywords]) -> Insights {
    let lowered = text.to_lowercase();
    let mut insights = Insights::new();

    for topic in topics {
        if topic.keywords.is_empty() {
            continue;
        }
        let matched: Vec<String> = topic
            .keywords
            .iter()
            .filter(|k| lowered.contains(k.as_str()))
            .cloned()
            .collect();
        if matched.is_empty() {
            continue;
        }
        let relevance_score = matched.len() as f64 / topic.keywords.len() as f64;
        insights.set_keywords(
            topic.bucket,
            KEYWORD_MATCHES,
            KeywordMatch {
                matched_keywords: matched,
                relevance_score,
            },
        );
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bucket, InsightData};

    fn topic(bucket: Bucket, keywords: &[&str]) -> TopicKeywords {
        TopicKeywords {
            bucket,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    #[test]
    fn scores_fraction_of_matched_keywords() {
        let topics = vec![
            topic(Bucket::Demographics, &["age", "income", "gender", "education"]),
            topic(Bucket::BrandAffinity, &["brand", "loyalty"]),
        ];
        let insights = keyword_insights("Audience AGE and Income breakdown", &topics);

        match insights.demographics.get(KEYWORD_MATCHES) {
            Some(InsightData::Keywords(m)) => {
                assert_eq!(m.matched_keywords, vec!["age", "income"]);
                assert!((m.relevance_score - 0.5).abs() < f64::EPSILON);
            }
            other => panic!("expected keyword matches, got {:?}", other),
        }
        assert!(insights.brand_affinity.is_empty());
    }

    #[test]
    fn no_matches_leaves_all_buckets_empty() {
        let topics = vec![topic(Bucket::Psychographics, &["lifestyle"])];
        let insights = keyword_insights("quarterly revenue figures", &topics);
        assert!(insights.is_empty());
    }

    #[test]
    fn empty_topic_list_is_ignored() {
        let topics = vec![topic(Bucket::MediaConsumption, &[])];
        assert!(keyword_insights("anything", &topics).is_empty());
    }
}
