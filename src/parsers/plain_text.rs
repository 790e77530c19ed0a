//! Plain text: decode, sample, keyword-classify.

use bundle_insights_core::InsightClassifier;

use super::encoding::decode_text;
use super::{text_sample, TextPayload};
use crate::config::ParsingConfig;
use crate::error::ParseError;

pub fn parse(
    bytes: &[u8],
    classifier: &InsightClassifier,
    config: &ParsingConfig,
) -> Result<TextPayload, ParseError> {
    let decoded = decode_text(bytes);
    let text = decoded.text.as_str();

    Ok(TextPayload {
        char_count: text.chars().count(),
        encoding: decoded.encoding.to_string(),
        text_sample: text_sample(text, config.text_sample_chars),
        insights: classifier.classify_text(text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_insights_core::models::{Bucket, InsightData};

    #[test]
    fn keywords_land_in_buckets() {
        let payload = parse(
            b"Most respondents watch streaming video and shop online weekly.",
            &InsightClassifier::default(),
            &ParsingConfig::default(),
        )
        .unwrap();
        assert_eq!(payload.encoding, "UTF-8");
        let media = payload.insights.bucket(Bucket::MediaConsumption);
        match media.get("keyword_matches") {
            Some(InsightData::Keywords(m)) => {
                assert!(m.matched_keywords.iter().any(|k| k == "streaming"));
                assert!(m.relevance_score > 0.0);
            }
            other => panic!("expected keyword matches, got {:?}", other),
        }
    }

    #[test]
    fn long_text_is_sampled() {
        let text = "x".repeat(1200);
        let payload = parse(
            text.as_bytes(),
            &InsightClassifier::default(),
            &ParsingConfig::default(),
        )
        .unwrap();
        assert_eq!(payload.char_count, 1200);
        assert_eq!(payload.text_sample.chars().count(), 503);
        assert!(payload.text_sample.ends_with("..."));
        assert!(payload.insights.is_empty());
    }
}
