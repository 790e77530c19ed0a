//! Archive-level merge of per-file insights.
//!
//! The aggregator only appends. Two files contributing to the same
//! sub-topic both stay visible, each entry tagged with its file name, in
//! the order the files were folded.

use crate::models::{FileFormat, Insights, ParsedData, SourceFileRecord, SourcedEntry};

#[derive(Debug, Default)]
pub struct Aggregator {
    data: ParsedData,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every sub-topic of `insights` under the matching archive-level
    /// bucket. Returns the number of entries appended.
    pub fn fold_insights(&mut self, source: &str, insights: &Insights) -> usize {
        let mut appended = 0;
        for (bucket, sub_topics) in insights.iter() {
            let Some(target) = self.data.bucket_mut(bucket) else {
                if !sub_topics.is_empty() {
                    tracing::debug!(
                        source,
                        bucket = bucket.as_str(),
                        sub_topics = sub_topics.len(),
                        "bucket has no archive-level counterpart; entries dropped"
                    );
                }
                continue;
            };
            for (sub_topic, data) in sub_topics {
                target
                    .entry(sub_topic.clone())
                    .or_default()
                    .push(SourcedEntry {
                        source: source.to_string(),
                        data: data.clone(),
                    });
                appended += 1;
            }
        }
        appended
    }

    /// Add a manifest line for one processed file.
    pub fn record_file(
        &mut self,
        name: &str,
        file_type: FileFormat,
        insights_extracted: bool,
        error: Option<String>,
    ) {
        self.data.source_files.push(SourceFileRecord {
            name: name.to_string(),
            file_type,
            parsed: error.is_none(),
            insights_extracted,
            error,
        });
    }

    pub fn finish(self) -> ParsedData {
        self.data
    }
}
