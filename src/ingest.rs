//! Ingestion pipeline orchestration.
//!
//! Coordinates one archive run: extraction → type resolution → parsing and
//! classification → aggregation. Only a failure to open or unpack the
//! archive ends the run; every later failure is recorded against the file
//! or sheet it came from and processing continues.

use std::path::Path;

use bundle_insights_core::models::{FileFormat, ParsedData};
use bundle_insights_core::{Aggregator, InsightClassifier};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::archive::extract_archive;
use crate::config::Config;
use crate::error::ArchiveError;
use crate::filetype::{resolve_member, ArchiveMember};
use crate::parsers::{parse_file, IntermediateRecord};

/// Outcome of one archive run.
///
/// A failed run writes `parsed_data` as `{}`; a successful one always
/// carries every bucket key and the manifest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParsedArchiveResult {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    pub extracted_files: Vec<ArchiveMember>,
    pub parsed_data: ParsedData,
}

impl ParsedArchiveResult {
    /// Envelope for a run that could not get past extraction.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            extracted_files: Vec::new(),
            parsed_data: ParsedData::default(),
        }
    }
}

impl Serialize for ParsedArchiveResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ParsedArchiveResult", 4)?;
        state.serialize_field("success", &self.success)?;
        match &self.error {
            Some(error) => state.serialize_field("error", error)?,
            None => state.skip_field("error")?,
        }
        state.serialize_field("extracted_files", &self.extracted_files)?;
        if self.success {
            state.serialize_field("parsed_data", &self.parsed_data)?;
        } else {
            state.serialize_field("parsed_data", &serde_json::Map::new())?;
        }
        state.end()
    }
}

/// Runs archives through the pipeline. Holds only immutable configuration,
/// so one instance can serve any number of runs.
#[derive(Debug, Clone)]
pub struct Ingestor {
    config: Config,
    classifier: InsightClassifier,
}

impl Ingestor {
    pub fn new(config: Config) -> Self {
        let classifier = InsightClassifier::new(config.classifier.clone());
        Self { config, classifier }
    }

    pub fn process_archive(&self, path: &Path) -> ParsedArchiveResult {
        let span = tracing::info_span!("archive", path = %path.display());
        let _enter = span.enter();

        match self.run(path) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "archive run failed");
                ParsedArchiveResult::failure(format!("Failed to process archive: {}", e))
            }
        }
    }

    fn run(&self, path: &Path) -> Result<ParsedArchiveResult, ArchiveError> {
        let extracted = extract_archive(path, &self.config.extraction)?;
        let mut members = Vec::with_capacity(extracted.files().len());
        let mut aggregator = Aggregator::new();
        let mut parsed = 0usize;
        let mut failed = 0usize;

        for file in extracted.files() {
            let mut member = resolve_member(file, extracted.root());
            let Some(format) = member.format() else {
                tracing::debug!(file = %member.name, label = %member.file_type, "not parseable, listed only");
                members.push(member);
                continue;
            };

            let record = parse_file(
                file,
                &member.name,
                format,
                &self.classifier,
                &self.config.parsing,
            );
            let appended: usize = record
                .insights()
                .into_iter()
                .map(|insights| aggregator.fold_insights(&member.name, insights))
                .sum();
            let error = record.error().map(str::to_string);
            if error.is_some() {
                failed += 1;
                member.error = error.clone();
            } else {
                parsed += 1;
            }
            tracing::debug!(file = %member.name, format = %format, entries = appended, "file processed");
            aggregator.record_file(&member.name, format, appended > 0, error);
            members.push(member);
        }

        for rejected in extracted.rejected() {
            members.push(ArchiveMember::rejected(&rejected.name, &rejected.reason));
        }

        if let Err(e) = extracted.close() {
            tracing::warn!(error = %e, "scratch directory cleanup failed");
        }

        tracing::info!(
            files = members.len(),
            parsed,
            failed,
            "archive processed"
        );

        Ok(ParsedArchiveResult {
            success: true,
            error: None,
            extracted_files: members,
            parsed_data: aggregator.finish(),
        })
    }

    /// Parse one file outside any archive. `None` when the extension has no
    /// parser.
    pub fn parse_single_file(&self, path: &Path) -> Option<IntermediateRecord> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        let format = FileFormat::from_extension(&extension)?;
        let name = path.file_name()?.to_string_lossy();
        Some(parse_file(
            path,
            &name,
            format,
            &self.classifier,
            &self.config.parsing,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_insights_core::models::Bucket;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_zip(dir: &Path, entries: &[(&str, &[u8])]) -> std::path::PathBuf {
        let path = dir.join("bundle.zip");
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        for (name, body) in entries {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(body).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    #[test]
    fn failure_envelope_shape() {
        let result = ParsedArchiveResult::failure("boom");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "error": "boom",
                "extracted_files": [],
                "parsed_data": {}
            })
        );
    }

    #[test]
    fn unparseable_members_are_listed_not_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(
            tmp.path(),
            &[("deck.pptx", b"binary"), ("ages.csv", b"Age Range\n25-34\n")],
        );
        let result = Ingestor::new(Config::default()).process_archive(&path);
        assert!(result.success);
        assert_eq!(result.extracted_files.len(), 2);
        let deck = result
            .extracted_files
            .iter()
            .find(|m| m.name == "deck.pptx")
            .unwrap();
        assert!(!deck.parseable);
        assert_eq!(result.parsed_data.source_files.len(), 1);
        assert_eq!(result.parsed_data.source_files[0].name, "ages.csv");
        assert!(result.parsed_data.source_files[0].insights_extracted);
        assert_eq!(
            result.parsed_data.entries(Bucket::Demographics, "age").len(),
            1
        );
    }

    #[test]
    fn rejected_entries_appear_in_manifest() {
        let tmp = TempDir::new().unwrap();
        let big = vec![b'x'; 128];
        let path = write_zip(tmp.path(), &[("huge.txt", &big), ("ok.txt", b"brand")]);
        let mut config = Config::default();
        config.extraction.max_entry_bytes = 64;
        let result = Ingestor::new(config).process_archive(&path);
        assert!(result.success);
        let huge = result
            .extracted_files
            .iter()
            .find(|m| m.name == "huge.txt")
            .unwrap();
        assert!(!huge.parseable);
        assert!(huge.error.as_deref().unwrap().contains("size limit"));
    }

    #[test]
    fn single_file_dispatch_by_extension() {
        let tmp = TempDir::new().unwrap();
        let notes = tmp.path().join("Notes.TXT");
        std::fs::write(&notes, "podcast listeners").unwrap();
        let ingestor = Ingestor::new(Config::default());
        let record = ingestor.parse_single_file(&notes).unwrap();
        assert_eq!(record.format, FileFormat::Text);
        assert_eq!(record.source, "Notes.TXT");

        let other = tmp.path().join("deck.pptx");
        std::fs::write(&other, "x").unwrap();
        assert!(ingestor.parse_single_file(&other).is_none());
    }
}
