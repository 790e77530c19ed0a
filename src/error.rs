//! Error taxonomy for the ingestion pipeline.
//!
//! Only [`ArchiveError`] ends a run. [`FileAccessError`] and [`ParseError`]
//! are contained to one member and surface as manifest annotations;
//! row- and column-level failures are
//! [`bundle_insights_core::ClassificationError`].

use std::path::PathBuf;

use thiserror::Error;

/// The input could not be opened or read as an archive. Fatal for the run.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a valid archive: {0}")]
    Format(#[from] zip::result::ZipError),

    #[error("cannot create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("cannot enumerate extracted files: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Metadata for one archive member could not be read.
#[derive(Debug, Error)]
#[error("cannot read metadata for {name}: {source}")]
pub struct FileAccessError {
    pub name: String,
    #[source]
    pub source: std::io::Error,
}

/// A format parser failed on one file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet parse failed: {0}")]
    Spreadsheet(String),

    #[error("spreadsheet XML is malformed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("PDF is encrypted")]
    Encrypted,

    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
}

impl From<zip::result::ZipError> for ParseError {
    fn from(e: zip::result::ZipError) -> Self {
        ParseError::Spreadsheet(e.to_string())
    }
}

impl From<calamine::XlsError> for ParseError {
    fn from(e: calamine::XlsError) -> Self {
        ParseError::Spreadsheet(e.to_string())
    }
}

impl From<lopdf::Error> for ParseError {
    fn from(e: lopdf::Error) -> Self {
        ParseError::Pdf(e.to_string())
    }
}
