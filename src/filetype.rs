//! File type resolution for archive members.

use std::path::Path;

use bundle_insights_core::models::FileFormat;
use serde::{Deserialize, Serialize};

use crate::error::FileAccessError;

/// One file found in the extracted archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveMember {
    /// Path relative to the archive root, `/`-separated.
    pub name: String,
    pub size: u64,
    pub extension: String,
    pub mime_type: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub parseable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArchiveMember {
    /// Parser format for this member, `None` when it is not parseable.
    pub fn format(&self) -> Option<FileFormat> {
        if self.parseable {
            FileFormat::from_extension(&self.extension)
        } else {
            None
        }
    }

    /// Member for an archive entry that was never written to disk.
    pub fn rejected(name: &str, reason: &str) -> Self {
        let extension = extension_of(Path::new(name));
        Self {
            name: name.to_string(),
            size: 0,
            mime_type: mime_for(Path::new(name)),
            file_type: "Unknown".to_string(),
            extension,
            parseable: false,
            error: Some(reason.to_string()),
        }
    }
}

/// Human-readable label for an extension.
pub fn type_label(extension: &str, mime_type: &str) -> String {
    match extension {
        "csv" => "CSV Data File".to_string(),
        "xlsx" => "Excel Spreadsheet".to_string(),
        "xls" => "Excel Spreadsheet (Legacy)".to_string(),
        "pdf" => "PDF Document".to_string(),
        "png" => "PNG Image".to_string(),
        "jpg" | "jpeg" => "JPEG Image".to_string(),
        "txt" => "Text Document".to_string(),
        _ => format!("Unknown ({})", mime_type),
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn mime_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// `path` relative to `root` with `/` separators.
pub fn relative_name(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Describe one extracted file. Never fails: a metadata error yields a
/// non-parseable member carrying the error.
pub fn resolve_member(path: &Path, root: &Path) -> ArchiveMember {
    let name = relative_name(path, root);
    let extension = extension_of(path);
    let mime_type = mime_for(path);

    match stat(path, &name) {
        Ok(size) => ArchiveMember {
            file_type: type_label(&extension, &mime_type),
            parseable: FileFormat::from_extension(&extension).is_some(),
            name,
            size,
            extension,
            mime_type,
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "member metadata unavailable");
            ArchiveMember {
                name,
                size: 0,
                extension,
                mime_type,
                file_type: "Unknown".to_string(),
                parseable: false,
                error: Some(e.to_string()),
            }
        }
    }
}

fn stat(path: &Path, name: &str) -> Result<u64, FileAccessError> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| FileAccessError {
            name: name.to_string(),
            source,
        })
}
