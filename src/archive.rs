//! Archive extraction into a per-run scratch directory.
//!
//! [`extract_archive`] unpacks a ZIP bundle into a [`ScratchDir`] and lists
//! the regular files it contains, leaving out hidden and system entries
//! (`.DS_Store`, `__MACOSX/`, `Thumbs.db`, ...). The scratch directory is
//! removed when the [`ExtractedArchive`] is dropped, whichever way the run
//! ends.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::{DirEntry, WalkDir};

use crate::config::ExtractionConfig;
use crate::error::ArchiveError;

const SYSTEM_FILE_NAMES: &[&str] = &["__MACOSX", "Thumbs.db", "desktop.ini"];

/// Temporary directory owned by one run. Removed on drop.
#[derive(Debug)]
pub struct ScratchDir {
    dir: tempfile::TempDir,
}

impl ScratchDir {
    pub fn new(parent: Option<&Path>) -> Result<Self, ArchiveError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("bix-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(ArchiveError::Scratch)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now and report failures instead of ignoring
    /// them as drop does.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// A member that was not written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub name: String,
    pub reason: String,
}

/// Result of unpacking one archive.
#[derive(Debug)]
pub struct ExtractedArchive {
    scratch: ScratchDir,
    files: Vec<PathBuf>,
    rejected: Vec<RejectedEntry>,
}

impl ExtractedArchive {
    /// Root of the extracted tree.
    pub fn root(&self) -> &Path {
        self.scratch.path()
    }

    /// Extracted regular files in sorted order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn rejected(&self) -> &[RejectedEntry] {
        &self.rejected
    }

    pub fn close(self) -> std::io::Result<()> {
        self.scratch.close()
    }
}

/// Unpack `archive_path` and enumerate its visible files.
pub fn extract_archive(
    archive_path: &Path,
    config: &ExtractionConfig,
) -> Result<ExtractedArchive, ArchiveError> {
    let file = File::open(archive_path).map_err(|source| ArchiveError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file)?;

    let scratch = ScratchDir::new(config.scratch_dir.as_deref())?;
    let exclude = build_globset(&config.exclude_globs);
    let mut rejected = Vec::new();

    for i in 0..archive.len() {
        let listed_name = archive.name_for_index(i).map(str::to_string);
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                let name = listed_name.unwrap_or_else(|| format!("#{}", i));
                tracing::warn!(entry = %name, error = %e, "rejecting unreadable archive entry");
                rejected.push(RejectedEntry {
                    name,
                    reason: format!("cannot open entry: {}", e),
                });
                continue;
            }
        };
        let name = entry.name().to_string();

        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(entry = %name, "rejecting archive entry with unsafe path");
            rejected.push(RejectedEntry {
                name,
                reason: "unsafe path outside the archive root".to_string(),
            });
            continue;
        };
        let target = scratch.path().join(&relative);

        if entry.is_dir() {
            if let Err(e) = std::fs::create_dir_all(&target) {
                tracing::warn!(entry = %name, error = %e, "cannot create directory entry");
                rejected.push(RejectedEntry {
                    name,
                    reason: format!("cannot create directory: {}", e),
                });
            }
            continue;
        }
        if is_hidden_path(&relative) {
            tracing::debug!(entry = %name, "skipping hidden or system entry");
            continue;
        }

        if let Some(parent) = target.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(entry = %name, error = %e, "cannot create parent directory");
                rejected.push(RejectedEntry {
                    name,
                    reason: format!("cannot create parent directory: {}", e),
                });
                continue;
            }
        }

        let mut buf = Vec::new();
        let read = (&mut entry)
            .take(config.max_entry_bytes.saturating_add(1))
            .read_to_end(&mut buf);
        match read {
            Ok(_) if buf.len() as u64 > config.max_entry_bytes => {
                tracing::warn!(
                    entry = %name,
                    limit = config.max_entry_bytes,
                    "rejecting archive entry over size limit"
                );
                rejected.push(RejectedEntry {
                    name,
                    reason: format!("exceeds size limit ({} bytes)", config.max_entry_bytes),
                });
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(entry = %name, error = %e, "rejecting unreadable archive entry");
                rejected.push(RejectedEntry {
                    name,
                    reason: format!("cannot decompress: {}", e),
                });
                continue;
            }
        }

        if let Err(e) = File::create(&target).and_then(|mut out| out.write_all(&buf)) {
            tracing::warn!(entry = %name, error = %e, "cannot write archive entry");
            rejected.push(RejectedEntry {
                name,
                reason: format!("cannot write entry: {}", e),
            });
        }
    }

    let files = list_files(scratch.path(), &exclude)?;
    tracing::debug!(
        archive = %archive_path.display(),
        files = files.len(),
        rejected = rejected.len(),
        "archive extracted"
    );

    Ok(ExtractedArchive {
        scratch,
        files,
        rejected,
    })
}

/// Regular files under `root`, sorted, without hidden/system entries or
/// paths matching `exclude`.
pub fn list_files(root: &Path, exclude: &GlobSet) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden_entry(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if exclude.is_match(relative) {
            tracing::debug!(path = %relative.display(), "excluded by pattern");
            continue;
        }
        files.push(entry.into_path());
    }

    Ok(files)
}

fn is_hidden_entry(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(is_hidden_name)
        .unwrap_or(false)
}

fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.') || SYSTEM_FILE_NAMES.contains(&name)
}

fn is_hidden_path(path: &Path) -> bool {
    path.components()
        .filter_map(|c| c.as_os_str().to_str())
        .any(is_hidden_name)
}

/// Build the exclude set. Patterns are validated with the config, so an
/// invalid one here is logged and ignored.
fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!(pattern, error = %e, "ignoring invalid exclude glob"),
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "exclude globs unusable, excluding nothing");
        GlobSet::empty()
    })
}
