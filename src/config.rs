//! TOML configuration.
//!
//! Every section is optional; a missing file or an empty file yields the
//! defaults. See `config/bix.example.toml` for a fully commented example.

use anyhow::{Context, Result};
use bundle_insights_core::ClassifierConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub parsing: ParsingConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Largest decompressed size accepted for a single archive member.
    #[serde(default = "default_max_entry_bytes")]
    pub max_entry_bytes: u64,
    /// Extra glob patterns (relative to the archive root) to leave out of
    /// the member list, on top of hidden and system entries.
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Parent directory for scratch space. System temp dir when unset.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_entry_bytes: default_max_entry_bytes(),
            exclude_globs: Vec::new(),
            scratch_dir: None,
        }
    }
}

fn default_max_entry_bytes() -> u64 {
    50 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct ParsingConfig {
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
    #[serde(default = "default_sheet_sample_rows")]
    pub sheet_sample_rows: usize,
    #[serde(default = "default_text_sample_chars")]
    pub text_sample_chars: usize,
    /// Both image dimensions must exceed this to flag a possible chart.
    #[serde(default = "default_chart_min_dimension")]
    pub chart_min_dimension: u32,
    #[serde(default = "default_max_sheets")]
    pub max_sheets: usize,
    #[serde(default = "default_max_cells_per_sheet")]
    pub max_cells_per_sheet: usize,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            sample_rows: default_sample_rows(),
            sheet_sample_rows: default_sheet_sample_rows(),
            text_sample_chars: default_text_sample_chars(),
            chart_min_dimension: default_chart_min_dimension(),
            max_sheets: default_max_sheets(),
            max_cells_per_sheet: default_max_cells_per_sheet(),
        }
    }
}

fn default_sample_rows() -> usize {
    5
}
fn default_sheet_sample_rows() -> usize {
    3
}
fn default_text_sample_chars() -> usize {
    500
}
fn default_chart_min_dimension() -> u32 {
    200
}
fn default_max_sheets() -> usize {
    100
}
fn default_max_cells_per_sheet() -> usize {
    100_000
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.extraction.max_entry_bytes == 0 {
            anyhow::bail!("extraction.max_entry_bytes must be > 0");
        }
        for pattern in &self.extraction.exclude_globs {
            globset::Glob::new(pattern)
                .with_context(|| format!("Invalid extraction.exclude_globs pattern: {}", pattern))?;
        }

        if self.parsing.sample_rows == 0 || self.parsing.sheet_sample_rows == 0 {
            anyhow::bail!("parsing.sample_rows and parsing.sheet_sample_rows must be > 0");
        }
        if self.parsing.text_sample_chars == 0 {
            anyhow::bail!("parsing.text_sample_chars must be > 0");
        }
        if self.parsing.max_sheets == 0 || self.parsing.max_cells_per_sheet == 0 {
            anyhow::bail!("parsing.max_sheets and parsing.max_cells_per_sheet must be > 0");
        }

        if self.classifier.demographic_top_values == 0 || self.classifier.column_top_values == 0 {
            anyhow::bail!(
                "classifier.demographic_top_values and classifier.column_top_values must be > 0"
            );
        }
        let empty = self.classifier.keywords.empty_lists();
        if !empty.is_empty() {
            anyhow::bail!(
                "classifier.keywords lists must not be empty: {}",
                empty.join(", ")
            );
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

/// Load `path` when it exists, otherwise fall back to defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}
