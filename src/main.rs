//! # Bundle Insights CLI (`bix`)
//!
//! Runs export bundles through the ingestion pipeline and prints the result
//! as JSON on stdout. Logs go to stderr.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `bix parse <archive>` | Process a ZIP bundle, print `ParsedArchiveResult` |
//! | `bix inspect <file>` | Parse one file, print its intermediate record |
//! | `bix formats` | List supported extensions |
//!
//! ## Examples
//!
//! ```bash
//! bix parse ./export.zip --pretty
//! bix --config ./config/bix.toml parse ./export.zip
//! RUST_LOG=bundle_insights=debug bix inspect ./audience.xlsx
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use bundle_insights::config;
use bundle_insights::filetype::type_label;
use bundle_insights::Ingestor;
use bundle_insights_core::models::FileFormat;
use clap::{Parser, Subcommand};
use serde::Serialize;

/// Turns audience-research export bundles into categorized insight JSON.
#[derive(Parser)]
#[command(name = "bix", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when it is absent.
    #[arg(long, global = true, default_value = "./config/bix.toml")]
    config: PathBuf,

    /// Debug-level logging on stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a ZIP export bundle.
    ///
    /// Exits with status 1 when the archive cannot be opened or unpacked;
    /// per-file failures are reported in the output and do not change the
    /// exit status.
    Parse {
        /// Path to the ZIP archive.
        archive: PathBuf,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Parse a single file outside any archive.
    Inspect {
        /// Path to a CSV, XLSX, PDF, PNG/JPEG or TXT file.
        file: PathBuf,

        #[arg(long)]
        pretty: bool,
    },

    /// List supported file extensions.
    Formats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Formats => {
            print_formats();
            Ok(())
        }
        Commands::Parse { archive, pretty } => {
            let ingestor = Ingestor::new(config::load_or_default(&cli.config)?);
            let result = ingestor.process_archive(&archive);
            print_json(&result, pretty)?;
            if !result.success {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Inspect { file, pretty } => {
            let ingestor = Ingestor::new(config::load_or_default(&cli.config)?);
            let record = ingestor
                .parse_single_file(&file)
                .with_context(|| unsupported(&file))?;
            print_json(&record, pretty)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("bundle_insights=debug,bundle_insights_core=debug,bix=debug,warn")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("bundle_insights=info,bundle_insights_core=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn unsupported(file: &Path) -> String {
    format!(
        "No parser for {} (supported: {})",
        file.display(),
        FileFormat::ALL
            .iter()
            .flat_map(|f| f.extensions().iter().copied())
            .collect::<Vec<_>>()
            .join(", ")
    )
}

fn print_formats() {
    println!("{:<10} {:<10} LABEL", "EXTENSION", "PARSER");
    for format in FileFormat::ALL {
        for ext in format.extensions() {
            println!("{:<10} {:<10} {}", ext, format.as_str(), type_label(ext, ""));
        }
    }
}
