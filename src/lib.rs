//! # Bundle Insights
//!
//! Turns audience-research export bundles into normalized, categorized
//! insight structures.
//!
//! A bundle is a ZIP archive of whatever a third-party research tool
//! exported: CSV tables, XLSX workbooks, PDF reports, chart images and
//! plain-text notes, with unknown schemas and mixed encodings. Each file is
//! parsed, its tables are matched to one of a few known shapes, and the
//! resulting fragments are filed under demographics, psychographics, media
//! consumption and brand affinity.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌────────────┐
//! │ archive  │──▶│ filetype  │──▶│ parsers  │──▶│ classifier │
//! │ (unpack) │   │ (resolve) │   │ csv/xlsx │   │  (core)    │
//! └──────────┘   └───────────┘   │ pdf/img  │   └─────┬──────┘
//!                                │ text     │         │
//!                                └──────────┘         ▼
//!                                               ┌────────────┐
//!                                               │ aggregator │──▶ ParsedArchiveResult
//!                                               └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! bix parse export.zip --pretty     # full archive run
//! bix inspect audience.csv          # one file's intermediate record
//! bix formats                       # supported extensions
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`archive`] | ZIP extraction into a scratch directory |
//! | [`filetype`] | Member metadata and type labels |
//! | [`parsers`] | Per-format parsers and the intermediate record |
//! | [`ingest`] | Archive run orchestration |
//! | [`error`] | Error types |

pub mod archive;
pub mod config;
pub mod error;
pub mod filetype;
pub mod ingest;
pub mod parsers;

pub use ingest::{Ingestor, ParsedArchiveResult};
