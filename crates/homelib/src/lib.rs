//! Metadata extraction and maintenance for FB2 e-book libraries stored in ZIP archives.
//!
//! `homelib` walks a directory of ZIP archives, parses every FB2 document inside them and turns
//! the `<description>` block of each document into flat, tabular records. It provides:
//!
//! - Namespace-agnostic parsing of FB2 documents into an owned element tree
//! - Location of the `<description>` metadata block and a structural survey of the root element
//! - A registry of pluggable field extractors (taglist, numbered/joined capture, authors, compact
//!   markup, composite catalog)
//! - Batch processing of archives with per-entry failure isolation
//! - Streaming of results into a SQLite-backed sink, one archive per transaction
//! - Crash-safe purging of selected entries from archives
//!
//! # Getting Started
//!
//! ```no_run
//! use homelib::{
//!   batch::{process_directory, Job, Output, Processed},
//!   extract::{Options, Registry},
//!   prelude::*,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let registry = Registry::new();
//!   let job = Job::Extract(registry.resolve("catalog", &Options::default())?);
//!
//!   if let Processed::Table(table) = process_directory("./lib", &job, Output::Accumulate)? {
//!     println!("{} rows, {} failed", table.rows.len(), table.report.entries_failed);
//!   }
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`document`]: Element tree, parsing, namespace normalization, description lookup
//! - [`extract`]: Field extractors and the name-based registry
//! - [`archive`]: Archive enumeration and the purge operation
//! - [`batch`]: Per-entry, per-archive and per-directory processing
//! - [`sink`]: The tabular sink abstraction and an in-memory implementation
//! - [`database`]: SQLite implementation of the sink
//! - [`config`]: On-disk configuration
//! - [`prelude`]: Common traits and types for ergonomic imports

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  collections::{BTreeMap, BTreeSet},
  fmt::Display,
  path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod archive;
pub mod batch;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod extract;
pub mod sink;

use crate::error::*;

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use homelib::{database::Database, prelude::*};
///
/// fn example() -> Result<(), HomelibError> {
///   let mut db = Database::open(Database::default_path())?;
///   let rows = db.select("lib_current", &["zipfile", "xml_filename"])?;
///   println!("{} rows", rows.len());
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{error::HomelibError, sink::Sink};
}
