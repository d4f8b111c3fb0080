//! Error types for the homelib library.
//!
//! This module provides one error type covering every failure mode of the library:
//! - Malformed FB2/XML input
//! - Archive access and rewriting
//! - Sink (SQLite) operations
//! - Configuration loading
//! - Programming mistakes such as dispatching to an unregistered extractor
//!
//! Not every error ends a run. Entry-scoped failures are turned into diagnostic rows by the
//! [`batch`](crate::batch) module, using [`HomelibError::kind`] to classify them.
//!
//! # Examples
//!
//! ```
//! use homelib::{
//!   error::HomelibError,
//!   extract::{Options, Registry},
//! };
//!
//! let registry = Registry::new();
//! match registry.dispatch("no-such-extractor", None, &Options::default()) {
//!   Err(HomelibError::UnknownExtractor(name)) => assert_eq!(name, "no-such-extractor"),
//!   other => panic!("unexpected: {other:?}"),
//! }
//! ```

use thiserror::Error;

use super::*;

/// Error type alias used for the [`homelib`](crate) crate.
pub type Result<T> = core::result::Result<T, HomelibError>;

/// Errors that can occur when working with the homelib library.
#[derive(Error, Debug)]
pub enum HomelibError {
  /// A document could not be parsed as XML.
  ///
  /// The message carries the parser diagnostic and the byte offset where parsing stopped.
  #[error("XML parse error: {0}")]
  Parse(String),

  /// An extractor name was looked up that is not in the registry.
  ///
  /// This indicates a configuration or programming mistake, never bad input data.
  #[error("No extractor registered under the name \"{0}\"")]
  UnknownExtractor(String),

  /// An extractor was requested without an option it requires.
  #[error("Extractor \"{extractor}\" requires the \"{option}\" option")]
  MissingOption {
    /// The extractor that was requested
    extractor: String,
    /// The option that was not supplied
    option:    &'static str,
  },

  /// A ZIP archive could not be opened, read or written.
  #[error(transparent)]
  Zip(#[from] zip::result::ZipError),

  /// A file system operation failed.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// A SQLite operation failed.
  ///
  /// Sink errors are fatal for a whole run.
  #[error(transparent)]
  Sqlite(#[from] rusqlite::Error),

  /// A rewritten archive could not be moved over the original.
  #[error(transparent)]
  Persist(#[from] tempfile::PersistError),

  /// Rewriting an archive during a purge failed.
  ///
  /// The original archive is left untouched whenever this is returned.
  #[error("Failed to purge archive {archive}: {source}")]
  Purge {
    /// File name of the archive being rewritten
    archive: String,
    /// The underlying failure
    #[source]
    source:  Box<HomelibError>,
  },

  /// A table or column name cannot be used as an SQL identifier.
  #[error("Invalid identifier: {0:?}")]
  InvalidIdentifier(String),

  /// The configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// The configuration could not be serialized.
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),

  /// JSON output could not be produced.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// A glob pattern for archive discovery was invalid.
  #[error(transparent)]
  Pattern(#[from] glob::PatternError),

  /// The configuration is unusable, or a sink was asked for a table or column it does not have.
  #[error("{0}")]
  Config(String),
}

/// Classification of a failure recorded in a diagnostic row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  /// Malformed XML in an entry.
  Parse,
  /// The entry's bytes could not be read from the archive.
  ArchiveRead,
  /// Anything else.
  Other,
}

impl Display for ErrorKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ErrorKind::Parse => write!(f, "parse"),
      ErrorKind::ArchiveRead => write!(f, "archive_read"),
      ErrorKind::Other => write!(f, "other"),
    }
  }
}

impl HomelibError {
  /// Classifies this error for a diagnostic row.
  pub fn kind(&self) -> ErrorKind {
    match self {
      HomelibError::Parse(_) => ErrorKind::Parse,
      HomelibError::Zip(_) | HomelibError::Path(_) => ErrorKind::ArchiveRead,
      _ => ErrorKind::Other,
    }
  }
}
