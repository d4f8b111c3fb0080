//! Errors of the command line front end.

use thiserror::Error;

use super::*;

/// Result alias for CLI commands.
pub type Result<T> = core::result::Result<T, CliError>;

/// Everything a command can fail with.
#[derive(Error, Debug)]
pub enum CliError {
  /// Failure inside the library.
  #[error(transparent)]
  Homelib(#[from] HomelibError),

  /// A prompt could not be shown or answered.
  #[error(transparent)]
  Dialoguer(#[from] dialoguer::Error),

  /// Writing output failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// The library directory holds nothing to pick from.
  #[error("No archives found in {0}")]
  NoArchives(PathBuf),

  /// Some archives could not be purged; they were left unchanged.
  #[error("{0} archive(s) could not be purged and were left unchanged")]
  PurgeFailed(usize),
}
