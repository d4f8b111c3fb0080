use homelib::archive::{archive_name, archives_in};

use super::*;

pub mod extract;
pub mod init;
pub mod purge;
pub mod survey;
pub mod values;

pub use extract::{extract, ExtractOptions};
pub use init::{init, InitOptions};
pub use purge::{purge, PurgeOptions};
pub use survey::{survey, SurveyOptions};
pub use values::{values, ValuesOptions};

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Write a configuration file
  Init(InitOptions),

  /// Run a field extractor over every FB2 entry of a directory of archives
  Extract(ExtractOptions),

  /// Record the root element and namespace declarations of every FB2 entry
  Survey(SurveyOptions),

  /// Remove the entries listed in the deletion table from their archives
  Purge(PurgeOptions),

  /// List the distinct values stored in a column
  Values(ValuesOptions),
}

/// The directory to process: `dir` when given, otherwise the directory of an archive the user
/// picks from the library. `None` when the user backed out of the selection.
fn library_directory<I: UserInteraction>(
  interaction: &I,
  dir: Option<&Path>,
  config: &Config,
) -> Result<Option<PathBuf>> {
  if let Some(dir) = dir {
    return Ok(Some(dir.to_path_buf()));
  }

  let archives = archives_in(&config.library_path, &config.filters().archives)?;
  if archives.is_empty() {
    return Err(CliError::NoArchives(config.library_path.clone()));
  }
  let names: Vec<String> = archives.iter().map(|path| archive_name(path)).collect();
  let chosen = interaction
    .select("Select an archive in the working directory", &names)?
    .and_then(|index| archives.get(index))
    .map(|path| path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf));
  if let Some(directory) = &chosen {
    debug!("Processing directory {}", directory.display());
  }
  Ok(chosen)
}
