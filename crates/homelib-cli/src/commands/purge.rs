//! Removing the scheduled entries from the library archives.

use homelib::archive::purge::{purge as purge_archives, PurgeOptions as ArchivePurgeOptions};

use super::*;

#[derive(Args, Clone)]
pub struct PurgeOptions {
  /// Directory of archives; asks to pick an archive in the library when omitted
  #[arg(long)]
  pub dir:     Option<PathBuf>,
  /// Only show what would be removed
  #[arg(long)]
  pub dry_run: bool,
}

/// Function for the [`Commands::Purge`] in the CLI.
pub fn purge(cli: &Cli, options: &PurgeOptions) -> Result<()> {
  let config = cli.load_config()?;
  let mut db = Database::open(&config.database_path)?;
  let spec = db.deletion_spec(&config.deletion_table)?;
  if spec.is_empty() {
    cli.reply(ResponseContent::Info(&format!(
      "Nothing scheduled for deletion in table {}",
      config.deletion_table
    )))?;
    return Ok(());
  }

  let Some(directory) = library_directory(cli, options.dir.as_deref(), &config)? else {
    cli.reply(ResponseContent::Info("No archive selected, nothing to do"))?;
    return Ok(());
  };

  let mut archive_options = ArchivePurgeOptions::default();
  if options.dry_run {
    archive_options = archive_options.dry_run();
  } else if !cli.confirm(&format!(
    "Remove {} entries from {} archives in {}? This rewrites the archives.",
    spec.len(),
    spec.archives().count(),
    directory.display()
  ))? {
    cli.reply(ResponseContent::Warning("Operation cancelled"))?;
    return Ok(());
  }

  let report = purge_archives(&directory, &spec, archive_options)?;
  cli.reply(ResponseContent::Purge(&report))?;

  match report.failures().count() {
    0 => Ok(()),
    failed => Err(CliError::PurgeFailed(failed)),
  }
}
