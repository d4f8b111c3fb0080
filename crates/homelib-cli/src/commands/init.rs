//! Module for setting up a homelib configuration

use super::*;

#[derive(Args, Clone)]
pub struct InitOptions {
  /// Directory of archives to work on
  #[arg(long)]
  pub library: Option<PathBuf>,
}

/// Function for the [`Commands::Init`] in the CLI.
pub fn init(cli: &Cli, options: &InitOptions) -> Result<()> {
  let config_path = cli.config_path();
  if config_path.exists()
    && !cli.confirm(&format!(
      "A configuration already exists at {}, do you want to overwrite it?",
      config_path.display()
    ))?
  {
    cli.reply(ResponseContent::Info(
      "Keeping the existing configuration; pass --config to write a different one",
    ))?;
    return Ok(());
  }

  // Database location
  let config = match cli.db.as_deref() {
    Some(db) => Config::default().with_database_path(db),
    None if cli.confirm(&format!(
      "Would you like to use the default path {} for the homelib database?",
      Database::default_path().display()
    ))? =>
      Config::default(),
    None => {
      cli.reply(ResponseContent::Info(
        "Please pass in your intended database path using --db",
      ))?;
      return Ok(());
    },
  };

  // Library location
  let config = match &options.library {
    Some(library) => config.with_library_path(library),
    None => {
      let default = config.library_path.display().to_string();
      let library = cli.prompt("Directory holding the library archives", &default)?;
      config.with_library_path(library)
    },
  };

  config.save(&config_path)?;
  Database::open(&config.database_path)?;
  cli.reply(ResponseContent::Success(&format!(
    "Created homelib configuration with\nConfig path: {}\nDatabase path: {}\nLibrary path: {}",
    config_path.display(),
    config.database_path.display(),
    config.library_path.display(),
  )))?;
  Ok(())
}
