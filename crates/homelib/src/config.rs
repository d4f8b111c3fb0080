//! On-disk configuration.
//!
//! The configuration is a small TOML file, `~/.homelib/config.toml` by default. Every field has a
//! default, so a missing file or a file naming only some fields is fine:
//!
//! ```toml
//! database_path = "/home/me/.local/share/homelib/homelib.db"
//! library_path = "./lib"
//! results_table = "lib_current"
//! deletion_table = "lib_delete"
//! entry_extension = "fb2"
//! archive_extension = "zip"
//! ```

use crate::{
  archive::ExtensionFilter,
  batch::Filters,
  database::{Database, DELETION_TABLE, RESULTS_TABLE},
};

use super::*;

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// SQLite database holding results and the deletion list
  pub database_path:     PathBuf,
  /// Directory of archives to process
  pub library_path:      PathBuf,
  /// Table extraction results are streamed into
  pub results_table:     String,
  /// Table listing `(zipfile, xml_filename)` pairs to purge
  pub deletion_table:    String,
  /// Extension of document entries inside archives
  pub entry_extension:   String,
  /// Extension of archive files in the library
  pub archive_extension: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_path:     Database::default_path(),
      library_path:      PathBuf::from("./lib"),
      results_table:     RESULTS_TABLE.to_string(),
      deletion_table:    DELETION_TABLE.to_string(),
      entry_extension:   "fb2".to_string(),
      archive_extension: "zip".to_string(),
    }
  }
}

impl Config {
  /// `~/.homelib/config.toml`, or `./.homelib/config.toml` without a home directory.
  pub fn default_path() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".homelib").join("config.toml")
  }

  /// Replaces the database path.
  pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.database_path = path.into();
    self
  }

  /// Replaces the library path.
  pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.library_path = path.into();
    self
  }

  /// Reads the configuration at `path`. A missing file yields the defaults.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if !path.exists() {
      debug!("No configuration at {}, using defaults", path.display());
      return Ok(Self::default());
    }
    let content = std::fs::read_to_string(path)?;
    let config = Self::from_toml(&content)?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
  }

  /// Parses a configuration from TOML text and checks it.
  pub fn from_toml(content: &str) -> Result<Self> {
    let config: Self = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Writes the configuration to `path`, creating parent directories as needed.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(self)?)?;
    info!("Saved configuration to {}", path.display());
    Ok(())
  }

  /// Archive and entry filters built from the configured extensions.
  pub fn filters(&self) -> Filters {
    Filters {
      archives: ExtensionFilter::new(&self.archive_extension),
      entries:  ExtensionFilter::new(&self.entry_extension),
    }
  }

  /// Rejects settings no command could work with.
  fn validate(&self) -> Result<()> {
    for (name, value) in [
      ("results_table", &self.results_table),
      ("deletion_table", &self.deletion_table),
      ("entry_extension", &self.entry_extension),
      ("archive_extension", &self.archive_extension),
    ] {
      if value.trim().is_empty() {
        return Err(HomelibError::Config(format!("{name} must not be empty")));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::load(dir.path().join("config.toml")).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.results_table, "lib_current");
  }

  #[test]
  fn test_partial_file() {
    let config = Config::from_toml("library_path = \"/srv/books\"\n").unwrap();
    assert_eq!(config.library_path, PathBuf::from("/srv/books"));
    assert_eq!(config.deletion_table, "lib_delete");
  }

  #[test]
  fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config =
      Config::default().with_database_path(dir.path().join("h.db")).with_library_path("books");

    config.save(&path).unwrap();
    assert_eq!(Config::load(&path).unwrap(), config);
  }

  #[test]
  fn test_rejects_empty_table() {
    let result = Config::from_toml("results_table = \"\"");
    assert!(matches!(result, Err(HomelibError::Config(_))));
  }

  #[test]
  fn test_filters_follow_extensions() {
    let config = Config::from_toml("entry_extension = \"xml\"").unwrap();
    let filters = config.filters();
    assert!(filters.entries.matches("book.XML"));
    assert!(filters.archives.matches("a.zip"));
  }
}
