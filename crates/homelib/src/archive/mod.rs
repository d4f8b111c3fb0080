//! Archive enumeration.
//!
//! A library directory holds ZIP archives side by side; each archive holds FB2 entries (and
//! sometimes other files). This module finds the archives in a directory and the matching
//! entries within an archive, always in a stable order.

use std::{fs::File, io::BufReader};

use zip::ZipArchive;

use super::*;

pub mod purge;

/// An open archive reader.
pub type Archive = ZipArchive<BufReader<File>>;

/// Opens an archive for reading.
pub fn open(path: impl AsRef<Path>) -> Result<Archive> {
  let file = File::open(path.as_ref())?;
  Ok(ZipArchive::new(BufReader::new(file))?)
}

/// Archive file name (without directory) as recorded in result rows.
pub fn archive_name(path: &Path) -> String {
  path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Matches file names by extension, ignoring ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
  /// Extension without the leading dot
  extension: String,
}

impl ExtensionFilter {
  /// Filter for names ending in `.{extension}`.
  pub fn new(extension: impl Into<String>) -> Self {
    Self { extension: extension.into().trim_start_matches('.').to_string() }
  }

  /// Filter for FB2 documents.
  pub fn fb2() -> Self { Self::new("fb2") }

  /// Filter for ZIP archives.
  pub fn zip() -> Self { Self::new("zip") }

  /// The extension matched, without the dot.
  pub fn extension(&self) -> &str { &self.extension }

  /// Whether `name` is a file (not a directory entry) with the wanted extension.
  pub fn matches(&self, name: &str) -> bool {
    !name.ends_with('/')
      && Path::new(name).extension().is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
  }
}

impl Default for ExtensionFilter {
  fn default() -> Self { Self::fb2() }
}

/// Archives directly inside `directory` (not recursive), sorted by name.
///
/// Only regular files with the filter's extension are returned.
pub fn archives_in(directory: impl AsRef<Path>, filter: &ExtensionFilter) -> Result<Vec<PathBuf>> {
  let directory = directory.as_ref();
  if !directory.is_dir() {
    return Err(HomelibError::Path(std::io::Error::new(
      std::io::ErrorKind::NotFound,
      format!("{} is not a directory", directory.display()),
    )));
  }

  let pattern = Path::new(&glob::Pattern::escape(&directory.to_string_lossy()))
    .join(format!("*.{}", glob::Pattern::escape(filter.extension())));
  let options = glob::MatchOptions { case_sensitive: false, ..Default::default() };

  let mut archives: Vec<PathBuf> = glob::glob_with(&pattern.to_string_lossy(), options)?
    .filter_map(|entry| match entry {
      Ok(path) => Some(path),
      Err(e) => {
        warn!("Skipping unreadable directory entry: {e}");
        None
      },
    })
    .filter(|path| path.is_file())
    .filter(|path| filter.matches(&path.to_string_lossy()))
    .collect();
  archives.sort();
  debug!("Found {} archives in {}", archives.len(), directory.display());
  Ok(archives)
}

/// Names of the entries in `archive` accepted by `filter`, in archive order.
pub fn entries(archive: &Archive, filter: &ExtensionFilter) -> Vec<String> {
  (0..archive.len())
    .filter_map(|index| archive.name_for_index(index))
    .filter(|name| filter.matches(name))
    .map(str::to_string)
    .collect()
}
