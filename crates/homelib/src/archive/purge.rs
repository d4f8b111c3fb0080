//! Removing selected entries from archives.
//!
//! A purge never edits an archive in place. For every archive with something to delete, the
//! entries that stay are copied raw (still compressed, byte for byte, in their original order)
//! into a temporary file next to the archive. Only when that copy has been completely written
//! and synced is the temporary file renamed over the original. On any failure the temporary
//! file is removed and the original is left exactly as it was.
//!
//! # Examples
//!
//! ```no_run
//! use homelib::archive::purge::{purge, DeletionSpec, PurgeOptions};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = DeletionSpec::from_pairs([("fb2-000001-000100.zip", "000042.fb2")]);
//!
//! // Preview first
//! let preview = purge("./lib", &spec, PurgeOptions::default().dry_run())?;
//! println!("Would remove {} entries", preview.entries_removed());
//!
//! let report = purge("./lib", &spec, PurgeOptions::default())?;
//! assert!(report.failures().next().is_none());
//! # Ok(())
//! # }
//! ```

use std::io::Write;

use zip::ZipWriter;

use super::*;

/// Entries to delete, grouped by archive file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionSpec {
  /// Archive name to the entry names to delete from it
  by_archive: BTreeMap<String, BTreeSet<String>>,
}

impl DeletionSpec {
  /// An empty specification.
  pub fn new() -> Self { Self::default() }

  /// Builds a specification from `(archive, entry)` pairs.
  pub fn from_pairs<A, E>(pairs: impl IntoIterator<Item = (A, E)>) -> Self
  where
    A: Into<String>,
    E: Into<String>, {
    let mut spec = Self::new();
    for (archive, entry) in pairs {
      spec.add(archive, entry);
    }
    spec
  }

  /// Marks `entry` of `archive` for deletion.
  pub fn add(&mut self, archive: impl Into<String>, entry: impl Into<String>) {
    self.by_archive.entry(archive.into()).or_default().insert(entry.into());
  }

  /// Archives with at least one deletion, with their entries.
  pub fn archives(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
    self.by_archive.iter().map(|(archive, entries)| (archive.as_str(), entries))
  }

  /// Total number of `(archive, entry)` pairs.
  pub fn len(&self) -> usize { self.by_archive.values().map(BTreeSet::len).sum() }

  /// Whether nothing is marked for deletion.
  pub fn is_empty(&self) -> bool { self.by_archive.is_empty() }
}

/// Options for [`purge`], in the spirit of a guarded delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeOptions {
  /// Only report what would be removed; no archive is opened for writing
  pub dry_run: bool,
}

impl PurgeOptions {
  /// Enables dry run mode.
  pub fn dry_run(mut self) -> Self {
    self.dry_run = true;
    self
  }
}

/// What happened to one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
  /// The archive was rewritten without the listed entries (or would be, in a dry run).
  Rewritten {
    /// Entries removed
    removed:   Vec<String>,
    /// Entries kept
    kept:      usize,
    /// Requested deletions that were not in the archive
    not_found: Vec<String>,
  },
  /// None of the requested entries exist in the archive; it was not touched.
  Untouched {
    /// Requested deletions, none of which were in the archive
    not_found: Vec<String>,
  },
  /// The archive file does not exist in the directory.
  Missing,
  /// Rewriting failed; the original is unchanged.
  Failed {
    /// Error description
    message: String,
  },
}

/// Per-archive results of a purge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
  /// Whether this was a dry run
  pub dry_run:  bool,
  /// Outcome per archive name
  pub archives: BTreeMap<String, ArchiveOutcome>,
}

impl PurgeReport {
  /// Number of entries removed (or that would be removed).
  pub fn entries_removed(&self) -> usize {
    self
      .archives
      .values()
      .map(|outcome| match outcome {
        ArchiveOutcome::Rewritten { removed, .. } => removed.len(),
        _ => 0,
      })
      .sum()
  }

  /// Archives whose rewrite failed, with the error.
  pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
    self.archives.iter().filter_map(|(archive, outcome)| match outcome {
      ArchiveOutcome::Failed { message } => Some((archive.as_str(), message.as_str())),
      _ => None,
    })
  }
}

/// Removes the entries named in `spec` from the archives in `directory`.
///
/// Archives are handled independently: a failure is recorded in the report and the remaining
/// archives are still processed. Archives that are not named in `spec`, or for which none of the
/// named entries exist, are never opened for writing.
///
/// # Errors
///
/// Only when `directory` itself is not a directory. Per-archive failures are reported in the
/// returned [`PurgeReport`].
pub fn purge(
  directory: impl AsRef<Path>,
  spec: &DeletionSpec,
  options: PurgeOptions,
) -> Result<PurgeReport> {
  let directory = directory.as_ref();
  if !directory.is_dir() {
    return Err(HomelibError::Path(std::io::Error::new(
      std::io::ErrorKind::NotFound,
      format!("{} is not a directory", directory.display()),
    )));
  }

  let mut report = PurgeReport { dry_run: options.dry_run, ..Default::default() };
  for (archive, entries) in spec.archives() {
    let path = directory.join(archive);
    let outcome = if !path.is_file() {
      warn!("Archive {} listed for deletion does not exist", path.display());
      ArchiveOutcome::Missing
    } else {
      match purge_archive(&path, entries, options) {
        Ok(outcome) => outcome,
        Err(e) => {
          warn!("Purge of {} failed, original kept: {e}", path.display());
          ArchiveOutcome::Failed { message: e.to_string() }
        },
      }
    };
    report.archives.insert(archive.to_string(), outcome);
  }

  info!(
    "Purge finished: {} entries removed from {} archives, {} failures",
    report.entries_removed(),
    report
      .archives
      .values()
      .filter(|outcome| matches!(outcome, ArchiveOutcome::Rewritten { .. }))
      .count(),
    report.failures().count()
  );
  Ok(report)
}

/// Purges one archive. The archive is opened read-only first; it is only rewritten when at least
/// one of `deletions` is present.
pub fn purge_archive(
  path: &Path,
  deletions: &BTreeSet<String>,
  options: PurgeOptions,
) -> Result<ArchiveOutcome> {
  let names = {
    let archive = open(path)?;
    (0..archive.len())
      .filter_map(|index| archive.name_for_index(index).map(str::to_string))
      .collect::<BTreeSet<_>>()
  };

  let (present, not_found): (Vec<String>, Vec<String>) =
    deletions.iter().cloned().partition(|entry| names.contains(entry));

  if present.is_empty() {
    debug!("Nothing to delete in {}", path.display());
    return Ok(ArchiveOutcome::Untouched { not_found });
  }

  let kept = if options.dry_run {
    names.len() - present.len()
  } else {
    rewrite(path, deletions).map_err(|e| HomelibError::Purge {
      archive: archive_name(path),
      source:  Box::new(e),
    })?
  };

  debug!("Removed {} entries from {}, kept {kept}", present.len(), path.display());
  Ok(ArchiveOutcome::Rewritten { removed: present, kept, not_found })
}

/// Copies every entry not in `deletions` into a temporary archive beside `path` and atomically
/// replaces `path` with it. Returns the number of entries kept.
///
/// The temporary file is deleted on every error path when it goes out of scope.
fn rewrite(path: &Path, deletions: &BTreeSet<String>) -> Result<usize> {
  let directory = path.parent().unwrap_or_else(|| Path::new("."));
  let mut staged = tempfile::Builder::new()
    .prefix(&format!(".{}.", archive_name(path)))
    .suffix(".purge")
    .tempfile_in(directory)?;

  let kept = {
    let mut source = open(path)?;
    let mut writer = ZipWriter::new(staged.as_file_mut());
    let mut kept = 0;
    for index in 0..source.len() {
      let entry = source.by_index_raw(index)?;
      if deletions.contains(entry.name()) {
        trace!("Dropping {}", entry.name());
        continue;
      }
      writer.raw_copy_file(entry)?;
      kept += 1;
    }
    writer.finish()?.flush()?;
    kept
  };

  staged.as_file().sync_all()?;
  staged.persist(path)?;
  Ok(kept)
}
