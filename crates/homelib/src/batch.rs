//! Batch processing of archives.
//!
//! Work is organized in three levels, each isolating failures of the level below:
//!
//! - [`process_entry`] parses one FB2 entry and runs a [`Job`] on it. Any problem with the entry
//!   (unreadable bytes, malformed XML) becomes a diagnostic row instead of an error.
//! - [`process_archive`] does that for every matching entry of one archive. Only failing to open
//!   the archive itself is an error.
//! - [`process_directory`] does that for every archive in a directory, either collecting all
//!   rows into a [`Table`] or streaming each archive's rows into a [`Sink`] as one unit as soon
//!   as the archive is done. An archive that cannot be opened is counted and skipped; a sink
//!   error ends the run.
//!
//! # Examples
//!
//! ```no_run
//! use homelib::{
//!   batch::{process_directory, Job, Output, Processed},
//!   database::Database,
//!   extract::Extractor,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut db = Database::open("homelib.db")?;
//! let job = Job::Extract(Extractor::Catalog);
//!
//! let processed = process_directory("./lib", &job, Output::Stream {
//!   sink:  &mut db,
//!   table: "lib_current",
//! })?;
//! println!("{}", processed.report());
//! # Ok(())
//! # }
//! ```

use std::io::Read;

use crate::{
  archive::{Archive, ExtensionFilter},
  document::{
    locate::{locate, Survey},
    parse_document, Document,
  },
  extract::{Extractor, FieldRecord, Schema},
  sink::Sink,
};

use super::*;

/// What to compute for every entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
  /// Root tag and namespace declarations of each document.
  Survey,
  /// Run a field extractor on each document's description.
  Extract(Extractor),
}

impl Job {
  /// Short name for logs and reports.
  pub fn name(&self) -> &'static str {
    match self {
      Job::Survey => "survey",
      Job::Extract(extractor) => extractor.name(),
    }
  }

  /// Columns the job produces besides the identity and bookkeeping columns.
  pub fn schema(&self) -> Schema {
    match self {
      Job::Survey => Schema::Open,
      Job::Extract(extractor) => extractor.schema(),
    }
  }

  /// Runs the job on a parsed document. Returns the fields and whether a description was found.
  pub fn run(&self, document: &Document) -> (FieldRecord, bool) {
    let description = locate(document);
    let found = description.is_some();
    let fields = match self {
      Job::Survey => Survey::of(document).into_fields(),
      Job::Extract(extractor) => extractor.extract(description.as_ref()),
    };
    (fields, found)
  }
}

/// Why an entry produced no fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
  /// Error classification
  pub kind:    ErrorKind,
  /// Human-readable error
  pub message: String,
}

/// Result for one entry: either its fields or a diagnostic, never a partial record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
  /// The entry parsed and the job ran.
  Extracted {
    /// Extracted fields
    fields:            FieldRecord,
    /// Whether the document had a description; without one the fields are empty
    description_found: bool,
  },
  /// The entry could not be read or parsed.
  Failed(Diagnostic),
}

/// One row of output: the entry's identity and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingRow {
  /// Archive file name
  pub archive: String,
  /// Entry name inside the archive
  pub entry:   String,
  /// What came out of the entry
  pub outcome: Outcome,
}

impl ProcessingRow {
  /// Whether the entry was processed successfully.
  pub fn is_success(&self) -> bool { matches!(self.outcome, Outcome::Extracted { .. }) }

  /// The extracted fields, if any.
  pub fn fields(&self) -> Option<&FieldRecord> {
    match &self.outcome {
      Outcome::Extracted { fields, .. } => Some(fields),
      Outcome::Failed(_) => None,
    }
  }

  /// The diagnostic, if the entry failed.
  pub fn diagnostic(&self) -> Option<&Diagnostic> {
    match &self.outcome {
      Outcome::Failed(diagnostic) => Some(diagnostic),
      Outcome::Extracted { .. } => None,
    }
  }
}

/// Counts of what a batch run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
  /// Archives whose entries were all visited
  pub archives_processed:   usize,
  /// Archives that could not be opened
  pub archives_failed:      usize,
  /// Entries that produced fields
  pub entries_succeeded:    usize,
  /// Entries that produced a diagnostic
  pub entries_failed:       usize,
  /// Successful entries without a description
  pub missing_descriptions: usize,
}

impl BatchReport {
  /// Folds one archive's rows into the counts.
  fn record(&mut self, rows: &[ProcessingRow]) {
    self.archives_processed += 1;
    for row in rows {
      match &row.outcome {
        Outcome::Extracted { description_found, .. } => {
          self.entries_succeeded += 1;
          if !description_found {
            self.missing_descriptions += 1;
          }
        },
        Outcome::Failed(_) => self.entries_failed += 1,
      }
    }
  }
}

impl Display for BatchReport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{} archives processed ({} failed to open), {} entries succeeded, {} failed, {} without \
       description",
      self.archives_processed,
      self.archives_failed,
      self.entries_succeeded,
      self.entries_failed,
      self.missing_descriptions
    )
  }
}

/// All rows of a run held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
  /// Rows in archive order, then entry order
  pub rows:   Vec<ProcessingRow>,
  /// Counts for the run
  pub report: BatchReport,
}

impl Table {
  /// Field columns present in any row, in first-seen order.
  pub fn field_columns(&self) -> Vec<String> { field_columns(&self.rows) }

  /// Writes the rows to `writer` as a pretty-printed JSON array.
  pub fn write_json(&self, writer: impl std::io::Write) -> Result<()> {
    serde_json::to_writer_pretty(writer, &self.rows)?;
    Ok(())
  }
}

/// Field columns present in `rows`, in first-seen order.
pub fn field_columns(rows: &[ProcessingRow]) -> Vec<String> {
  let mut seen = BTreeSet::new();
  rows
    .iter()
    .filter_map(ProcessingRow::fields)
    .flat_map(|fields| fields.keys())
    .filter(|name| seen.insert(name.as_str()))
    .cloned()
    .collect()
}

/// Where [`process_directory`] sends its rows.
pub enum Output<'a> {
  /// Keep every row and return them as a [`Table`].
  Accumulate,
  /// Insert each archive's rows into `table` of `sink` as soon as the archive is done.
  Stream {
    /// Destination
    sink:  &'a mut dyn Sink,
    /// Destination table
    table: &'a str,
  },
}

/// Result of [`process_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
  /// Accumulated rows.
  Table(Table),
  /// Rows went to the sink; only the counts are left.
  Streamed(BatchReport),
}

impl Processed {
  /// The counts, whichever way the rows went.
  pub fn report(&self) -> &BatchReport {
    match self {
      Processed::Table(table) => &table.report,
      Processed::Streamed(report) => report,
    }
  }
}

/// Which files count as archives and which entries count as documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
  /// Archive file filter, `.zip` by default
  pub archives: ExtensionFilter,
  /// Entry filter, `.fb2` by default
  pub entries:  ExtensionFilter,
}

impl Default for Filters {
  fn default() -> Self { Self { archives: ExtensionFilter::zip(), entries: ExtensionFilter::fb2() } }
}

/// Reads and processes one entry. Never fails: problems become a diagnostic row.
pub fn process_entry(
  archive: &mut Archive,
  archive_name: &str,
  entry: &str,
  job: &Job,
) -> ProcessingRow {
  let outcome = match read_entry(archive, entry).and_then(|bytes| parse_document(&bytes)) {
    Ok(document) => {
      let (fields, description_found) = job.run(&document);
      trace!("{archive_name}/{entry}: {} fields", fields.len());
      Outcome::Extracted { fields, description_found }
    },
    Err(e) => {
      warn!("{archive_name}/{entry}: {e}");
      Outcome::Failed(Diagnostic { kind: e.kind(), message: e.to_string() })
    },
  };
  ProcessingRow { archive: archive_name.to_string(), entry: entry.to_string(), outcome }
}

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_PREALLOCATION: usize = 16 << 20;

/// Reads the full contents of an entry.
fn read_entry(archive: &mut Archive, entry: &str) -> Result<Vec<u8>> {
  let mut file = archive.by_name(entry)?;
  let capacity = usize::try_from(file.size()).unwrap_or_default().min(MAX_PREALLOCATION);
  let mut bytes = Vec::with_capacity(capacity);
  file.read_to_end(&mut bytes)?;
  Ok(bytes)
}

/// Processes every entry of one archive accepted by `filter`, in archive order.
///
/// # Errors
///
/// Only when the archive itself cannot be opened. Entry failures are rows.
pub fn process_archive(
  path: impl AsRef<Path>,
  filter: &ExtensionFilter,
  job: &Job,
) -> Result<Vec<ProcessingRow>> {
  let path = path.as_ref();
  let mut archive = archive::open(path)?;
  let name = archive::archive_name(path);
  let entries = archive::entries(&archive, filter);
  debug!("Processing {} entries of {name} with {}", entries.len(), job.name());

  Ok(entries.iter().map(|entry| process_entry(&mut archive, &name, entry, job)).collect())
}

/// Processes every archive directly inside `directory` with the default [`Filters`].
pub fn process_directory(
  directory: impl AsRef<Path>,
  job: &Job,
  output: Output<'_>,
) -> Result<Processed> {
  process_directory_with(directory, job, &Filters::default(), output)
}

/// Processes every archive directly inside `directory`.
///
/// With [`Output::Accumulate`] all rows are returned. With [`Output::Stream`] at most one
/// archive's rows are held at a time: the sink's columns are reconciled with the job's schema,
/// then each archive's rows are inserted in one call before the next archive is opened.
///
/// # Errors
///
/// When `directory` cannot be listed, and on any sink error (those are configuration problems
/// and stop the run). Unopenable archives are logged, counted and skipped.
pub fn process_directory_with(
  directory: impl AsRef<Path>,
  job: &Job,
  filters: &Filters,
  mut output: Output<'_>,
) -> Result<Processed> {
  let directory = directory.as_ref();
  let archives = archive::archives_in(directory, &filters.archives)?;
  let schema = job.schema();

  if let (Output::Stream { sink, table }, Schema::Fixed(columns)) = (&mut output, &schema) {
    sink.reconcile(table, columns)?;
  }

  let mut report = BatchReport::default();
  let mut accumulated = Vec::new();
  for path in &archives {
    let rows = match process_archive(path, &filters.entries, job) {
      Ok(rows) => rows,
      Err(e) => {
        warn!("Skipping archive {}: {e}", path.display());
        report.archives_failed += 1;
        continue;
      },
    };
    report.record(&rows);

    match &mut output {
      Output::Accumulate => accumulated.extend(rows),
      Output::Stream { sink, table } => {
        if schema == Schema::Open {
          sink.reconcile(table, &field_columns(&rows))?;
        }
        let inserted = sink.insert(table, &rows)?;
        debug!("Stored {inserted} rows from {}", path.display());
      },
    }
  }

  info!("{} over {}: {report}", job.name(), directory.display());
  Ok(match output {
    Output::Accumulate => Processed::Table(Table { rows: accumulated, report }),
    Output::Stream { .. } => Processed::Streamed(report),
  })
}
