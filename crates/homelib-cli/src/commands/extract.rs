//! Extraction over a directory of archives.

use std::{fs::File, io::BufWriter};

use homelib::{
  batch::{process_directory_with, Job, Output, Processed},
  extract::{Options, Registry},
};

use super::*;

#[derive(Args, Clone)]
pub struct ExtractOptions {
  /// Extractor to run: taglist, numbered, joined, authors, compact or catalog
  #[arg(long, short)]
  pub extractor: String,
  /// Tag captured by the numbered and joined extractors
  #[arg(long, short)]
  pub tag:       Option<String>,
  /// Directory of archives; asks to pick an archive in the library when omitted
  #[arg(long)]
  pub dir:       Option<PathBuf>,
  /// Store each archive's rows in the database as soon as it is done
  #[arg(long, conflicts_with = "json")]
  pub stream:    bool,
  /// Table receiving streamed rows; the configured results table by default
  #[arg(long, requires = "stream")]
  pub table:     Option<String>,
  /// Write every row to this file as JSON
  #[arg(long)]
  pub json:      Option<PathBuf>,
}

/// Function for the [`Commands::Extract`] in the CLI.
pub fn extract(cli: &Cli, options: &ExtractOptions) -> Result<()> {
  let registry = Registry::new();
  let extractor = registry.resolve(&options.extractor, &Options { tag: options.tag.clone() })?;
  run_job(
    cli,
    &Job::Extract(extractor),
    options.dir.as_deref(),
    options.stream.then(|| options.table.as_deref()),
    options.json.as_deref(),
  )
}

/// Runs `job` over the chosen directory, then reports, stores or dumps the rows.
///
/// With `stream` set, rows go to the given table, or to the configured results table when no
/// table is named.
pub(crate) fn run_job(
  cli: &Cli,
  job: &Job,
  dir: Option<&Path>,
  stream: Option<Option<&str>>,
  json: Option<&Path>,
) -> Result<()> {
  let config = cli.load_config()?;
  let Some(directory) = library_directory(cli, dir, &config)? else {
    cli.reply(ResponseContent::Info("No archive selected, nothing to do"))?;
    return Ok(());
  };
  cli.reply(ResponseContent::Info(&format!(
    "Running {} over {}",
    job.name(),
    directory.display()
  )))?;

  let table = stream.map(|table| table.unwrap_or(&config.results_table));
  let processed = match table {
    Some(table) => {
      let mut db = Database::open(&config.database_path)?;
      process_directory_with(&directory, job, &config.filters(), Output::Stream {
        sink: &mut db,
        table,
      })?
    },
    None => process_directory_with(&directory, job, &config.filters(), Output::Accumulate)?,
  };

  match &processed {
    Processed::Table(table) => match json {
      Some(path) => {
        table.write_json(BufWriter::new(File::create(path)?))?;
        cli.reply(ResponseContent::Success(&format!(
          "Wrote {} rows to {}",
          table.rows.len(),
          path.display()
        )))?;
      },
      None => cli.reply(ResponseContent::Rows(&table.rows))?,
    },
    Processed::Streamed(_) => cli.reply(ResponseContent::Success(&format!(
      "Stored rows in table {} of {}",
      table.unwrap_or(&config.results_table),
      config.database_path.display()
    )))?,
  }
  cli.reply(ResponseContent::Report(processed.report()))
}
