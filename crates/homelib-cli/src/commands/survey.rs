use homelib::batch::Job;

use super::*;

#[derive(Args, Clone)]
pub struct SurveyOptions {
  /// Directory of archives; asks to pick an archive in the library when omitted
  #[arg(long)]
  pub dir:    Option<PathBuf>,
  /// Store each archive's rows in the database as soon as it is done
  #[arg(long, conflicts_with = "json")]
  pub stream: bool,
  /// Table receiving streamed rows; the configured results table by default
  #[arg(long, requires = "stream")]
  pub table:  Option<String>,
  /// Write every row to this file as JSON
  #[arg(long)]
  pub json:   Option<PathBuf>,
}

/// Function for the [`Commands::Survey`] in the CLI.
pub fn survey(cli: &Cli, options: &SurveyOptions) -> Result<()> {
  extract::run_job(
    cli,
    &Job::Survey,
    options.dir.as_deref(),
    options.stream.then(|| options.table.as_deref()),
    options.json.as_deref(),
  )
}
