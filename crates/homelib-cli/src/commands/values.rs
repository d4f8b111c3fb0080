use homelib::sink::distinct_values;

use super::*;

#[derive(Args, Clone)]
pub struct ValuesOptions {
  /// Column to read, e.g. genre or lang
  #[arg(long, short)]
  pub column: String,
  /// Table to read; the configured results table by default
  #[arg(long, short)]
  pub table:  Option<String>,
}

/// Function for the [`Commands::Values`] in the CLI.
pub fn values(cli: &Cli, options: &ValuesOptions) -> Result<()> {
  let config = cli.load_config()?;
  let table = options.table.as_deref().unwrap_or(&config.results_table);
  let mut db = Database::open(&config.database_path)?;

  let values = distinct_values(&mut db, table, &options.column)?;
  cli.reply(ResponseContent::Values(&values))
}
