//! SQLite storage for extraction results and the deletion list.
//!
//! [`Database`] implements [`Sink`]: results tables are created on demand with the base columns
//! and grow a `TEXT` column for every field an extractor declares. The deletion table
//! (`lib_delete` by default) is created by the migration applied on open.
//!
//! Table and column names are interpolated into SQL, so every name is checked with
//! [`validate_identifier`] and quoted before use.

use rusqlite::{params_from_iter, types::Value, Connection};

use super::*;
use crate::{
  archive::purge::DeletionSpec,
  batch::ProcessingRow,
  sink::{cells, missing_columns, Sink, ARCHIVE_COLUMN, ENTRY_COLUMN},
};

#[cfg(test)] mod tests;

/// Default name of the table holding extraction results.
pub const RESULTS_TABLE: &str = "lib_current";
/// Default name of the table listing entries to purge.
pub const DELETION_TABLE: &str = "lib_delete";

/// Main database connection handler
pub struct Database {
  /// Open connection
  conn: Connection,
}

impl Database {
  /// Opens an existing database or creates a new one at the specified path.
  ///
  /// This method will:
  /// 1. Create the database file if it doesn't exist
  /// 2. Create the deletion table if it doesn't exist
  ///
  /// # Examples
  ///
  /// ```no_run
  /// # use homelib::database::Database;
  /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
  /// // Open in a specific location
  /// let db = Database::open("homelib.db")?;
  ///
  /// // Or use the default location
  /// let db = Database::open(Database::default_path())?;
  /// # Ok(())
  /// # }
  /// ```
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn
      .execute_batch(include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/migrations/init.sql")))?;
    debug!("Opened database at {}", path.display());
    Ok(Self { conn })
  }

  /// Returns the default path for the database file.
  ///
  /// The path is constructed as follows:
  /// - On Unix: `~/.local/share/homelib/homelib.db`
  /// - On macOS: `~/Library/Application Support/homelib/homelib.db`
  /// - On Windows: `%APPDATA%\homelib\homelib.db`
  /// - Fallback: `./homelib/homelib.db` in the current directory
  pub fn default_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("homelib").join("homelib.db")
  }

  /// Columns of `table` in declaration order; empty when the table does not exist.
  pub fn columns(&self, table: &str) -> Result<Vec<String>> {
    let sql = format!("PRAGMA table_info({})", quote(table)?);
    let mut stmt = self.conn.prepare(&sql)?;
    let columns =
      stmt.query_map([], |row| row.get::<_, String>(1))?.collect::<rusqlite::Result<_>>()?;
    Ok(columns)
  }

  /// Schedules `entry` of `archive` for removal by adding it to the deletion `table`.
  ///
  /// Adding the same pair twice has no effect.
  pub fn mark_for_deletion(&mut self, table: &str, archive: &str, entry: &str) -> Result<()> {
    let sql = format!(
      "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
      quote(table)?,
      quote(ARCHIVE_COLUMN)?,
      quote(ENTRY_COLUMN)?
    );
    self.conn.execute(&sql, [archive, entry])?;
    Ok(())
  }

  /// Reads the deletion `table` into a [`DeletionSpec`].
  pub fn deletion_spec(&mut self, table: &str) -> Result<DeletionSpec> {
    let rows = self.select(table, &[ARCHIVE_COLUMN, ENTRY_COLUMN])?;
    let spec = DeletionSpec::from_pairs(
      rows
        .into_iter()
        .filter_map(|row| <[String; 2]>::try_from(row).ok())
        .map(|[archive, entry]| (archive, entry)),
    );
    info!("{} entries in {} archives scheduled for deletion", spec.len(), spec.archives().count());
    Ok(spec)
  }
}

/// Checks that `name` can be used as a quoted table or column name.
///
/// Field names come from document tags, so anything is accepted except the empty name, double
/// quotes, control characters and SQLite's reserved `sqlite_` prefix.
pub fn validate_identifier(name: &str) -> Result<&str> {
  let valid = !name.is_empty()
    && !name.to_ascii_lowercase().starts_with("sqlite_")
    && !name.chars().any(|c| c == '"' || c.is_control());
  if valid {
    Ok(name)
  } else {
    Err(HomelibError::InvalidIdentifier(name.to_string()))
  }
}

/// Validates and double-quotes an identifier for interpolation into SQL.
fn quote(name: &str) -> Result<String> { Ok(format!("\"{}\"", validate_identifier(name)?)) }

/// Renders a stored value as text; `NULL` becomes the empty string.
fn to_text(value: Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::Integer(i) => i.to_string(),
    Value::Real(r) => r.to_string(),
    Value::Text(s) => s,
    Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
  }
}

impl Sink for Database {
  fn select(&mut self, table: &str, columns: &[&str]) -> Result<Vec<Vec<String>>> {
    let projection = columns.iter().map(|c| quote(c)).collect::<Result<Vec<_>>>()?.join(", ");
    let sql = format!("SELECT {projection} FROM {} ORDER BY rowid", quote(table)?);
    let mut stmt = self.conn.prepare(&sql)?;
    let rows = stmt
      .query_map([], |row| {
        (0..columns.len()).map(|i| row.get::<_, Value>(i).map(to_text)).collect()
      })?
      .collect::<rusqlite::Result<Vec<Vec<String>>>>()?;
    trace!("Selected {} rows from {table}", rows.len());
    Ok(rows)
  }

  fn reconcile(&mut self, table: &str, fields: &[String]) -> Result<()> {
    let quoted = quote(table)?;
    let tx = self.conn.transaction()?;
    tx.execute_batch(&format!(
      "CREATE TABLE IF NOT EXISTS {quoted} (
         zipfile         TEXT NOT NULL,
         xml_filename    TEXT NOT NULL,
         has_description INTEGER,
         error_kind      TEXT,
         error           TEXT
       )"
    ))?;

    let existing: Vec<String> = {
      let mut stmt = tx.prepare(&format!("PRAGMA table_info({quoted})"))?;
      let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
      names.collect::<rusqlite::Result<_>>()?
    };
    let missing = missing_columns(existing.iter().map(String::as_str), fields);
    for column in &missing {
      tx.execute(&format!("ALTER TABLE {quoted} ADD COLUMN {} TEXT", quote(column)?), [])?;
    }
    tx.commit()?;

    if !missing.is_empty() {
      debug!("Added {} columns to {table}", missing.len());
    }
    Ok(())
  }

  fn insert(&mut self, table: &str, rows: &[ProcessingRow]) -> Result<usize> {
    let quoted = quote(table)?;
    let tx = self.conn.transaction()?;
    for row in rows {
      let (names, values): (Vec<_>, Vec<Option<String>>) = cells(row).into_iter().unzip();
      let names = names.iter().map(|name| quote(name)).collect::<Result<Vec<_>>>()?;
      let placeholders = (1..=names.len()).map(|i| format!("?{i}")).collect::<Vec<_>>();
      let sql = format!(
        "INSERT INTO {quoted} ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
      );
      tx.prepare_cached(&sql)?.execute(params_from_iter(values))?;
    }
    tx.commit()?;
    trace!("Inserted {} rows into {table}", rows.len());
    Ok(rows.len())
  }
}
