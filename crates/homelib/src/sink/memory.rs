use super::*;

/// One in-memory table.
#[derive(Debug, Clone, Default)]
struct MemoryTable {
  /// Column names in creation order
  columns: Vec<String>,
  /// Rows by column name
  rows:    Vec<BTreeMap<String, String>>,
}

impl MemoryTable {
  /// The table's spelling of `column`, matched by [`column_key`].
  fn column(&self, column: &str) -> Option<&str> {
    let key = column_key(column);
    self.columns.iter().find(|c| column_key(c) == key).map(String::as_str)
  }
}

/// A [`Sink`] that keeps its tables in memory.
///
/// Column names are matched ignoring ASCII case, as in SQLite.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
  /// Tables by name
  tables: BTreeMap<String, MemoryTable>,
}

impl MemorySink {
  /// An empty sink.
  pub fn new() -> Self { Self::default() }

  /// Column names of `table`, if it exists.
  pub fn columns(&self, table: &str) -> Option<&[String]> {
    self.tables.get(table).map(|t| t.columns.as_slice())
  }

  /// Number of rows in `table`; zero when it does not exist.
  pub fn len(&self, table: &str) -> usize { self.tables.get(table).map_or(0, |t| t.rows.len()) }

  /// Looks up an existing table.
  fn table(&self, table: &str) -> Result<&MemoryTable> {
    self.tables.get(table).ok_or_else(|| HomelibError::Config(format!("no such table: {table}")))
  }
}

impl Sink for MemorySink {
  fn select(&mut self, table: &str, columns: &[&str]) -> Result<Vec<Vec<String>>> {
    let table = self.table(table)?;
    let resolved = columns
      .iter()
      .map(|c| {
        table.column(c).ok_or_else(|| HomelibError::Config(format!("no such column: {c}")))
      })
      .collect::<Result<Vec<_>>>()?;
    Ok(
      table
        .rows
        .iter()
        .map(|row| resolved.iter().map(|c| row.get(*c).cloned().unwrap_or_default()).collect())
        .collect(),
    )
  }

  fn reconcile(&mut self, table: &str, fields: &[String]) -> Result<()> {
    let table = self.tables.entry(table.to_string()).or_insert_with(|| MemoryTable {
      columns: BASE_COLUMNS.iter().map(|c| c.to_string()).collect(),
      rows:    Vec::new(),
    });
    let missing = missing_columns(table.columns.iter().map(String::as_str), fields);
    table.columns.extend(missing);
    Ok(())
  }

  fn insert(&mut self, table: &str, rows: &[ProcessingRow]) -> Result<usize> {
    let target = self.table(table)?;
    let mut staged = Vec::with_capacity(rows.len());
    for row in rows {
      let mut stored = BTreeMap::new();
      for (column, value) in cells(row) {
        let Some(existing) = target.column(&column) else {
          return Err(HomelibError::Config(format!("table {table} has no column {column}")));
        };
        if let Some(value) = value {
          stored.insert(existing.to_string(), value);
        }
      }
      staged.push(stored);
    }

    let count = staged.len();
    if let Some(target) = self.tables.get_mut(table) {
      target.rows.extend(staged);
    }
    Ok(count)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::extract::FieldRecord;

  fn row(entry: &str, field: &str) -> ProcessingRow {
    ProcessingRow {
      archive: "a.zip".into(),
      entry:   entry.into(),
      outcome: Outcome::Extracted {
        fields:            FieldRecord::from([(field.to_string(), "x".to_string())]),
        description_found: true,
      },
    }
  }

  #[test]
  fn test_insert_is_all_or_nothing() {
    let mut sink = MemorySink::new();
    sink.reconcile("t", &["genre".to_string()]).unwrap();

    let result = sink.insert("t", &[row("1.fb2", "genre"), row("2.fb2", "lang")]);
    assert!(matches!(result, Err(HomelibError::Config(_))));
    assert_eq!(sink.len("t"), 0);
  }

  #[test]
  fn test_reconcile_keeps_rows() {
    let mut sink = MemorySink::new();
    sink.reconcile("t", &["genre".to_string()]).unwrap();
    sink.insert("t", &[row("1.fb2", "genre")]).unwrap();
    sink.reconcile("t", &["lang".to_string(), "genre".to_string()]).unwrap();

    assert_eq!(sink.columns("t").unwrap().len(), BASE_COLUMNS.len() + 2);
    assert_eq!(sink.select("t", &["xml_filename", "genre", "lang"]).unwrap(), vec![vec![
      "1.fb2".to_string(),
      "x".to_string(),
      String::new()
    ]]);
  }

  #[test]
  fn test_field_named_like_base_column_is_kept() {
    let mut sink = MemorySink::new();
    sink.reconcile("t", &["error".to_string()]).unwrap();
    sink.insert("t", &[row("1.fb2", "error")]).unwrap();

    assert_eq!(sink.select("t", &["field_error", "error", "error_kind"]).unwrap(), vec![vec![
      "x".to_string(),
      String::new(),
      String::new()
    ]]);
  }

  #[test]
  fn test_select_unknown_table() {
    assert!(MemorySink::new().select("nope", &["zipfile"]).is_err());
  }
}
