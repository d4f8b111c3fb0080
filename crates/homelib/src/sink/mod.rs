//! Tabular destinations for processing rows.
//!
//! A [`Sink`] stores [`ProcessingRow`]s in named tables. Every table has the identity columns
//! ([`ARCHIVE_COLUMN`], [`ENTRY_COLUMN`]) and the bookkeeping columns ([`HAS_DESCRIPTION_COLUMN`],
//! [`ERROR_KIND_COLUMN`], [`ERROR_COLUMN`]) followed by whatever text columns the extractors have
//! declared through [`Sink::reconcile`]. Inserting a row with a field the table does not have is
//! an error; columns are never created implicitly by an insert.
//!
//! Column names compare the way SQLite compares identifiers, ignoring ASCII case (see
//! [`column_key`]). Fields whose names differ only in case share one column, and a field named
//! like a base column is stored under [`SHADOWED_FIELD_PREFIX`] plus its name (see
//! [`field_column`]).
//!
//! [`Database`](crate::database::Database) is the persistent implementation, [`MemorySink`] the
//! in-memory one.

use std::{borrow::Cow, collections::btree_map::Entry};

use crate::{
  batch::{Outcome, ProcessingRow},
  extract::JOIN_SEPARATOR,
};

use super::*;

mod memory;

pub use self::memory::MemorySink;

/// Archive file name column.
pub const ARCHIVE_COLUMN: &str = "zipfile";
/// Entry name column.
pub const ENTRY_COLUMN: &str = "xml_filename";
/// `1` when the document had a description, `0` when not, empty for failed entries.
pub const HAS_DESCRIPTION_COLUMN: &str = "has_description";
/// [`ErrorKind`] of a failed entry.
pub const ERROR_KIND_COLUMN: &str = "error_kind";
/// Error message of a failed entry.
pub const ERROR_COLUMN: &str = "error";

/// Columns every table starts with, in order.
pub const BASE_COLUMNS: [&str; 5] =
  [ARCHIVE_COLUMN, ENTRY_COLUMN, HAS_DESCRIPTION_COLUMN, ERROR_KIND_COLUMN, ERROR_COLUMN];

/// Prefix of the column storing a field whose name is taken by a base column.
pub const SHADOWED_FIELD_PREFIX: &str = "field_";

/// Key under which column names are compared.
pub fn column_key(name: &str) -> String { name.to_ascii_lowercase() }

/// Column that stores the extracted field `name`.
///
/// ```
/// # use homelib::sink::field_column;
/// assert_eq!(field_column("genre"), "genre");
/// assert_eq!(field_column("Error"), "field_Error");
/// ```
pub fn field_column(name: &str) -> Cow<'_, str> {
  let key = column_key(name);
  if BASE_COLUMNS.contains(&key.as_str()) {
    Cow::Owned(format!("{SHADOWED_FIELD_PREFIX}{name}"))
  } else {
    Cow::Borrowed(name)
  }
}

/// Columns to add so that every field in `fields` has one, given the `existing` columns.
///
/// The first spelling seen for a [`column_key`] is kept.
pub fn missing_columns<'a>(
  existing: impl IntoIterator<Item = &'a str>,
  fields: &[String],
) -> Vec<String> {
  let mut seen: BTreeSet<String> = existing.into_iter().map(column_key).collect();
  fields
    .iter()
    .map(|field| field_column(field))
    .filter(|column| seen.insert(column_key(column)))
    .map(Cow::into_owned)
    .collect()
}

/// A destination for processing rows, organized as named tables of text columns.
pub trait Sink {
  /// Reads `columns` of every row of `table`, in insertion order. Absent values read as empty
  /// strings.
  fn select(&mut self, table: &str, columns: &[&str]) -> Result<Vec<Vec<String>>>;

  /// Makes sure `table` exists with the base columns and a [`field_column`] for every field in
  /// `fields`. Existing columns and rows are kept.
  fn reconcile(&mut self, table: &str, fields: &[String]) -> Result<()>;

  /// Appends `rows` to `table` as one unit: either every row is stored or none is. Returns the
  /// number of rows stored.
  fn insert(&mut self, table: &str, rows: &[ProcessingRow]) -> Result<usize>;
}

/// Flattens a row into `(column, value)` cells. Absent values are `None`.
///
/// Every column appears once. Fields landing in the same column have their values joined with
/// [`JOIN_SEPARATOR`] in field order.
pub fn cells(row: &ProcessingRow) -> Vec<(Cow<'_, str>, Option<String>)> {
  let mut cells: Vec<(Cow<'_, str>, Option<String>)> = vec![
    (ARCHIVE_COLUMN.into(), Some(row.archive.clone())),
    (ENTRY_COLUMN.into(), Some(row.entry.clone())),
  ];
  match &row.outcome {
    Outcome::Extracted { fields, description_found } => {
      cells.push((HAS_DESCRIPTION_COLUMN.into(), Some(u8::from(*description_found).to_string())));
      cells.push((ERROR_KIND_COLUMN.into(), None));
      cells.push((ERROR_COLUMN.into(), None));

      let mut merged: Vec<(Cow<'_, str>, String)> = Vec::with_capacity(fields.len());
      let mut slots: BTreeMap<_, usize> = BTreeMap::new();
      for (name, value) in fields {
        let column = field_column(name);
        match slots.entry(column_key(&column)) {
          Entry::Occupied(slot) => {
            let joined = &mut merged[*slot.get()].1;
            joined.push_str(JOIN_SEPARATOR);
            joined.push_str(value);
          },
          Entry::Vacant(slot) => {
            slot.insert(merged.len());
            merged.push((column, value.clone()));
          },
        }
      }
      cells.extend(merged.into_iter().map(|(column, value)| (column, Some(value))));
    },
    Outcome::Failed(diagnostic) => {
      cells.push((HAS_DESCRIPTION_COLUMN.into(), None));
      cells.push((ERROR_KIND_COLUMN.into(), Some(diagnostic.kind.to_string())));
      cells.push((ERROR_COLUMN.into(), Some(diagnostic.message.clone())));
    },
  }
  cells
}

/// Every distinct value stored in `column` of `table`, with `;`-joined values split apart.
///
/// Values are trimmed and empty ones are dropped. The result is sorted.
pub fn distinct_values<S: Sink + ?Sized>(
  sink: &mut S,
  table: &str,
  column: &str,
) -> Result<BTreeSet<String>> {
  let rows = sink.select(table, &[column])?;
  let values: BTreeSet<String> = rows
    .iter()
    .flatten()
    .flat_map(|value| value.split(JOIN_SEPARATOR))
    .map(str::trim)
    .filter(|value| !value.is_empty())
    .map(str::to_string)
    .collect();
  debug!("{} distinct values in {table}.{column}", values.len());
  Ok(values)
}
