use super::*;
use crate::{
  batch::{Diagnostic, Outcome},
  sink::distinct_values,
};

/// Helper function to set up a test database
fn setup_test_db() -> (Database, PathBuf, tempfile::TempDir) {
  let dir = tempdir().unwrap();
  let path = dir.path().join("test.db");
  let db = Database::open(&path).unwrap();
  (db, path, dir)
}

fn row(entry: &str, genre: &str) -> ProcessingRow {
  ProcessingRow {
    archive: "fb2-000001-000100.zip".into(),
    entry:   entry.into(),
    outcome: Outcome::Extracted {
      fields:            [("genre".to_string(), genre.to_string())].into(),
      description_found: true,
    },
  }
}

#[traced_test]
#[test]
fn test_database_creation() {
  let (db, path, _dir) = setup_test_db();

  assert!(path.exists());
  assert_eq!(db.columns(DELETION_TABLE).unwrap(), ["zipfile", "xml_filename"]);
}

#[traced_test]
#[test]
fn test_default_path() {
  let path = Database::default_path();

  assert!(path.ends_with("homelib/homelib.db") || path.ends_with("homelib\\homelib.db"));
  assert!(path
    .parent()
    .unwrap()
    .starts_with(dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))));
}

#[traced_test]
#[test]
fn test_reconcile_creates_and_extends() {
  let (mut db, _path, _dir) = setup_test_db();

  db.reconcile(RESULTS_TABLE, &["genre".to_string()]).unwrap();
  db.insert(RESULTS_TABLE, &[row("1.fb2", "sf")]).unwrap();
  db.reconcile(RESULTS_TABLE, &["genre".to_string(), "book-title".to_string()]).unwrap();

  assert_eq!(db.columns(RESULTS_TABLE).unwrap(), [
    "zipfile",
    "xml_filename",
    "has_description",
    "error_kind",
    "error",
    "genre",
    "book-title"
  ]);
  let rows = db.select(RESULTS_TABLE, &["xml_filename", "genre", "book-title"]).unwrap();
  assert_eq!(rows, vec![vec!["1.fb2".to_string(), "sf".to_string(), String::new()]]);
}

fn fields(entry: &str, fields: &[(&str, &str)]) -> ProcessingRow {
  let mut row = row(entry, "");
  row.outcome = Outcome::Extracted {
    fields:            fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    description_found: true,
  };
  row
}

#[traced_test]
#[test]
fn test_reconcile_columns_differing_in_case() {
  let (mut db, _path, _dir) = setup_test_db();

  db.reconcile("survey", &["ns_l".to_string()]).unwrap();
  db.insert("survey", &[fields("1.fb2", &[("ns_l", "urn:x")])]).unwrap();
  db.reconcile("survey", &["ns_L".to_string(), "NS_Q".to_string(), "ns_q".to_string()]).unwrap();
  db.insert("survey", &[
    fields("2.fb2", &[("ns_L", "urn:y")]),
    fields("3.fb2", &[("ns_L", "urn:z"), ("ns_l", "urn:w")]),
  ])
  .unwrap();

  assert_eq!(&db.columns("survey").unwrap()[5..], ["ns_l", "NS_Q"]);
  let rows = db.select("survey", &["xml_filename", "ns_l"]).unwrap();
  assert_eq!(rows, vec![
    vec!["1.fb2".to_string(), "urn:x".to_string()],
    vec!["2.fb2".to_string(), "urn:y".to_string()],
    vec!["3.fb2".to_string(), "urn:z;urn:w".to_string()],
  ]);
}

#[traced_test]
#[test]
fn test_field_named_like_base_column() {
  let (mut db, _path, _dir) = setup_test_db();

  db.reconcile(RESULTS_TABLE, &["error".to_string(), "zipfile".to_string()]).unwrap();
  db.insert(RESULTS_TABLE, &[fields("1.fb2", &[("error", "x"), ("zipfile", "inner.zip")])])
    .unwrap();

  let rows = db
    .select(RESULTS_TABLE, &["zipfile", "error", "error_kind", "field_error", "field_zipfile"])
    .unwrap();
  assert_eq!(rows, vec![vec![
    "fb2-000001-000100.zip".to_string(),
    String::new(),
    String::new(),
    "x".to_string(),
    "inner.zip".to_string(),
  ]]);
}

#[traced_test]
#[test]
fn test_insert_failure_rolls_back() {
  let (mut db, _path, _dir) = setup_test_db();
  db.reconcile(RESULTS_TABLE, &["genre".to_string()]).unwrap();

  let mut unknown = row("2.fb2", "det");
  unknown.outcome = Outcome::Extracted {
    fields:            [("lang".to_string(), "ru".to_string())].into(),
    description_found: true,
  };
  let result = db.insert(RESULTS_TABLE, &[row("1.fb2", "sf"), unknown]);

  assert!(matches!(result, Err(HomelibError::Sqlite(_))));
  assert!(db.select(RESULTS_TABLE, &["zipfile"]).unwrap().is_empty());
}

#[traced_test]
#[test]
fn test_failed_rows_store_diagnostics() {
  let (mut db, _path, _dir) = setup_test_db();
  db.reconcile(RESULTS_TABLE, &[]).unwrap();

  let failed = ProcessingRow {
    archive: "a.zip".into(),
    entry:   "broken.fb2".into(),
    outcome: Outcome::Failed(Diagnostic {
      kind:    ErrorKind::ArchiveRead,
      message: "invalid checksum".into(),
    }),
  };
  let mut ok = row("fine.fb2", "sf");
  ok.outcome = Outcome::Extracted { fields: Default::default(), description_found: false };
  db.insert(RESULTS_TABLE, &[failed, ok]).unwrap();

  let rows = db.select(RESULTS_TABLE, &["has_description", "error_kind", "error"]).unwrap();
  assert_eq!(rows, vec![
    vec![String::new(), "archive_read".to_string(), "invalid checksum".to_string()],
    vec!["0".to_string(), String::new(), String::new()],
  ]);
}

#[traced_test]
#[test]
fn test_deletion_spec() {
  let (mut db, _path, _dir) = setup_test_db();
  db.mark_for_deletion(DELETION_TABLE, "a.zip", "1.fb2").unwrap();
  db.mark_for_deletion(DELETION_TABLE, "a.zip", "1.fb2").unwrap();
  db.mark_for_deletion(DELETION_TABLE, "b.zip", "7.fb2").unwrap();

  let spec = db.deletion_spec(DELETION_TABLE).unwrap();
  assert_eq!(spec.len(), 2);
  assert_eq!(spec.archives().map(|(archive, _)| archive).collect::<Vec<_>>(), ["a.zip", "b.zip"]);
}

#[traced_test]
#[test]
fn test_distinct_values() {
  let (mut db, _path, _dir) = setup_test_db();
  db.reconcile(RESULTS_TABLE, &["genre".to_string()]).unwrap();
  db.insert(RESULTS_TABLE, &[row("1.fb2", "sf;det"), row("2.fb2", "sf_humor;det")]).unwrap();

  let genres = distinct_values(&mut db, RESULTS_TABLE, "genre").unwrap();
  assert_eq!(genres.into_iter().collect::<Vec<_>>(), ["det", "sf", "sf_humor"]);
}

#[test]
fn test_identifier_validation() {
  assert!(validate_identifier("book-title").is_ok());
  assert!(validate_identifier("ns_default").is_ok());
  assert!(validate_identifier("").is_err());
  assert!(validate_identifier("x\"; DROP TABLE lib_delete; --").is_err());
  assert!(validate_identifier("sqlite_master").is_err());
}
