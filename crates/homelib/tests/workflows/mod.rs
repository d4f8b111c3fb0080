//! End to end flows over a database: extract, analyse, schedule deletions, purge.

use super::*;

#[traced_test]
#[test]
fn test_extract_values_and_purge() -> TestResult<()> {
  let (dir, lib) = create_test_library()?;
  let mut db = Database::open(dir.path().join("data").join("homelib.db"))?;

  let job = Job::Extract(Extractor::Catalog);
  process_directory(&lib, &job, Output::Stream { sink: &mut db, table: RESULTS_TABLE })?;

  let genres = distinct_values(&mut db, RESULTS_TABLE, "genre")?;
  assert_eq!(genres.into_iter().collect::<Vec<_>>(), ["humor", "sf", "sf_social"]);

  // Schedule every entry that failed or has no description
  let rows = db.select(RESULTS_TABLE, &["zipfile", "xml_filename", "has_description"])?;
  for row in rows.iter().filter(|row| row[2] != "1") {
    db.mark_for_deletion(DELETION_TABLE, &row[0], &row[1])?;
  }

  let spec = db.deletion_spec(DELETION_TABLE)?;
  assert_eq!(spec.len(), 2);
  let report = purge(&lib, &spec, PurgeOptions::default())?;
  assert_eq!(report.entries_removed(), 2);
  assert_eq!(entry_names(&lib.join("b.zip"))?, ["3.fb2"]);
  Ok(())
}
