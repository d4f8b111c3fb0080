use super::*;

#[traced_test]
#[test]
fn test_accumulate_catalog() -> TestResult<()> {
  let (_dir, lib) = create_test_library()?;
  let job = Job::Extract(Registry::new().resolve("catalog", &Options::default())?);

  let Processed::Table(table) = process_directory(&lib, &job, Output::Accumulate)? else {
    panic!("accumulate mode should return a table");
  };

  assert_eq!(table.report.archives_processed, 2);
  assert_eq!(table.report.entries_succeeded, 4);
  assert_eq!(table.report.entries_failed, 1);
  assert_eq!(table.report.missing_descriptions, 1);

  let identities: Vec<_> =
    table.rows.iter().map(|row| format!("{}/{}", row.archive, row.entry)).collect();
  assert_eq!(identities, ["a.zip/1.fb2", "a.zip/2.fb2", "b.zip/3.fb2", "b.zip/4.fb2", "b.zip/5.fb2"]);

  let picnic = table.rows[1].fields().unwrap();
  assert_eq!(picnic["author"], "Arkady Strugatsky;Boris Strugatsky");
  assert_eq!(picnic["id_author"], ";7");
  assert_eq!(picnic["genre"], "sf;sf_social");
  assert_eq!(picnic["book-title"], "Roadside Picnic");
  assert!(picnic["description"].starts_with("<description><title-info><genre>sf</genre>"));

  let broken = table.rows[3].diagnostic().unwrap();
  assert_eq!(broken.kind, ErrorKind::Parse);

  let bare = &table.rows[4];
  assert!(matches!(&bare.outcome, Outcome::Extracted { description_found: false, .. }));
  assert!(bare.fields().unwrap().values().all(String::is_empty));
  Ok(())
}

#[traced_test]
#[test]
fn test_survey_reports_namespaces() -> TestResult<()> {
  let (_dir, lib) = create_test_library()?;

  let Processed::Table(table) = process_directory(&lib, &Job::Survey, Output::Accumulate)? else {
    panic!("accumulate mode should return a table");
  };

  let first = table.rows[0].fields().unwrap();
  assert_eq!(first["root_tag"], "{http://www.gribuser.ru/xml/fictionbook/2.0}FictionBook");
  assert_eq!(first["ns_default"], "http://www.gribuser.ru/xml/fictionbook/2.0");
  assert_eq!(first["ns_l"], "http://www.w3.org/1999/xlink");

  let bare = table.rows[4].fields().unwrap();
  assert_eq!(bare["root_tag"], "FictionBook");
  assert!(!bare.contains_key("ns_default"));
  Ok(())
}

#[traced_test]
#[test]
fn test_stream_into_database() -> TestResult<()> {
  let (dir, lib) = create_test_library()?;
  let mut db = Database::open(dir.path().join("homelib.db"))?;
  let job = Job::Extract(Extractor::Authors);

  let processed =
    process_directory(&lib, &job, Output::Stream { sink: &mut db, table: RESULTS_TABLE })?;
  assert!(matches!(processed, Processed::Streamed(report) if report.entries_failed == 1));

  let rows = db.select(RESULTS_TABLE, &["zipfile", "xml_filename", "author", "error_kind"])?;
  assert_eq!(rows.len(), 5);
  assert_eq!(rows[0], ["a.zip", "1.fb2", "Stanislaw Lem", ""]);
  assert_eq!(rows[3][3], "parse");
  Ok(())
}

#[traced_test]
#[test]
fn test_stream_open_schema_grows_columns() -> TestResult<()> {
  let (dir, lib) = create_test_library()?;
  let mut db = Database::open(dir.path().join("homelib.db"))?;
  let job = Job::Extract(Extractor::Numbered { tag: "genre".into() });

  process_directory(&lib, &job, Output::Stream { sink: &mut db, table: "genres" })?;

  let columns = db.columns("genres")?;
  assert!(columns.iter().any(|c| c == "genre1"));
  assert!(columns.iter().any(|c| c == "genre2"));
  let rows = db.select("genres", &["xml_filename", "genre1", "genre2"])?;
  assert_eq!(rows[1], ["2.fb2", "sf", "sf_social"]);
  assert_eq!(rows[2], ["3.fb2", "humor", ""]);
  Ok(())
}

#[traced_test]
#[test]
fn test_unopenable_archive_is_skipped() -> TestResult<()> {
  let (_dir, lib) = create_test_library()?;
  std::fs::write(lib.join("0-broken.zip"), b"PK but not really")?;

  let processed = process_directory(&lib, &Job::Survey, Output::Accumulate)?;
  assert_eq!(processed.report().archives_failed, 1);
  assert_eq!(processed.report().archives_processed, 2);
  assert!(logs_contain("Skipping archive"));
  Ok(())
}

#[test]
fn test_custom_entry_extension() -> TestResult<()> {
  let dir = tempdir()?;
  write_archive(&dir.path().join("x.ZIP"), &[
    ("book.xml", &fb2("Aelita", &["sf"], &[])),
    ("book.fb2", &fb2("Other", &["sf"], &[])),
  ])?;
  let config = homelib::config::Config::from_toml("entry_extension = \"xml\"")?;

  let processed = process_directory_with(
    dir.path(),
    &Job::Extract(Extractor::Joined { tag: "book-title".into() }),
    &config.filters(),
    Output::Accumulate,
  )?;
  let Processed::Table(table) = processed else { panic!("expected a table") };
  assert_eq!(table.rows.len(), 1);
  assert_eq!(table.rows[0].fields().unwrap()["book-title"], "Aelita");
  Ok(())
}

/// A sink that accepts the schema but refuses every insert.
struct RefusingSink;

impl Sink for RefusingSink {
  fn select(&mut self, _: &str, _: &[&str]) -> homelib::error::Result<Vec<Vec<String>>> {
    Ok(Vec::new())
  }

  fn reconcile(&mut self, _: &str, _: &[String]) -> homelib::error::Result<()> { Ok(()) }

  fn insert(
    &mut self,
    table: &str,
    _: &[homelib::batch::ProcessingRow],
  ) -> homelib::error::Result<usize> {
    Err(HomelibError::Config(format!("{table} is read-only")))
  }
}

#[test]
fn test_sink_error_stops_run() -> TestResult<()> {
  let (_dir, lib) = create_test_library()?;
  let mut sink = RefusingSink;

  let result =
    process_directory(&lib, &Job::Survey, Output::Stream { sink: &mut sink, table: "survey" });
  assert!(matches!(result, Err(HomelibError::Config(message)) if message.contains("read-only")));
  Ok(())
}

#[traced_test]
#[test]
fn test_stream_survey_prefixes_differing_in_case() -> TestResult<()> {
  let dir = tempdir()?;
  let lib = dir.path().join("lib");
  std::fs::create_dir(&lib)?;
  write_archive(&lib.join("a.zip"), &[
    ("1.fb2", &br#"<FictionBook xmlns:l="urn:lower"><description/></FictionBook>"#[..]),
    ("2.fb2", &br#"<FictionBook xmlns:L="urn:upper"><description/></FictionBook>"#[..]),
  ])?;
  let mut db = Database::open(dir.path().join("homelib.db"))?;

  let processed =
    process_directory(&lib, &Job::Survey, Output::Stream { sink: &mut db, table: "survey" })?;
  assert_eq!(processed.report().entries_succeeded, 2);

  let rows = db.select("survey", &["xml_filename", "ns_l"])?;
  assert_eq!(rows, [["1.fb2", "urn:lower"], ["2.fb2", "urn:upper"]]);
  Ok(())
}

#[traced_test]
#[test]
fn test_stream_field_named_like_base_column() -> TestResult<()> {
  let dir = tempdir()?;
  let lib = dir.path().join("lib");
  std::fs::create_dir(&lib)?;
  write_archive(&lib.join("a.zip"), &[(
    "1.fb2",
    &b"<FictionBook><description><title-info><error>x</error></title-info></description></FictionBook>"[..],
  )])?;
  let mut db = Database::open(dir.path().join("homelib.db"))?;
  let job = Job::Extract(Extractor::Joined { tag: "error".into() });

  process_directory(&lib, &job, Output::Stream { sink: &mut db, table: RESULTS_TABLE })?;

  let rows = db.select(RESULTS_TABLE, &["field_error", "error", "error_kind"])?;
  assert_eq!(rows, [["x", "", ""]]);
  Ok(())
}
