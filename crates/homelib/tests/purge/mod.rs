use super::*;

#[traced_test]
#[test]
fn test_purge_removes_listed_entries() -> TestResult<()> {
  let (_dir, lib) = create_test_library()?;
  let solaris = entry_bytes(&lib.join("a.zip"), "1.fb2")?;
  let cover = entry_bytes(&lib.join("a.zip"), "cover.jpg")?;
  let spec = DeletionSpec::from_pairs([("a.zip", "2.fb2"), ("b.zip", "4.fb2"), ("b.zip", "9.fb2")]);

  let report = purge(&lib, &spec, PurgeOptions::default())?;

  assert_eq!(report.entries_removed(), 2);
  assert_eq!(entry_names(&lib.join("a.zip"))?, ["1.fb2", "cover.jpg"]);
  assert_eq!(entry_names(&lib.join("b.zip"))?, ["3.fb2", "5.fb2"]);
  assert_eq!(entry_bytes(&lib.join("a.zip"), "1.fb2")?, solaris);
  assert_eq!(entry_bytes(&lib.join("a.zip"), "cover.jpg")?, cover);
  assert_eq!(report.archives["b.zip"], ArchiveOutcome::Rewritten {
    removed:   vec!["4.fb2".to_string()],
    kept:      2,
    not_found: vec!["9.fb2".to_string()],
  });

  // Kept entries are still readable
  let Processed::Table(table) = process_directory(&lib, &Job::Survey, Output::Accumulate)? else {
    panic!("expected a table");
  };
  assert_eq!(table.report.entries_failed, 0);
  assert_eq!(table.rows.len(), 3);
  Ok(())
}

#[traced_test]
#[test]
fn test_dry_run_changes_nothing() -> TestResult<()> {
  let (_dir, lib) = create_test_library()?;
  let before = std::fs::read(lib.join("a.zip"))?;
  let spec = DeletionSpec::from_pairs([("a.zip", "1.fb2")]);

  let report = purge(&lib, &spec, PurgeOptions::default().dry_run())?;

  assert!(report.dry_run);
  assert_eq!(report.entries_removed(), 1);
  assert_eq!(std::fs::read(lib.join("a.zip"))?, before);
  Ok(())
}

#[traced_test]
#[test]
fn test_unmatched_and_missing_archives() -> TestResult<()> {
  let (_dir, lib) = create_test_library()?;
  let before = std::fs::read(lib.join("a.zip"))?;
  let spec = DeletionSpec::from_pairs([("a.zip", "nope.fb2"), ("gone.zip", "1.fb2")]);

  let report = purge(&lib, &spec, PurgeOptions::default())?;

  assert_eq!(report.archives["a.zip"], ArchiveOutcome::Untouched {
    not_found: vec!["nope.fb2".to_string()],
  });
  assert_eq!(report.archives["gone.zip"], ArchiveOutcome::Missing);
  assert_eq!(std::fs::read(lib.join("a.zip"))?, before);
  Ok(())
}

/// Replaces the `n`th (0-based) local file header signature with garbage.
fn corrupt_local_header(bytes: &mut [u8], n: usize) {
  let offset = bytes
    .windows(4)
    .enumerate()
    .filter(|(_, window)| *window == b"PK\x03\x04")
    .nth(n)
    .map(|(offset, _)| offset)
    .unwrap();
  bytes[offset..offset + 4].copy_from_slice(b"XXXX");
}

#[traced_test]
#[test]
fn test_failed_rewrite_keeps_original() -> TestResult<()> {
  let (_dir, lib) = create_test_library()?;
  let path = lib.join("b.zip");
  let mut bytes = std::fs::read(&path)?;
  corrupt_local_header(&mut bytes, 2);
  std::fs::write(&path, &bytes)?;

  let spec = DeletionSpec::from_pairs([("b.zip", "4.fb2"), ("a.zip", "1.fb2")]);
  let report = purge(&lib, &spec, PurgeOptions::default())?;

  let failures: Vec<_> = report.failures().collect();
  assert_eq!(failures.len(), 1);
  assert_eq!(failures[0].0, "b.zip");
  assert_eq!(std::fs::read(&path)?, bytes);

  // The other archive was still purged
  assert_eq!(entry_names(&lib.join("a.zip"))?, ["2.fb2", "cover.jpg"]);

  // No staging files are left behind
  let leftovers: Vec<_> = std::fs::read_dir(&lib)?
    .filter_map(|entry| entry.ok())
    .filter(|entry| entry.file_name().to_string_lossy().ends_with(".purge"))
    .collect();
  assert!(leftovers.is_empty());
  Ok(())
}

#[test]
fn test_purge_requires_directory() {
  let dir = tempdir().unwrap();
  let result = purge(dir.path().join("missing"), &DeletionSpec::new(), PurgeOptions::default());
  assert!(matches!(result, Err(HomelibError::Path(_))));
}
