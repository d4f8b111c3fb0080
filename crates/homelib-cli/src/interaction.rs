use std::collections::BTreeSet;

use dialoguer::{Confirm, Input, Select};
use homelib::{
  archive::purge::{ArchiveOutcome, PurgeReport},
  batch::{BatchReport, Outcome, ProcessingRow},
};

use super::*;

pub static INFO_PREFIX: &str = "ℹ ";
pub static SUCCESS_PREFIX: &str = "✓ ";
pub static ERROR_PREFIX: &str = "✗ ";
pub static WARNING_PREFIX: &str = "! ";
pub static PROMPT_PREFIX: &str = "❯ ";
pub static ITEM_PREFIX: &str = "├─";
pub static LAST_ITEM_PREFIX: &str = "└─";
pub static BULLET: &str = "•";

/// Something a command wants shown to the user.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  Success(&'a str),
  Info(&'a str),
  Warning(&'a str),
  Error(&'a str),
  Report(&'a BatchReport),
  Rows(&'a [ProcessingRow]),
  Purge(&'a PurgeReport),
  Values(&'a BTreeSet<String>),
}

pub trait UserInteraction {
  fn confirm(&self, message: &str) -> Result<bool>;
  fn prompt(&self, message: &str, default: &str) -> Result<String>;
  /// Index of the chosen item, or `None` when the user backed out.
  fn select(&self, message: &str, items: &[String]) -> Result<Option<usize>>;
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

impl UserInteraction for Cli {
  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      return Ok(true);
    }
    Ok(
      Confirm::new()
        .with_prompt(format!("{}{message}", style(PROMPT_PREFIX).yellow()))
        .default(false)
        .interact()?,
    )
  }

  fn prompt(&self, message: &str, default: &str) -> Result<String> {
    if self.accept_defaults {
      return Ok(default.to_string());
    }
    Ok(
      Input::<String>::new()
        .with_prompt(format!("{}{message}", style(PROMPT_PREFIX).yellow()))
        .default(default.to_string())
        .interact_text()?,
    )
  }

  fn select(&self, message: &str, items: &[String]) -> Result<Option<usize>> {
    if self.accept_defaults {
      return Ok((!items.is_empty()).then_some(0));
    }
    Ok(
      Select::new()
        .with_prompt(format!("{}{message}", style(PROMPT_PREFIX).yellow()))
        .items(items)
        .default(0)
        .interact_opt()?,
    )
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    match content {
      ResponseContent::Success(message) => {
        println!("{} {}", style(SUCCESS_PREFIX).green(), style(message).green())
      },
      ResponseContent::Info(message) => println!("{} {message}", style(INFO_PREFIX).blue()),
      ResponseContent::Warning(message) => {
        println!("{} {}", style(WARNING_PREFIX).yellow(), style(message).yellow())
      },
      ResponseContent::Error(message) => {
        eprintln!("{} {}", style(ERROR_PREFIX).red(), style(message).red())
      },
      ResponseContent::Report(report) => print_report(report),
      ResponseContent::Rows(rows) => print_rows(rows),
      ResponseContent::Purge(report) => print_purge(report),
      ResponseContent::Values(values) => {
        for value in values {
          println!("{} {value}", style(BULLET).cyan());
        }
        println!("{} {} distinct values", style(INFO_PREFIX).blue(), values.len());
      },
    }
    Ok(())
  }
}

/// Counts of a batch run.
fn print_report(report: &BatchReport) {
  println!("{} Processed {} archives", style(SUCCESS_PREFIX).green(), report.archives_processed);
  println!("   {} {} entries extracted", ITEM_PREFIX, style(report.entries_succeeded).green());
  println!("   {} {} entries without description", ITEM_PREFIX, report.missing_descriptions);
  println!("   {} {} entries failed", ITEM_PREFIX, style(report.entries_failed).red());
  println!("   {} {} archives could not be opened", LAST_ITEM_PREFIX, report.archives_failed);
}

/// One line per row: its identity and either its field count or its error.
fn print_rows(rows: &[ProcessingRow]) {
  for (i, row) in rows.iter().enumerate() {
    let prefix = if i + 1 == rows.len() { LAST_ITEM_PREFIX } else { ITEM_PREFIX };
    let identity = format!("{}/{}", row.archive, row.entry);
    match &row.outcome {
      Outcome::Extracted { fields, description_found: true } => {
        println!("{prefix} {} {} fields", style(identity).cyan(), fields.len())
      },
      Outcome::Extracted { description_found: false, .. } => {
        println!("{prefix} {} {}", style(identity).cyan(), style("no description").yellow())
      },
      Outcome::Failed(diagnostic) => println!(
        "{prefix} {} {} {}",
        style(identity).cyan(),
        style(diagnostic.kind).red(),
        diagnostic.message
      ),
    }
  }
}

/// Per-archive outcome of a purge.
fn print_purge(report: &PurgeReport) {
  let verb = if report.dry_run { "Would remove" } else { "Removed" };
  for (archive, outcome) in &report.archives {
    match outcome {
      ArchiveOutcome::Rewritten { removed, kept, not_found } => {
        println!(
          "{} {} {verb} {} entries, {kept} kept",
          style(SUCCESS_PREFIX).green(),
          style(archive).cyan(),
          removed.len()
        );
        for entry in not_found {
          println!("   {} {} not in archive", ITEM_PREFIX, style(entry).yellow());
        }
      },
      ArchiveOutcome::Untouched { not_found } => println!(
        "{} {} none of {} listed entries present, untouched",
        style(INFO_PREFIX).blue(),
        style(archive).cyan(),
        not_found.len()
      ),
      ArchiveOutcome::Missing => {
        println!("{} {} archive not found", style(WARNING_PREFIX).yellow(), style(archive).cyan())
      },
      ArchiveOutcome::Failed { message } => {
        eprintln!("{} {} {message}", style(ERROR_PREFIX).red(), style(archive).cyan())
      },
    }
  }
  println!("{} {verb} {} entries in total", style(INFO_PREFIX).blue(), report.entries_removed());
}
