//! Field extractors: transforms from a `<description>` block to a flat field mapping.
//!
//! Every extractor takes the (normalized) description of one document, or `None` when the
//! document has none, and produces a [`FieldRecord`]. Extractors are independent of each other
//! and are selected by name through the [`Registry`], which is built once at startup and maps
//! each name to a fixed [`ExtractorKind`].
//!
//! Each extractor also declares the [`Schema`] of its output up front so that a sink can prepare
//! its columns before any row arrives.
//!
//! # Examples
//!
//! ```
//! use homelib::{
//!   document::{locate::locate, parse_document},
//!   extract::{Options, Registry},
//! };
//!
//! let document = parse_document(
//!   b"<FictionBook><description><title-info><genre>sf</genre><genre>det</genre></title-info>\
//!     </description></FictionBook>",
//! )
//! .unwrap();
//! let description = locate(&document);
//!
//! let registry = Registry::new();
//! let fields = registry
//!   .dispatch("numbered", description.as_ref(), &Options::with_tag("genre"))
//!   .unwrap();
//! assert_eq!(fields["genre1"], "sf");
//! assert_eq!(fields["genre2"], "det");
//! ```

use super::*;
use crate::document::{serialize::to_compact_string, Node};

mod authors;
mod capture;
mod catalog;
mod taglist;

pub use self::{
  authors::{authors, AUTHOR, ID_AUTHOR},
  capture::{joined_capture, numbered_capture},
  catalog::{catalog, Catalog, CATALOG_JOINED_TAGS},
  taglist::taglist,
};

/// Field name to value for one document.
pub type FieldRecord = BTreeMap<String, String>;

/// Separator used by every extractor that folds several values into one field.
pub const JOIN_SEPARATOR: &str = ";";

/// The output columns an extractor produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
  /// Always exactly these fields.
  Fixed(Vec<String>),
  /// Field names depend on the document (numbered fields, tag names); sinks must extend their
  /// columns per batch.
  Open,
}

/// The kinds of extractor the registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
  /// Structure summary of the description's children.
  Taglist,
  /// Every match of a tag as `tag1`, `tag2`, ...
  Numbered,
  /// Every match of a tag joined into one field.
  Joined,
  /// Author names and ids from `title-info`.
  Authors,
  /// The whole description as compact markup.
  Compact,
  /// Authors, genres, titles, languages and compact markup together.
  Catalog,
}

/// A fully configured extractor, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extractor {
  /// See [`taglist`].
  Taglist,
  /// See [`numbered_capture`].
  Numbered {
    /// Tag to capture
    tag: String,
  },
  /// See [`joined_capture`].
  Joined {
    /// Tag to capture
    tag: String,
  },
  /// See [`authors`].
  Authors,
  /// The description serialized by [`to_compact_string`] under the `description` field.
  Compact,
  /// See [`catalog`].
  Catalog,
}

impl Extractor {
  /// Name of this extractor, also used as its registry key.
  pub fn name(&self) -> &'static str {
    match self {
      Extractor::Taglist => "taglist",
      Extractor::Numbered { .. } => "numbered",
      Extractor::Joined { .. } => "joined",
      Extractor::Authors => "authors",
      Extractor::Compact => "compact",
      Extractor::Catalog => "catalog",
    }
  }

  /// The columns this extractor produces.
  pub fn schema(&self) -> Schema {
    let fixed = |names: &[&str]| Schema::Fixed(names.iter().map(|n| n.to_string()).collect());
    match self {
      Extractor::Taglist | Extractor::Numbered { .. } => Schema::Open,
      Extractor::Joined { tag } => Schema::Fixed(vec![tag.clone()]),
      Extractor::Authors => fixed(&[AUTHOR, ID_AUTHOR]),
      Extractor::Compact => fixed(&[COMPACT_FIELD]),
      Extractor::Catalog => Schema::Fixed(catalog::fields()),
    }
  }

  /// Runs the extractor.
  ///
  /// Without a description, fixed-schema extractors return all their fields empty and open
  /// ones return an empty record.
  pub fn extract(&self, description: Option<&Node>) -> FieldRecord {
    let Some(description) = description else {
      return match self.schema() {
        Schema::Fixed(names) => names.into_iter().map(|name| (name, String::new())).collect(),
        Schema::Open => FieldRecord::new(),
      };
    };

    match self {
      Extractor::Taglist => taglist(description),
      Extractor::Numbered { tag } => numbered_capture(description, tag),
      Extractor::Joined { tag } => joined_capture(description, tag),
      Extractor::Authors => authors(description),
      Extractor::Compact => compact(description),
      Extractor::Catalog => catalog(Some(description)).fields,
    }
  }
}

/// Field written by the compact extractor.
pub const COMPACT_FIELD: &str = "description";

/// The description as one line of markup under [`COMPACT_FIELD`].
pub fn compact(description: &Node) -> FieldRecord {
  FieldRecord::from([(COMPACT_FIELD.to_string(), to_compact_string(description))])
}

/// Options passed along with an extractor name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
  /// Tag to capture, required by the numbered and joined extractors
  pub tag: Option<String>,
}

impl Options {
  /// Options carrying a tag.
  pub fn with_tag(tag: impl Into<String>) -> Self { Self { tag: Some(tag.into()) } }
}

impl ExtractorKind {
  /// Combines the kind with its options into a runnable [`Extractor`].
  pub fn configure(self, name: &str, options: &Options) -> Result<Extractor> {
    let tag = || {
      options.tag.clone().filter(|t| !t.is_empty()).ok_or_else(|| HomelibError::MissingOption {
        extractor: name.to_string(),
        option:    "tag",
      })
    };
    Ok(match self {
      ExtractorKind::Taglist => Extractor::Taglist,
      ExtractorKind::Numbered => Extractor::Numbered { tag: tag()? },
      ExtractorKind::Joined => Extractor::Joined { tag: tag()? },
      ExtractorKind::Authors => Extractor::Authors,
      ExtractorKind::Compact => Extractor::Compact,
      ExtractorKind::Catalog => Extractor::Catalog,
    })
  }
}

/// Name-to-extractor table.
#[derive(Debug, Clone)]
pub struct Registry {
  /// Registered extractors by name
  entries: BTreeMap<String, ExtractorKind>,
}

impl Default for Registry {
  fn default() -> Self { Self::new() }
}

impl Registry {
  /// A registry holding every built-in extractor.
  pub fn new() -> Self {
    let mut registry = Self::empty();
    registry.register("taglist", ExtractorKind::Taglist);
    registry.register("numbered", ExtractorKind::Numbered);
    registry.register("joined", ExtractorKind::Joined);
    registry.register("authors", ExtractorKind::Authors);
    registry.register("compact", ExtractorKind::Compact);
    registry.register("catalog", ExtractorKind::Catalog);
    registry
  }

  /// A registry with nothing in it.
  pub fn empty() -> Self { Self { entries: BTreeMap::new() } }

  /// Registers `kind` under `name`, replacing any previous entry.
  pub fn register(&mut self, name: impl Into<String>, kind: ExtractorKind) {
    self.entries.insert(name.into(), kind);
  }

  /// Registered names in sorted order.
  pub fn names(&self) -> impl Iterator<Item = &str> { self.entries.keys().map(String::as_str) }

  /// Looks up `name` and configures it with `options`.
  ///
  /// # Errors
  ///
  /// [`HomelibError::UnknownExtractor`] when nothing is registered under `name`, and
  /// [`HomelibError::MissingOption`] when a required option is absent.
  pub fn resolve(&self, name: &str, options: &Options) -> Result<Extractor> {
    let kind =
      self.entries.get(name).ok_or_else(|| HomelibError::UnknownExtractor(name.to_string()))?;
    kind.configure(name, options)
  }

  /// Looks up `name` and runs it on `description`.
  pub fn dispatch(
    &self,
    name: &str,
    description: Option<&Node>,
    options: &Options,
  ) -> Result<FieldRecord> {
    Ok(self.resolve(name, options)?.extract(description))
  }
}
