use super::*;

/// Tags captured by the catalog with [`joined_capture`].
pub const CATALOG_JOINED_TAGS: [&str; 5] = ["genre", "book-title", "lang", "src-lang", "keywords"];

/// Output of the catalog extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
  /// Every catalog field; all empty when there was no description
  pub fields:              FieldRecord,
  /// Set when the document had no description to extract from
  pub missing_description: bool,
}

/// All fields the catalog produces, in a stable order.
pub fn fields() -> Vec<String> {
  [authors::AUTHOR, authors::ID_AUTHOR]
    .into_iter()
    .chain(CATALOG_JOINED_TAGS)
    .chain([COMPACT_FIELD])
    .map(str::to_string)
    .collect()
}

/// The composite record used to fill the library table: authors, the joined captures of
/// [`CATALOG_JOINED_TAGS`] and the compact markup, merged into one record.
///
/// The component field names are distinct, so merging never overwrites. An absent description
/// yields every field empty with [`Catalog::missing_description`] set.
pub fn catalog(description: Option<&Node>) -> Catalog {
  let Some(description) = description else {
    return Catalog {
      fields:              fields().into_iter().map(|name| (name, String::new())).collect(),
      missing_description: true,
    };
  };

  let mut record = authors(description);
  for tag in CATALOG_JOINED_TAGS {
    record.extend(joined_capture(description, tag));
  }
  record.extend(compact(description));
  Catalog { fields: record, missing_description: false }
}
