//! Locating the `<description>` block and surveying the document root.

use super::*;

/// Local name of the FB2 metadata element.
pub const DESCRIPTION: &str = "description";

/// Finds the first element anywhere in the document whose local name is `description`,
/// ignoring its namespace, and returns a normalized copy of it.
///
/// `None` is a regular outcome: plenty of real-world files simply have no description.
pub fn locate(document: &Document) -> Option<Node> {
  document
    .root
    .descendants()
    .find(|node| namespace::local_name(&node.tag) == DESCRIPTION)
    .map(|found| namespace::normalize(found.clone()))
}

/// Structural facts about a document used to spot schema drift across a corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Survey {
  /// The root element name exactly as parsed, in Clark notation
  pub root_tag:   String,
  /// Namespace declarations on the root, prefix to URI (default namespace under `""`)
  pub namespaces: BTreeMap<String, String>,
}

impl Survey {
  /// Reads the survey facts off a parsed document.
  pub fn of(document: &Document) -> Self {
    Self { root_tag: document.root.tag.clone(), namespaces: document.namespaces.clone() }
  }

  /// Flattens the survey into fields: `root_tag` plus one `ns_<prefix>` field per declaration,
  /// `ns_default` for the default namespace.
  pub fn into_fields(self) -> extract::FieldRecord {
    let mut fields = extract::FieldRecord::new();
    fields.insert("root_tag".to_string(), self.root_tag);
    for (prefix, uri) in self.namespaces {
      let prefix = if prefix.is_empty() { "default".to_string() } else { prefix };
      fields.insert(format!("ns_{prefix}"), uri);
    }
    fields
  }
}
