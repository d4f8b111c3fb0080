use super::*;

/// Separator between the child tag names listed for one section.
const TAG_SEPARATOR: &str = ", ";

/// Summarizes the structure of a description.
///
/// For each direct child of the description (`title-info`, `document-info`, ...), the field named
/// after that child lists the distinct tag names of its own children, sorted and comma-joined.
/// Children sharing a tag (e.g. repeated `custom-info`) are merged.
pub fn taglist(description: &Node) -> FieldRecord {
  let mut sections: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
  for section in &description.children {
    sections
      .entry(section.tag.as_str())
      .or_default()
      .extend(section.children.iter().map(|child| child.tag.as_str()));
  }

  sections
    .into_iter()
    .map(|(tag, children)| {
      (tag.to_string(), children.into_iter().collect::<Vec<_>>().join(TAG_SEPARATOR))
    })
    .collect()
}
