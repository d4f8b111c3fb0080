use super::*;

/// Trimmed inner text of every element under `description` tagged `tag`, in document order.
fn captures<'a>(description: &'a Node, tag: &'a str) -> impl Iterator<Item = String> + 'a {
  description
    .descendants()
    .skip(1)
    .filter(move |node| node.tag == tag)
    .map(|node| node.inner_text().trim().to_string())
}

/// One field per match: `tag1`, `tag2`, ... numbered from 1 in document order.
///
/// No match gives an empty record.
pub fn numbered_capture(description: &Node, tag: &str) -> FieldRecord {
  captures(description, tag)
    .enumerate()
    .map(|(i, text)| (format!("{tag}{}", i + 1), text))
    .collect()
}

/// All matches joined with [`JOIN_SEPARATOR`] under the field `tag`.
///
/// No match gives the field with an empty value. Values are not escaped, so a value that itself
/// contains the separator cannot be told apart from two values.
pub fn joined_capture(description: &Node, tag: &str) -> FieldRecord {
  let joined = captures(description, tag).collect::<Vec<_>>().join(JOIN_SEPARATOR);
  FieldRecord::from([(tag.to_string(), joined)])
}
