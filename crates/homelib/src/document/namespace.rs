//! Namespace normalization.
//!
//! FB2 documents come with and without a default namespace, and some use prefixed elements.
//! Extractors look elements up by plain local name, so every tree is normalized first.

use std::collections::btree_map::Entry;

use super::*;

/// Returns the local part of a possibly qualified name.
///
/// Both Clark notation (`{uri}local`) and prefixed names (`prefix:local`) are understood;
/// unqualified names are returned unchanged.
///
/// ```
/// use homelib::document::namespace::local_name;
///
/// assert_eq!(local_name("{http://www.gribuser.ru/xml/fictionbook/2.0}genre"), "genre");
/// assert_eq!(local_name("l:href"), "href");
/// assert_eq!(local_name("genre"), "genre");
/// ```
pub fn local_name(name: &str) -> &str {
  let name = match name.strip_prefix('{').and_then(|rest| rest.split_once('}')) {
    Some((_, local)) => local,
    None => name,
  };
  name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Strips namespace qualification from every tag and attribute name in the tree.
///
/// Takes the tree by value: the caller hands over ownership and gets back the normalized tree,
/// so no un-normalized alias of it survives. Children keep their order and all text is moved
/// over untouched. Normalizing an already normalized tree returns it unchanged.
///
/// Attributes whose names share a local part keep a single value: an unqualified attribute wins
/// over qualified ones (`href` over `l:href`), otherwise the first qualified name in sort order
/// wins. Dropped attributes are reported at trace level.
pub fn normalize(mut node: Node) -> Node {
  if local_name(&node.tag).len() != node.tag.len() {
    node.tag = local_name(&node.tag).to_string();
  }
  if node.attributes.keys().any(|name| local_name(name).len() != name.len()) {
    let (plain, qualified): (Vec<_>, Vec<_>) = std::mem::take(&mut node.attributes)
      .into_iter()
      .partition(|(name, _)| local_name(name).len() == name.len());
    for (name, value) in plain.into_iter().chain(qualified) {
      match node.attributes.entry(local_name(&name).to_string()) {
        Entry::Vacant(slot) => {
          slot.insert(value);
        },
        Entry::Occupied(slot) => {
          let kept = slot.key();
          trace!("Dropping attribute {name}={value:?} of <{}>: {kept} is already set", node.tag);
        },
      }
    }
  }
  node.children = std::mem::take(&mut node.children).into_iter().map(normalize).collect();
  node
}
