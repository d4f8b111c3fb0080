use super::*;

/// Field holding the joined author names.
pub const AUTHOR: &str = "author";
/// Field holding the joined author ids.
pub const ID_AUTHOR: &str = "id_author";

/// Name parts of an author, in the order they are written out.
const NAME_PARTS: [&str; 3] = ["first-name", "middle-name", "last-name"];

/// Collects the authors of `title-info`.
///
/// Each author's full name is built from whichever of first, middle and last name are present
/// and non-empty, trimmed and separated by single spaces. `author` joins the names and
/// `id_author` joins the ids with [`JOIN_SEPARATOR`]; an author without an id contributes an empty
/// segment so both fields line up. Without `title-info` or authors both fields are empty.
pub fn authors(description: &Node) -> FieldRecord {
  let title_info = description.descendants().skip(1).find(|node| node.tag == "title-info");

  let (names, ids): (Vec<String>, Vec<String>) = title_info
    .into_iter()
    .flat_map(|info| info.descendants().skip(1).filter(|node| node.tag == AUTHOR))
    .map(|author| {
      let name = NAME_PARTS
        .iter()
        .filter_map(|part| author.child(part))
        .map(|part| part.inner_text().trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
      let id = author.child("id").map(|id| id.inner_text().trim().to_string()).unwrap_or_default();
      (name, id)
    })
    .unzip();

  FieldRecord::from([
    (AUTHOR.to_string(), names.join(JOIN_SEPARATOR)),
    (ID_AUTHOR.to_string(), ids.join(JOIN_SEPARATOR)),
  ])
}
