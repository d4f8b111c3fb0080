//! Compact single-line markup serialization.
//!
//! Output is deterministic for equal trees so it can be used as a deduplication key:
//! attributes are written in name order, whitespace-only text runs (indentation) are dropped, and
//! line breaks inside real text are written as character references so the result stays on one
//! line. Nothing else is inserted.

use super::*;

/// Serializes a tree to compact markup. The root's own tail is not part of the output.
///
/// ```
/// use homelib::document::{serialize::to_compact_string, Node};
///
/// let node = Node::new("title-info")
///   .with_text("\n    ")
///   .with_child(Node::new("genre").with_text("sf").with_tail("\n    "))
///   .with_child(Node::new("lang").with_text("ru").with_tail("\n  "));
///
/// assert_eq!(to_compact_string(&node), "<title-info><genre>sf</genre><lang>ru</lang></title-info>");
/// ```
pub fn to_compact_string(node: &Node) -> String {
  let mut out = String::new();
  write_node(node, &mut out);
  out
}

/// Writes one element, its content and its children's tails.
fn write_node(node: &Node, out: &mut String) {
  out.push('<');
  out.push_str(&node.tag);
  for (name, value) in &node.attributes {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_into(value, true, out);
    out.push('"');
  }

  if node.children.is_empty() && is_blank(&node.text) {
    out.push_str("/>");
    return;
  }
  out.push('>');

  write_text(&node.text, out);
  for child in &node.children {
    write_node(child, out);
    write_text(&child.tail, out);
  }

  out.push_str("</");
  out.push_str(&node.tag);
  out.push('>');
}

/// Writes a text run unless it is pure indentation.
fn write_text(text: &str, out: &mut String) {
  if !is_blank(text) {
    escape_into(text, false, out);
  }
}

/// Whitespace-only (or empty) text.
fn is_blank(text: &str) -> bool { text.chars().all(char::is_whitespace) }

/// Escapes markup characters. Quotes are only escaped inside attribute values.
fn escape_into(text: &str, attribute: bool, out: &mut String) {
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' if attribute => out.push_str("&quot;"),
      '\n' => out.push_str("&#10;"),
      '\r' => out.push_str("&#13;"),
      c => out.push(c),
    }
  }
}
