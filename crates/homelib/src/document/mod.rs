//! Owned XML element tree for FB2 documents.
//!
//! FB2 files are parsed into a small, owned tree of [`Node`]s. Element and attribute names are
//! stored fully qualified in Clark notation (`{namespace-uri}local-name`) exactly as the parser
//! resolved them; [`namespace::normalize`] strips that qualification. Text is kept the way an
//! element tree usually keeps it: each node has its own leading `text` and the `tail` text that
//! follows its closing tag inside the parent.
//!
//! # Examples
//!
//! ```
//! use homelib::document::{locate::locate, parse_document};
//!
//! let xml = br#"<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0">
//!   <description><title-info><genre>sf</genre></title-info></description>
//! </FictionBook>"#;
//!
//! let document = parse_document(xml).unwrap();
//! assert_eq!(document.root.tag, "{http://www.gribuser.ru/xml/fictionbook/2.0}FictionBook");
//!
//! let description = locate(&document).unwrap();
//! assert_eq!(description.children[0].tag, "title-info");
//! ```

use quick_xml::{
  events::{BytesStart, Event},
  name::{Namespace, PrefixDeclaration, ResolveResult},
  NsReader,
};

use super::*;

pub mod locate;
pub mod namespace;
pub mod serialize;

/// An XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
  /// Element name, possibly namespace-qualified as `{uri}local`
  pub tag:        String,
  /// Attribute name to value, names possibly namespace-qualified
  pub attributes: BTreeMap<String, String>,
  /// Child elements in document order
  pub children:   Vec<Node>,
  /// Text between the start tag and the first child (or the end tag)
  pub text:       String,
  /// Text between this element's end tag and the next sibling (or the parent's end tag)
  pub tail:       String,
}

impl Node {
  /// Creates an element with the given tag and nothing else.
  pub fn new(tag: impl Into<String>) -> Self { Self { tag: tag.into(), ..Default::default() } }

  /// Sets the element's own text.
  pub fn with_text(mut self, text: impl Into<String>) -> Self {
    self.text = text.into();
    self
  }

  /// Sets the text trailing the element.
  pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
    self.tail = tail.into();
    self
  }

  /// Adds an attribute.
  pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.attributes.insert(name.into(), value.into());
    self
  }

  /// Appends a child element.
  pub fn with_child(mut self, child: Node) -> Self {
    self.children.push(child);
    self
  }

  /// Iterates over this element and every descendant in document (pre-)order.
  pub fn descendants(&self) -> Descendants<'_> { Descendants { stack: vec![self] } }

  /// Returns the first direct child with the given tag.
  pub fn child(&self, tag: &str) -> Option<&Node> { self.children.iter().find(|c| c.tag == tag) }

  /// All text inside the element: its own text, then for every descendant its text and tail, in
  /// document order. The element's own tail is not included. Nothing is inserted between pieces.
  pub fn inner_text(&self) -> String {
    let mut out = String::new();
    self.collect_text(&mut out);
    out
  }

  /// Recursive helper for [`Node::inner_text`].
  fn collect_text(&self, out: &mut String) {
    out.push_str(&self.text);
    for child in &self.children {
      child.collect_text(out);
      out.push_str(&child.tail);
    }
  }
}

/// Pre-order iterator over a [`Node`] and its descendants.
pub struct Descendants<'a> {
  /// Nodes still to visit, next one on top
  stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
  type Item = &'a Node;

  fn next(&mut self) -> Option<Self::Item> {
    let node = self.stack.pop()?;
    self.stack.extend(node.children.iter().rev());
    Some(node)
  }
}

/// A parsed document: its root element plus the namespace declarations found on the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
  /// The root element, names in Clark notation
  pub root:       Node,
  /// Namespace declarations on the root element, prefix to URI. The default namespace is keyed
  /// by the empty string.
  pub namespaces: BTreeMap<String, String>,
}

/// Parses raw bytes into a [`Document`].
///
/// The encoding is taken from the BOM or the XML declaration, so legacy single-byte FB2 files
/// (e.g. `windows-1251`) are decoded correctly. Comments, processing instructions and the
/// doctype are dropped.
///
/// # Errors
///
/// Returns [`HomelibError::Parse`] for any well-formedness problem: mismatched or unclosed
/// tags, a missing root element, content after the root, bad escapes or undecodable text.
pub fn parse_document(bytes: &[u8]) -> Result<Document> {
  let mut reader = NsReader::from_reader(bytes);
  let mut buf = Vec::new();
  let mut stack: Vec<Node> = Vec::new();
  let mut root: Option<Node> = None;
  let mut namespaces = BTreeMap::new();

  loop {
    let event = reader.read_event_into(&mut buf).map_err(|e| parse_error(&reader, e))?;
    match event {
      Event::Start(ref start) | Event::Empty(ref start) => {
        if root.is_some() {
          return Err(parse_error(&reader, "content after the root element"));
        }
        let is_root = stack.is_empty();
        let node = open_element(&reader, start, is_root.then_some(&mut namespaces))?;
        if matches!(event, Event::Start(_)) {
          stack.push(node);
        } else {
          close_element(node, &mut stack, &mut root);
        }
      },
      Event::End(_) => {
        // Mismatched end names are rejected by the reader itself
        let node = stack.pop().ok_or_else(|| parse_error(&reader, "unexpected end tag"))?;
        close_element(node, &mut stack, &mut root);
      },
      Event::Text(text) => {
        let text = text.unescape().map_err(|e| parse_error(&reader, e))?;
        append_text(&mut stack, &text);
      },
      Event::CData(data) => {
        let text = reader.decoder().decode(&*data).map_err(|e| parse_error(&reader, e))?;
        append_text(&mut stack, &text);
      },
      Event::Eof => break,
      _ => (),
    }
    buf.clear();
  }

  if !stack.is_empty() {
    return Err(parse_error(&reader, format!("unclosed element <{}>", stack[stack.len() - 1].tag)));
  }
  let root = root.ok_or_else(|| parse_error(&reader, "no root element"))?;
  Ok(Document { root, namespaces })
}

/// Builds a [`HomelibError::Parse`] with the reader's current position.
fn parse_error(reader: &NsReader<&[u8]>, message: impl Display) -> HomelibError {
  HomelibError::Parse(format!("{message} (at byte {})", reader.buffer_position()))
}

/// Turns a start (or empty) tag into a [`Node`] with resolved names and decoded attributes.
///
/// When `declarations` is given, namespace declarations on this element are recorded into it.
fn open_element(
  reader: &NsReader<&[u8]>,
  start: &BytesStart<'_>,
  mut declarations: Option<&mut BTreeMap<String, String>>,
) -> Result<Node> {
  let decoder = reader.decoder();
  let (resolved, local) = reader.resolve_element(start.name());
  let local = decoder.decode(local.as_ref()).map_err(|e| parse_error(reader, e))?;
  let mut node = Node::new(qualify(&resolved, &local));

  for attribute in start.attributes() {
    let attribute = attribute.map_err(|e| parse_error(reader, e))?;
    let value = attribute.decode_and_unescape_value(decoder).map_err(|e| parse_error(reader, e))?;

    if let Some(binding) = attribute.key.as_namespace_binding() {
      if let Some(declarations) = declarations.as_deref_mut() {
        let prefix = match binding {
          PrefixDeclaration::Default => String::new(),
          PrefixDeclaration::Named(prefix) =>
            String::from_utf8_lossy(prefix).into_owned(),
        };
        declarations.insert(prefix, value.into_owned());
      }
      continue;
    }

    let (resolved, local) = reader.resolve_attribute(attribute.key);
    let local = decoder.decode(local.as_ref()).map_err(|e| parse_error(reader, e))?;
    node
      .attributes
      .insert(qualify(&resolved, &local), value.into_owned());
  }

  Ok(node)
}

/// Renders a resolved name in Clark notation. Names with an unbound prefix keep the prefix.
fn qualify(resolved: &ResolveResult<'_>, local: &str) -> String {
  match resolved {
    ResolveResult::Bound(Namespace(uri)) => format!("{{{}}}{local}", String::from_utf8_lossy(uri)),
    ResolveResult::Unknown(prefix) => format!("{}:{local}", String::from_utf8_lossy(prefix)),
    ResolveResult::Unbound => local.to_string(),
  }
}

/// Attaches a finished element to its parent, or makes it the root.
fn close_element(node: Node, stack: &mut [Node], root: &mut Option<Node>) {
  match stack.last_mut() {
    Some(parent) => parent.children.push(node),
    None => *root = Some(node),
  }
}

/// Appends character data to the innermost open element: to its text when it has no children
/// yet, otherwise to the tail of its last child. Text outside the root element is dropped.
fn append_text(stack: &mut [Node], text: &str) {
  if let Some(current) = stack.last_mut() {
    match current.children.last_mut() {
      Some(last) => last.tail.push_str(text),
      None => current.text.push_str(text),
    }
  }
}
