//! XML decoding into a dynamic key/value tree
//!
//! The upstream feed wraps its records in `Response.Results` and emits a
//! repeated element per record, or a single element when there is exactly
//! one. Decoding mirrors that shape: attributes are ignored, leaf text is
//! trimmed, repeated siblings become a list, and [`XmlNode::as_sequence`]
//! flattens both shapes to a uniform slice so downstream code never
//! branches on cardinality.

use crate::error::IngestError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

/// Decoded XML tree node
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Leaf element: trimmed character data (empty for `<tag/>`)
    Text(String),
    /// Element with child elements, keyed by tag name
    Element(BTreeMap<String, XmlNode>),
    /// Repeated sibling elements, in document order
    List(Vec<XmlNode>),
}

impl XmlNode {
    /// Child element by tag name
    pub fn get(&self, key: &str) -> Option<&XmlNode> {
        match self {
            XmlNode::Element(children) => children.get(key),
            _ => None,
        }
    }

    /// Leaf text, if this is a text node
    pub fn text(&self) -> Option<&str> {
        match self {
            XmlNode::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, XmlNode::Element(_))
    }

    /// Normalize the repeated-or-singleton shape to an ordered slice.
    ///
    /// A list yields its items; any other node yields itself as a
    /// one-element slice.
    pub fn as_sequence(&self) -> &[XmlNode] {
        match self {
            XmlNode::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// All character data under this node, in document order.
    ///
    /// Text form of a non-leaf field; used when a record carries nested
    /// markup where plain text is expected.
    pub fn flattened_text(&self) -> String {
        match self {
            XmlNode::Text(text) => text.clone(),
            XmlNode::Element(children) => {
                let parts: Vec<String> = children
                    .values()
                    .map(XmlNode::flattened_text)
                    .filter(|s| !s.is_empty())
                    .collect();
                parts.join(" ")
            }
            XmlNode::List(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(XmlNode::flattened_text)
                    .filter(|s| !s.is_empty())
                    .collect();
                parts.join(" ")
            }
        }
    }
}

/// Decode an XML document into an [`XmlNode`] tree.
///
/// Fails with [`IngestError::XmlParsing`] when the input is blank, the
/// markup is malformed, or decoding produces no structure. Underlying
/// decoder failures are wrapped with their original message appended.
pub fn parse_xml(input: &str) -> Result<XmlNode, IngestError> {
    if input.trim().is_empty() {
        return Err(IngestError::XmlParsing(
            "Invalid XML input: expected non-empty document".to_string(),
        ));
    }

    let mut reader = Reader::from_str(input);

    // Stack of open elements: tag name, children seen so far, text seen so far
    let mut stack: Vec<(String, BTreeMap<String, XmlNode>, String)> = Vec::new();
    let mut root: BTreeMap<String, XmlNode> = BTreeMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                stack.push((name, BTreeMap::new(), String::new()));
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                let target = match stack.last_mut() {
                    Some((_, children, _)) => children,
                    None => &mut root,
                };
                attach(target, name, XmlNode::Text(String::new()));
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|err| {
                    IngestError::XmlParsing(format!("Failed to parse XML: {}", err))
                })?;
                append_text(&mut stack, text.trim());
            }
            Ok(Event::CData(e)) => {
                let bytes = e.into_inner();
                let text = String::from_utf8_lossy(&bytes).into_owned();
                append_text(&mut stack, text.trim());
            }
            Ok(Event::End(_)) => {
                // check_end_names is on, so the closed tag is the top of the stack
                let (name, children, text) = match stack.pop() {
                    Some(frame) => frame,
                    None => {
                        return Err(IngestError::XmlParsing(
                            "Failed to parse XML: unexpected closing tag".to_string(),
                        ));
                    }
                };
                let node = if children.is_empty() {
                    XmlNode::Text(text)
                } else {
                    XmlNode::Element(children)
                };
                let target = match stack.last_mut() {
                    Some((_, children, _)) => children,
                    None => &mut root,
                };
                attach(target, name, node);
            }
            Ok(Event::Eof) => {
                if let Some((name, _, _)) = stack.last() {
                    return Err(IngestError::XmlParsing(format!(
                        "Failed to parse XML: unexpected end of document inside <{}>",
                        name
                    )));
                }
                break;
            }
            // Declarations, comments, processing instructions, doctypes
            Ok(_) => {}
            Err(err) => {
                return Err(IngestError::XmlParsing(format!(
                    "Failed to parse XML: {}",
                    err
                )));
            }
        }
    }

    if root.is_empty() {
        return Err(IngestError::XmlParsing(
            "XML parsing produced no structure".to_string(),
        ));
    }

    Ok(XmlNode::Element(root))
}

/// Insert a completed child, promoting repeated siblings to a list
fn attach(map: &mut BTreeMap<String, XmlNode>, name: String, node: XmlNode) {
    match map.remove(&name) {
        None => {
            map.insert(name, node);
        }
        Some(XmlNode::List(mut items)) => {
            items.push(node);
            map.insert(name, XmlNode::List(items));
        }
        Some(previous) => {
            map.insert(name, XmlNode::List(vec![previous, node]));
        }
    }
}

fn append_text(stack: &mut [(String, BTreeMap<String, XmlNode>, String)], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some((_, _, buffer)) = stack.last_mut() {
        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(text);
    }
}
