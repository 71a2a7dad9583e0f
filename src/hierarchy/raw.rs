use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::TraceError;

/// Device-native hierarchy fragment: attribute keys carry a leading `@`,
/// child elements sit under their tag name (`node`).
pub type RawNode = Map<String, Value>;

/// Marker prefixed to attribute keys in the raw document.
pub const ATTRIBUTE_MARKER: char = '@';

/// Parse a uiautomator XML dump into the raw JSON document shape.
///
/// Attributes become `@name` string values. A tag that appears once under a
/// parent is stored as an object; repeated tags become an array, so a node
/// with one child holds `"node": {...}` and a node with several holds
/// `"node": [...]`. Text content is ignored.
pub fn parse_dump_xml(xml: &str) -> Result<Value, TraceError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<(String, RawNode)> = Vec::new();
    let mut document = RawNode::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(open_element(&start)?);
            }
            Ok(Event::Empty(start)) => {
                let (name, node) = open_element(&start)?;
                attach(&mut stack, &mut document, name, node);
            }
            Ok(Event::End(_)) => {
                let (name, node) = stack.pop().ok_or_else(|| {
                    TraceError::InvalidHierarchy("closing tag without matching open tag".into())
                })?;
                attach(&mut stack, &mut document, name, node);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(TraceError::XmlParse {
                    context: format!("hierarchy dump at byte {}", reader.buffer_position()),
                    source: e,
                });
            }
        }
    }

    if let Some((name, _)) = stack.last() {
        return Err(TraceError::InvalidHierarchy(format!("unclosed <{}> element", name)));
    }
    if document.is_empty() {
        return Err(TraceError::InvalidHierarchy("dump contains no elements".into()));
    }

    Ok(Value::Object(document))
}

fn open_element(start: &BytesStart) -> Result<(String, RawNode), TraceError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut node = RawNode::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| TraceError::XmlParse {
            context: format!("attribute of <{}>", name),
            source: e.into(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| TraceError::XmlParse {
            context: format!("value of {}", key),
            source: e,
        })?;
        node.insert(
            format!("{}{}", ATTRIBUTE_MARKER, key),
            Value::String(value.into_owned()),
        );
    }

    Ok((name, node))
}

fn attach(stack: &mut [(String, RawNode)], document: &mut RawNode, name: String, node: RawNode) {
    let parent = match stack.last_mut() {
        Some((_, parent)) => parent,
        None => document,
    };
    push_child(parent, name, Value::Object(node));
}

fn push_child(parent: &mut RawNode, name: String, child: Value) {
    match parent.get_mut(&name) {
        None => {
            parent.insert(name, child);
        }
        Some(Value::Array(items)) => items.push(child),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, child]);
        }
    }
}
