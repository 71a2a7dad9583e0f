use std::fmt;
use std::str::FromStr;

use serde_json::{Value, json};
use tracing::warn;

use crate::error::TraceError;
use crate::hierarchy::normalize::{CHILDREN_KEY, normalize_node};
use crate::hierarchy::raw::parse_dump_xml;

// ============================================================================
// Source formats
// ============================================================================

/// The two shapes a hierarchy document arrives in.
///
/// `Raw` is the parsed device dump (`{"hierarchy": {"node": ...}}`).
/// `Canonical` is either a converted document (`{"activity": {"root": ...}}`)
/// or a bare semantic tree whose root is the document itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyFormat {
    Raw,
    Canonical,
}

impl FromStr for HierarchyFormat {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" | "xml" | "device" => Ok(HierarchyFormat::Raw),
            "canonical" | "rico" | "semantic" => Ok(HierarchyFormat::Canonical),
            other => Err(TraceError::Config(format!(
                "unknown hierarchy format '{}' (expected raw or canonical)",
                other
            ))),
        }
    }
}

impl fmt::Display for HierarchyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HierarchyFormat::Raw => write!(f, "raw"),
            HierarchyFormat::Canonical => write!(f, "canonical"),
        }
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Recursively normalize a raw node tree.
///
/// `children`, when present, is always a sequence afterwards: a raw single
/// child object becomes a one-element array. Canonical input passes through
/// unchanged.
pub fn convert_tree(node: Value) -> Result<Value, TraceError> {
    let raw = match node {
        Value::Object(map) => map,
        other => {
            return Err(TraceError::InvalidHierarchy(format!(
                "expected an object node, found {}",
                value_kind(&other)
            )));
        }
    };

    let mut node = normalize_node(raw)?;

    if let Some(children) = node.remove(CHILDREN_KEY) {
        let converted = match children {
            Value::Array(items) => items
                .into_iter()
                .map(convert_tree)
                .collect::<Result<Vec<_>, _>>()?,
            single => vec![convert_tree(single)?],
        };
        node.insert(CHILDREN_KEY.to_string(), Value::Array(converted));
    }

    Ok(Value::Object(node))
}

/// Resolve the canonical tree root of a document in either format,
/// converting raw documents on the way.
pub fn canonical_root(document: Value, format: HierarchyFormat) -> Result<Value, TraceError> {
    match format {
        HierarchyFormat::Raw => convert_tree(take_raw_root(document)?),
        HierarchyFormat::Canonical => Ok(take_canonical_root(document)),
    }
}

/// Convert a raw dump document into the canonical `{"activity": {"root": ...}}` document.
pub fn to_canonical_document(raw_document: Value) -> Result<Value, TraceError> {
    let root = canonical_root(raw_document, HierarchyFormat::Raw)?;
    Ok(json!({ "activity": { "root": root } }))
}

/// Parse an XML dump and convert it in one step.
pub fn convert_dump(xml: &str) -> Result<Value, TraceError> {
    to_canonical_document(parse_dump_xml(xml)?)
}

fn take_raw_root(mut document: Value) -> Result<Value, TraceError> {
    let root = document
        .get_mut("hierarchy")
        .and_then(|h| h.get_mut("node"))
        .map(Value::take)
        .ok_or_else(|| TraceError::InvalidHierarchy("raw document has no hierarchy.node".into()))?;

    match root {
        Value::Array(mut windows) => {
            if windows.is_empty() {
                return Err(TraceError::InvalidHierarchy("hierarchy.node is empty".into()));
            }
            warn!(
                windows = windows.len(),
                "Dump has several top-level nodes, keeping the first"
            );
            Ok(windows.swap_remove(0))
        }
        node => Ok(node),
    }
}

fn take_canonical_root(mut document: Value) -> Value {
    let wrapped = document
        .get_mut("activity")
        .and_then(|a| a.get_mut("root"))
        .map(Value::take);

    wrapped.unwrap_or(document)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
