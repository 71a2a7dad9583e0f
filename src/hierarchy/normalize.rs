use serde_json::Value;

use crate::element::element_model::Bounds;
use crate::error::TraceError;
use crate::hierarchy::raw::{ATTRIBUTE_MARKER, RawNode};

/// Raw key holding child fragments.
const CHILD_KEY: &str = "node";
/// Raw ordinal attribute, only meaningful for dump ordering.
const ORDINAL_KEY: &str = "@index";

pub const CHILDREN_KEY: &str = "children";
const BOUNDS_KEY: &str = "bounds";

/// Rewrite one raw node into canonical keys and types. Single level only:
/// the `children` value is passed through untouched.
pub fn normalize_node(raw: RawNode) -> Result<RawNode, TraceError> {
    let mut node = RawNode::new();

    for (key, value) in raw {
        let value = coerce_bool(value);

        if key == CHILD_KEY {
            node.insert(CHILDREN_KEY.to_string(), value);
            continue;
        }
        if key == ORDINAL_KEY {
            continue;
        }

        let name = strip_marker(key);
        let value = match value {
            Value::String(packed) if name == BOUNDS_KEY => packed.parse::<Bounds>()?.to_value(),
            other => other,
        };
        node.insert(name, value);
    }

    Ok(node)
}

fn coerce_bool(value: Value) -> Value {
    match value.as_str() {
        Some("true") => Value::Bool(true),
        Some("false") => Value::Bool(false),
        _ => value,
    }
}

fn strip_marker(key: String) -> String {
    if key.starts_with(ATTRIBUTE_MARKER) {
        key[ATTRIBUTE_MARKER.len_utf8()..].to_string()
    } else {
        key
    }
}
