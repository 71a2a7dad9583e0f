use serde_json::{Map, Value};
use tracing::debug;

use crate::element::element_model::{Bounds, CanonicalNode, ElementTree};
use crate::error::TraceError;

/// Ancestor-chain metadata carried by semantic trees; dropped on extraction.
const ANCESTORS_KEY: &str = "ancestors";
const CHILDREN_KEY: &str = "children";

/// Walks canonical trees in pre-order, assigning dense ids and collecting
/// valid elements.
///
/// The counter persists across calls, so extracting several trees with the
/// same extractor yields ids that never collide.
#[derive(Debug, Default)]
pub struct ElementExtractor {
    next_id: usize,
}

impl ElementExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next extracted root will receive.
    pub fn next_id(&self) -> usize {
        self.next_id
    }

    /// Consume a canonical tree and flatten it into an id-addressable arena.
    ///
    /// Nodes missing `class` or `bounds` are recorded as issues and left out
    /// of the element list; their children and siblings are still visited.
    pub fn extract(&mut self, root: Value) -> ElementTree {
        let mut tree = ElementTree {
            first_id: self.next_id,
            ..Default::default()
        };

        self.visit(root, &mut tree);
        // The last assigned id is taken; the next tree starts after it.
        self.next_id += 1;

        debug!(
            nodes = tree.nodes.len(),
            elements = tree.elements.len(),
            issues = tree.issues.len(),
            "Extracted element tree"
        );
        tree
    }

    fn visit(&mut self, node: Value, tree: &mut ElementTree) -> usize {
        let id = self.next_id;

        let mut fields = match node {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let children = fields.remove(CHILDREN_KEY);
        fields.remove(ANCESTORS_KEY);

        let node = build_node(id, fields, &mut tree.issues);
        if node.is_valid_element() {
            tree.elements.push(id);
        }

        let slot = tree.nodes.len();
        tree.nodes.push(node);

        if let Some(children) = children {
            let children = match children {
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                single => vec![single],
            };

            let mut children_ids = Vec::with_capacity(children.len());
            for child in children {
                self.next_id += 1;
                children_ids.push(self.visit(child, tree));
            }
            tree.nodes[slot].children_ids = children_ids;
        }

        id
    }
}

/// Extract a tree with a fresh counter, failing on the first node issue.
pub fn extract_elements(root: Value) -> Result<ElementTree, TraceError> {
    ElementExtractor::new().extract(root).into_strict()
}

fn build_node(id: usize, mut fields: Map<String, Value>, issues: &mut Vec<TraceError>) -> CanonicalNode {
    // Stale values from a previous extraction must not shadow the new ones.
    fields.remove("id");
    fields.remove("children-id");

    let class = match fields.remove("class") {
        Some(Value::String(class)) => Some(class),
        _ => {
            issues.push(TraceError::MissingRequiredField {
                node_id: id,
                field: "class",
            });
            None
        }
    };

    let bounds = match fields.remove("bounds") {
        Some(Value::String(packed)) => match packed.parse::<Bounds>() {
            Ok(b) => Some(b),
            Err(e) => {
                issues.push(e);
                None
            }
        },
        Some(value) if !value.is_null() => {
            let parsed = Bounds::from_value(&value);
            if parsed.is_none() {
                issues.push(TraceError::MalformedBounds {
                    value: value.to_string(),
                });
            }
            parsed
        }
        _ => {
            issues.push(TraceError::MissingRequiredField {
                node_id: id,
                field: "bounds",
            });
            None
        }
    };

    let component_label = take_string(&mut fields, "componentLabel");
    let icon_class = take_string(&mut fields, "iconClass")
        .filter(|_| component_label.as_deref() == Some("Icon"));

    CanonicalNode {
        id,
        class,
        bounds,
        component_label,
        icon_class,
        children_ids: Vec::new(),
        attributes: fields,
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}
