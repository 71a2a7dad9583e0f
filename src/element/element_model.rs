use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TraceError;

// ============================================================================
// Bounds
// ============================================================================

/// Screen rectangle in device pixels, serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Bounds {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Bounds {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Bounds { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> i32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Non-degenerate: `x1 < x2` and `y1 < y2`.
    pub fn has_area(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    /// Read bounds from an already-canonical JSON value (array of 4 integers).
    pub fn from_value(value: &Value) -> Option<Bounds> {
        let items = value.as_array()?;
        if items.len() != 4 {
            return None;
        }
        let mut coords = [0i32; 4];
        for (slot, item) in coords.iter_mut().zip(items) {
            *slot = i32::try_from(item.as_i64()?).ok()?;
        }
        Some(Bounds::from(coords))
    }

    pub fn to_value(&self) -> Value {
        Value::from(vec![self.x1, self.y1, self.x2, self.y2])
    }
}

impl From<[i32; 4]> for Bounds {
    fn from(c: [i32; 4]) -> Self {
        Bounds::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Bounds> for [i32; 4] {
    fn from(b: Bounds) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Parses the packed device form `[x1,y1][x2,y2]`.
impl FromStr for Bounds {
    type Err = TraceError;

    fn from_str(packed: &str) -> Result<Self, Self::Err> {
        let malformed = || TraceError::MalformedBounds {
            value: packed.to_string(),
        };

        let inner = packed
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(malformed)?;

        let pairs: Vec<&str> = inner.split("][").collect();
        if pairs.len() != 2 {
            return Err(malformed());
        }

        let mut coords = Vec::with_capacity(4);
        for pair in pairs {
            let parts: Vec<&str> = pair.split(',').collect();
            if parts.len() != 2 {
                return Err(malformed());
            }
            for part in parts {
                coords.push(part.trim().parse::<i32>().map_err(|_| malformed())?);
            }
        }

        Ok(Bounds::new(coords[0], coords[1], coords[2], coords[3]))
    }
}

// ============================================================================
// Canonical node
// ============================================================================

/// One node of an id-addressable canonical tree.
///
/// `class` and `bounds` are optional only so that nodes which fail
/// extraction can still occupy their id slot; every node listed as an
/// element carries both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalNode {
    pub id: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,

    #[serde(rename = "componentLabel", skip_serializing_if = "Option::is_none")]
    pub component_label: Option<String>,

    /// Only kept when `componentLabel == "Icon"`
    #[serde(rename = "iconClass", skip_serializing_if = "Option::is_none")]
    pub icon_class: Option<String>,

    /// Ids of direct children; may reference nodes that are not elements
    #[serde(rename = "children-id", default)]
    pub children_ids: Vec<usize>,

    /// Remaining device/semantic attributes (text, resource-id, clickable, ...)
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl CanonicalNode {
    /// Element validity: non-degenerate bounds, not a layout container,
    /// and annotated with a component label.
    pub fn is_valid_element(&self) -> bool {
        let bounds_ok = self.bounds.map_or(false, |b| b.has_area());
        let class_ok = self
            .class
            .as_deref()
            .map_or(false, |c| !c.to_lowercase().contains("layout"));

        bounds_ok && class_ok && self.component_label.is_some()
    }
}

// ============================================================================
// Element tree (arena)
// ============================================================================

/// Flattened canonical tree. Nodes are stored densely by id starting at
/// `first_id`; `elements` lists the ids of valid nodes in pre-order.
#[derive(Debug, Default)]
pub struct ElementTree {
    pub(crate) first_id: usize,
    pub(crate) nodes: Vec<CanonicalNode>,
    pub(crate) elements: Vec<usize>,
    pub(crate) issues: Vec<TraceError>,
}

impl ElementTree {
    /// All nodes in id order, valid or not.
    pub fn nodes(&self) -> &[CanonicalNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&CanonicalNode> {
        self.nodes.first()
    }

    /// Look up a node by id. Returns `None` for ids outside this tree.
    pub fn get(&self, id: usize) -> Option<&CanonicalNode> {
        id.checked_sub(self.first_id)
            .and_then(|idx| self.nodes.get(idx))
    }

    /// Ids of valid elements in pre-order.
    pub fn element_ids(&self) -> &[usize] {
        &self.elements
    }

    /// Valid elements in pre-order.
    pub fn elements(&self) -> impl Iterator<Item = &CanonicalNode> {
        self.elements.iter().filter_map(|id| self.get(*id))
    }

    /// Owned copy of the element list, ready for export.
    pub fn element_records(&self) -> Vec<CanonicalNode> {
        self.elements().cloned().collect()
    }

    /// Per-node problems found during extraction (missing class/bounds,
    /// malformed bounds values).
    pub fn issues(&self) -> &[TraceError] {
        &self.issues
    }

    /// Fail with the first recorded issue, if any.
    pub fn into_strict(self) -> Result<ElementTree, TraceError> {
        let ElementTree {
            first_id,
            nodes,
            elements,
            issues,
        } = self;

        match issues.into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(ElementTree {
                first_id,
                nodes,
                elements,
                issues: Vec::new(),
            }),
        }
    }
}
