use screen_trace::TraceError;
use screen_trace::element::element_model::{Bounds, CanonicalNode};
use screen_trace::element::extractor::{ElementExtractor, extract_elements};
use screen_trace::hierarchy::convert::{HierarchyFormat, canonical_root, convert_dump};
use serde_json::{Map, Value, json};

mod common;
use crate::common::dump_xml;

fn node(class: &str, bounds: [i32; 4], label: Option<&str>) -> CanonicalNode {
    CanonicalNode {
        id: 0,
        class: Some(class.into()),
        bounds: Some(Bounds::from(bounds)),
        component_label: label.map(String::from),
        icon_class: None,
        children_ids: vec![],
        attributes: Map::new(),
    }
}

/// Rico-style semantic tree: a layout root with a labeled button, a nested
/// layout holding an icon, and a degenerate text view.
fn semantic_tree() -> Value {
    json!({
        "class": "com.android.internal.policy.PhoneWindow$DecorView",
        "bounds": [0, 0, 1440, 2560],
        "componentLabel": "Background",
        "ancestors": ["android.widget.FrameLayout", "android.view.ViewGroup"],
        "children": [
            {
                "class": "android.widget.Button",
                "bounds": [100, 200, 500, 300],
                "componentLabel": "Text Button",
                "text": "Sign in",
                "ancestors": ["android.widget.TextView"]
            },
            {
                "class": "android.widget.LinearLayout",
                "bounds": [0, 400, 1440, 800],
                "componentLabel": "List Item",
                "children": [
                    {
                        "class": "android.widget.ImageView",
                        "bounds": [10, 410, 110, 510],
                        "componentLabel": "Icon",
                        "iconClass": "arrow_backward"
                    },
                    {
                        "class": "android.widget.TextView",
                        "bounds": [200, 410, 200, 510],
                        "componentLabel": "Text"
                    }
                ]
            },
            {
                "class": "android.view.View",
                "bounds": [0, 900, 100, 1000]
            }
        ]
    })
}

// =========================================================================
// Validity predicate
// =========================================================================

#[test]
fn degenerate_bounds_are_invalid() {
    assert!(!node("Button", [5, 5, 5, 10], Some("Button")).is_valid_element());
    assert!(!node("Button", [5, 10, 50, 10], Some("Button")).is_valid_element());
}

#[test]
fn layout_classes_are_invalid_regardless_of_bounds() {
    assert!(!node("android.widget.LinearLayout", [0, 0, 100, 100], Some("List Item")).is_valid_element());
    assert!(!node("androidx.constraintlayout.widget.ConstraintLAYOUT", [0, 0, 100, 100], Some("X")).is_valid_element());
}

#[test]
fn labeled_button_with_area_is_valid() {
    assert!(node("Button", [0, 0, 100, 40], Some("Button")).is_valid_element());
}

#[test]
fn unlabeled_node_is_invalid() {
    assert!(!node("Button", [0, 0, 100, 40], None).is_valid_element());
}

// =========================================================================
// Id assignment
// =========================================================================

#[test]
fn ids_are_dense_preorder_and_children_follow_parent() {
    let tree = extract_elements(semantic_tree()).unwrap();

    let ids: Vec<usize> = tree.nodes().iter().map(|n| n.id).collect();
    assert_eq!(ids, (0..6).collect::<Vec<_>>(), "ids 0..k-1 without gaps");

    for parent in tree.nodes() {
        for child in &parent.children_ids {
            assert!(*child > parent.id, "child {} must follow parent {}", child, parent.id);
        }
    }

    let root = tree.root().unwrap();
    assert_eq!(root.children_ids, vec![1, 2, 5]);
    assert_eq!(tree.get(2).unwrap().children_ids, vec![3, 4]);
    assert_eq!(tree.get(2).unwrap().class.as_deref(), Some("android.widget.LinearLayout"));
    assert_eq!(tree.get(5).unwrap().class.as_deref(), Some("android.view.View"));
}

#[test]
fn element_list_filters_but_traversal_keeps_layout_children() {
    let tree = extract_elements(semantic_tree()).unwrap();

    // Root (DecorView, labeled), button, icon. The layout, the zero-width
    // text and the unlabeled view are excluded.
    assert_eq!(tree.element_ids(), &[0, 1, 3]);

    let icon = tree.get(3).unwrap();
    assert_eq!(icon.component_label.as_deref(), Some("Icon"));
    assert_eq!(icon.icon_class.as_deref(), Some("arrow_backward"));

    // Parent links may point at filtered-out nodes; they still resolve.
    assert!(tree.root().unwrap().children_ids.contains(&2));
    assert!(tree.get(2).is_some());
    assert!(!tree.element_ids().contains(&2));
}

#[test]
fn ancestors_and_nested_children_are_dropped() {
    let tree = extract_elements(semantic_tree()).unwrap();

    for n in tree.nodes() {
        assert!(!n.attributes.contains_key("ancestors"));
        assert!(!n.attributes.contains_key("children"));
    }
    assert_eq!(tree.get(1).unwrap().attributes["text"], json!("Sign in"));
}

#[test]
fn element_records_serialize_with_export_keys() {
    let tree = extract_elements(semantic_tree()).unwrap();
    let records = serde_json::to_value(tree.element_records()).unwrap();

    let icon = &records[2];
    assert_eq!(icon["id"], json!(3));
    assert_eq!(icon["class"], json!("android.widget.ImageView"));
    assert_eq!(icon["bounds"], json!([10, 410, 110, 510]));
    assert_eq!(icon["componentLabel"], json!("Icon"));
    assert_eq!(icon["iconClass"], json!("arrow_backward"));
    assert_eq!(icon["children-id"], json!([]));

    assert_eq!(records[0]["children-id"], json!([1, 2, 5]));
    assert!(records[1].get("iconClass").is_none());
}

#[test]
fn icon_class_requires_icon_label() {
    let tree = extract_elements(json!({
        "class": "ImageView",
        "bounds": [0, 0, 10, 10],
        "componentLabel": "Image",
        "iconClass": "star"
    }))
    .unwrap();

    assert_eq!(tree.root().unwrap().icon_class, None);
}

#[test]
fn empty_children_sequence_yields_empty_children_ids() {
    let tree = extract_elements(json!({
        "class": "FrameLayout",
        "bounds": [0, 0, 10, 10],
        "children": []
    }))
    .unwrap();

    assert_eq!(tree.len(), 1);
    assert!(tree.root().unwrap().children_ids.is_empty());
    assert!(!tree.root().unwrap().attributes.contains_key("children"));
}

// =========================================================================
// Missing fields
// =========================================================================

#[test]
fn missing_fields_are_reported_without_stopping_siblings() {
    let tree = ElementExtractor::new().extract(json!({
        "class": "Root",
        "bounds": [0, 0, 100, 100],
        "componentLabel": "Background",
        "children": [
            {"bounds": [0, 0, 10, 10], "componentLabel": "Icon"},
            {"class": "Button", "componentLabel": "Button"},
            {"class": "Button", "bounds": [0, 20, 50, 40], "componentLabel": "Button"}
        ]
    }));

    assert_eq!(tree.len(), 4);
    assert_eq!(tree.element_ids(), &[0, 3], "only complete valid nodes are listed");

    let issues = tree.issues();
    assert_eq!(issues.len(), 2);
    assert!(matches!(issues[0], TraceError::MissingRequiredField { node_id: 1, field: "class" }));
    assert!(matches!(issues[1], TraceError::MissingRequiredField { node_id: 2, field: "bounds" }));

    let err = tree.into_strict().unwrap_err();
    assert!(matches!(err, TraceError::MissingRequiredField { node_id: 1, .. }));
}

#[test]
fn bad_bounds_values_are_reported() {
    let tree = ElementExtractor::new().extract(json!({"class": "View", "bounds": [1, 2, 3]}));
    assert!(matches!(tree.issues()[0], TraceError::MalformedBounds { .. }));
}

// =========================================================================
// Counter and source formats
// =========================================================================

#[test]
fn extractor_counter_continues_across_trees() {
    let mut extractor = ElementExtractor::new();
    let first = extractor.extract(semantic_tree());
    let second = extractor.extract(semantic_tree());

    assert_eq!(first.root().unwrap().id, 0);
    assert_eq!(second.root().unwrap().id, 6);
    assert_eq!(second.get(9).unwrap().icon_class.as_deref(), Some("arrow_backward"));
    assert!(second.get(0).is_none(), "ids of other trees do not resolve");
    assert_eq!(extractor.next_id(), 12);
}

#[test]
fn raw_and_canonical_sources_converge() {
    let canonical_doc = convert_dump(&dump_xml("OK")).unwrap();
    let from_canonical = canonical_root(canonical_doc, HierarchyFormat::Canonical).unwrap();

    let raw_doc = screen_trace::hierarchy::raw::parse_dump_xml(&dump_xml("OK")).unwrap();
    let from_raw = canonical_root(raw_doc, HierarchyFormat::Raw).unwrap();

    assert_eq!(from_canonical, from_raw);

    // Device dumps carry no component labels, so nothing is a valid element.
    let tree = extract_elements(from_raw).unwrap();
    assert_eq!(tree.len(), 4);
    assert!(tree.element_ids().is_empty());
    assert_eq!(tree.get(1).unwrap().bounds, Some(Bounds::new(10, 20, 80, 50)));
    assert_eq!(tree.get(1).unwrap().attributes["clickable"], json!(true));
}
