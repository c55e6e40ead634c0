use crate::split::{TEST_LABEL, TRAIN_LABEL};
use crate::tree::types::{AttrValue, Coloring, Meta, TreeNode};
use serde_json::json;
use std::collections::HashSet;

pub const SPLIT_COLORING_KEY: &str = "train_test";
const SPLIT_COLORING_TITLE: &str = "Train/Test Split";
const TRAIN_COLOR: &str = "#4C78A8";
const TEST_COLOR: &str = "#E45756";

/// Writes the train/test label onto every named node: test iff its name is
/// in `test_nodes`, train otherwise.
pub fn annotate_nodes(tree: &mut TreeNode, test_nodes: &HashSet<String>) {
    let mut stack: Vec<&mut TreeNode> = vec![tree];
    while let Some(node) = stack.pop() {
        let label = match &node.name {
            Some(name) if test_nodes.contains(name) => Some(TEST_LABEL),
            Some(_) => Some(TRAIN_LABEL),
            None => None,
        };
        if let Some(label) = label {
            let attrs = node.node_attrs.get_or_insert_with(Default::default);
            attrs.train_test = Some(AttrValue::new(label));
        }
        stack.extend(node.children.iter_mut());
    }
}

/// Inserts the categorical train/test coloring, or updates it in place when
/// a previous split already added one. Re-running never duplicates the entry.
pub fn add_split_coloring(meta: &mut Meta) {
    let scale = json!([[TRAIN_LABEL, TRAIN_COLOR], [TEST_LABEL, TEST_COLOR]]);

    if let Some(coloring) = meta
        .colorings
        .iter_mut()
        .find(|coloring| coloring.key == SPLIT_COLORING_KEY)
    {
        coloring.title = Some(SPLIT_COLORING_TITLE.to_string());
        coloring.scale_type = Some("categorical".to_string());
        coloring.scale = Some(scale);
        return;
    }

    meta.colorings.push(Coloring {
        key: SPLIT_COLORING_KEY.to_string(),
        title: Some(SPLIT_COLORING_TITLE.to_string()),
        scale_type: Some("categorical".to_string()),
        scale: Some(scale),
        extra: serde_json::Map::new(),
    });
}
