//! JSON snapshot of the decision tree.
//!
//! Boundary format: `{"root": <node>}` where each node carries its id,
//! symbol (-1 at the root), weight, synthesis label, stats triple and its
//! children in ascending symbol order. The snapshot is a detached copy and
//! is only consistent if no insertion interleaves with its capture.

use serde::{Deserialize, Serialize};

use crate::decision::Decision;
use crate::tree::{Node, PrefixDecisionTree, Stats};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub root: NodeSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: u32,
    pub symbol: i32,
    pub weight: u64,
    pub synthesis: Decision,
    pub stats: Stats,
    pub children: Vec<NodeSnapshot>,
}

impl TreeSnapshot {
    /// Capture the whole tree, children sorted by symbol at every level.
    pub fn capture(tree: &PrefixDecisionTree) -> Self {
        Self {
            root: capture_node(tree, tree.root()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl PrefixDecisionTree {
    /// Serialize the tree in the boundary JSON format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        TreeSnapshot::capture(self).to_json()
    }
}

fn capture_node(tree: &PrefixDecisionTree, node: &Node) -> NodeSnapshot {
    let mut symbols: Vec<i32> = node.children().keys().copied().collect();
    symbols.sort_unstable();

    NodeSnapshot {
        id: node.id,
        symbol: node.symbol,
        weight: node.weight,
        synthesis: node.synthesis,
        stats: node.stats,
        children: symbols
            .into_iter()
            .filter_map(|symbol| {
                let id = node.children()[&symbol];
                tree.node(id).map(|child| capture_node(tree, child))
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> PrefixDecisionTree {
        let mut tree = PrefixDecisionTree::new(0.70);
        for _ in 0..10 {
            tree.insert(&[1, 2, 3], true, false);
        }
        tree.insert(&[1, 2, 4], false, true);
        tree.insert(&[3, 1], false, false);
        tree
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let tree = sample_tree();
        let snapshot = TreeSnapshot::capture(&tree);
        let json = snapshot.to_json().unwrap();
        let parsed: TreeSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn snapshot_matches_in_memory_tree() {
        let tree = sample_tree();
        let snapshot = TreeSnapshot::capture(&tree);

        assert_eq!(snapshot.root.id, 0);
        assert_eq!(snapshot.root.symbol, -1);
        assert_eq!(snapshot.root.weight, 0);

        let depth1: Vec<i32> = snapshot.root.children.iter().map(|c| c.symbol).collect();
        assert_eq!(depth1, vec![1, 3]);

        let terminal = &snapshot.root.children[0].children[0].children[0];
        let node = tree.find(&[1, 2, 3]).unwrap();
        assert_eq!(terminal.id, node.id);
        assert_eq!(terminal.weight, node.weight);
        assert_eq!(terminal.stats, node.stats);
        assert_eq!(terminal.synthesis, node.synthesis);
    }

    #[test]
    fn children_are_sorted_even_when_inserted_out_of_order() {
        let mut tree = PrefixDecisionTree::new(0.70);
        tree.insert(&[9], true, false);
        tree.insert(&[2], true, false);
        tree.insert(&[5], true, false);

        let snapshot = TreeSnapshot::capture(&tree);
        let symbols: Vec<i32> = snapshot.root.children.iter().map(|c| c.symbol).collect();
        assert_eq!(symbols, vec![2, 5, 9]);
    }

    #[test]
    fn json_field_layout_matches_boundary_format() {
        let tree = sample_tree();
        let json = tree.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let root = &value["root"];
        assert_eq!(root["symbol"], -1);
        assert_eq!(root["synthesis"], "NONE");
        assert!(root["stats"]["buy_wins"].is_u64());
        assert!(root["stats"]["sell_wins"].is_u64());
        assert!(root["stats"]["hold_count"].is_u64());
        assert!(root["children"].is_array());

        let terminal = &root["children"][0]["children"][0]["children"][0];
        assert_eq!(terminal["synthesis"], "BUY");
        assert_eq!(terminal["weight"], 10);
        assert_eq!(terminal["stats"]["buy_wins"], 10);
    }
}
