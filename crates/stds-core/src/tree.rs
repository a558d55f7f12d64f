//! Prefix tree over symbol sequences with per-node outcome statistics.
//!
//! Nodes live in an arena indexed by creation order, so a node's id doubles
//! as its arena index and child maps store ids instead of pointers. The tree
//! only grows; nodes are never deleted or relabeled.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::decision::Decision;

/// Ratio above which a node that misses the confidence gate still reads HOLD.
const HOLD_RATIO: f64 = 0.4;

/// Outcome counters accumulated at sequence-terminal nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub buy_wins: u32,
    pub sell_wins: u32,
    pub hold_count: u32,
}

/// A single tree node.
///
/// `weight` counts every insertion whose path visited this node; `stats`
/// only counts insertions that terminated here. Interior nodes therefore
/// keep a zero stats block and their initial NONE synthesis.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: u32,
    pub symbol: i32,
    pub weight: u64,
    pub stats: Stats,
    pub synthesis: Decision,
    children: FxHashMap<i32, u32>,
}

impl Node {
    fn new(id: u32, symbol: i32) -> Self {
        Self {
            id,
            symbol,
            weight: 0,
            stats: Stats::default(),
            synthesis: Decision::None,
            children: FxHashMap::default(),
        }
    }

    /// Child ids keyed by symbol. Iteration order is unspecified; consumers
    /// that need ordering sort by symbol.
    pub fn children(&self) -> &FxHashMap<i32, u32> {
        &self.children
    }

    fn event(&self) -> NodeEvent {
        NodeEvent {
            id: self.id,
            symbol: self.symbol,
            weight: self.weight,
            synthesis: self.synthesis,
            stats: self.stats,
        }
    }
}

/// By-value snapshot of a node, as delivered to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeEvent {
    pub id: u32,
    pub symbol: i32,
    pub weight: u64,
    pub synthesis: Decision,
    pub stats: Stats,
}

/// Sink for node-creation events.
///
/// Fires synchronously inside `insert`, once per freshly created node,
/// before any later node of the same sequence is created. The event is a
/// detached copy; sinks must not assume it stays current as the tree grows.
pub trait NodeObserver {
    fn node_created(&mut self, event: NodeEvent);
}

impl<F: FnMut(NodeEvent)> NodeObserver for F {
    fn node_created(&mut self, event: NodeEvent) {
        self(event)
    }
}

/// Prefix tree mapping fixed-length symbol sequences to trading decisions.
pub struct PrefixDecisionTree {
    nodes: Vec<Node>,
    confidence_threshold: f64,
    observer: Option<Box<dyn NodeObserver>>,
}

impl PrefixDecisionTree {
    /// Create a tree holding only the root (id 0, symbol -1).
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            nodes: vec![Node::new(0, -1)],
            confidence_threshold,
            observer: None,
        }
    }

    /// Install the node-creation sink. Replaces any previous sink.
    pub fn set_observer<O: NodeObserver + 'static>(&mut self, observer: O) {
        self.observer = Some(Box::new(observer));
    }

    /// Insert one training sequence with its outcome flags.
    ///
    /// Missing path nodes are created on the way down; every visited
    /// non-root node gains one weight. Outcome counters and the cached
    /// decision are updated at the terminal node only. Both flags may be
    /// set at once; neither set counts as a hold. Empty sequences are
    /// ignored.
    pub fn insert(&mut self, sequence: &[i32], buy_profitable: bool, sell_profitable: bool) {
        if sequence.is_empty() {
            return;
        }

        let mut current = 0usize;
        for &symbol in sequence {
            let next = match self.nodes[current].children.get(&symbol).copied() {
                Some(id) => id as usize,
                None => {
                    let id = self.nodes.len() as u32;
                    self.nodes.push(Node::new(id, symbol));
                    self.nodes[current].children.insert(symbol, id);

                    let event = self.nodes[id as usize].event();
                    if let Some(observer) = self.observer.as_mut() {
                        observer.node_created(event);
                    }
                    id as usize
                }
            };
            current = next;
            self.nodes[current].weight += 1;
        }

        let threshold = self.confidence_threshold;
        let node = &mut self.nodes[current];
        if buy_profitable {
            node.stats.buy_wins += 1;
        }
        if sell_profitable {
            node.stats.sell_wins += 1;
        }
        if !buy_profitable && !sell_profitable {
            node.stats.hold_count += 1;
        }
        node.synthesis = synthesize(node.weight, node.stats, threshold);
    }

    /// Decision cached at the node reached by following `sequence` exactly.
    ///
    /// Any missing step, or an empty sequence, yields NONE.
    pub fn query(&self, sequence: &[i32]) -> Decision {
        if sequence.is_empty() {
            return Decision::None;
        }
        self.find(sequence)
            .map_or(Decision::None, |node| node.synthesis)
    }

    /// Node at the end of `sequence`, if the full path exists. The empty
    /// sequence resolves to the root.
    pub fn find(&self, sequence: &[i32]) -> Option<&Node> {
        let mut current = &self.nodes[0];
        for symbol in sequence {
            let id = *current.children.get(symbol)?;
            current = &self.nodes[id as usize];
        }
        Some(current)
    }

    /// Total nodes created so far, root included.
    pub fn node_count(&self) -> u32 {
        self.nodes.len() as u32
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn node(&self, id: u32) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }
}

/// Per-node decision rule.
///
/// Ratios divide by the node's full visit weight. BUY is tested before SELL,
/// so BUY wins when both ratios clear the confidence gate.
fn synthesize(weight: u64, stats: Stats, confidence_threshold: f64) -> Decision {
    if weight == 0 {
        return Decision::None;
    }

    let buy_ratio = stats.buy_wins as f64 / weight as f64;
    let sell_ratio = stats.sell_wins as f64 / weight as f64;

    if buy_ratio > confidence_threshold {
        Decision::Buy
    } else if sell_ratio > confidence_threshold {
        Decision::Sell
    } else if buy_ratio > HOLD_RATIO || sell_ratio > HOLD_RATIO {
        Decision::Hold
    } else {
        Decision::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn prefix_sharing_counts_nodes_once() {
        let mut tree = PrefixDecisionTree::new(0.70);
        tree.insert(&[1, 2, 3], true, false);
        tree.insert(&[1, 2, 4], false, true);
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn repeated_profitable_buys_yield_buy() {
        let mut tree = PrefixDecisionTree::new(0.70);
        for _ in 0..10 {
            tree.insert(&[1, 2, 3, 4, 5], true, false);
        }
        assert_eq!(tree.query(&[1, 2, 3, 4, 5]), Decision::Buy);
        assert_eq!(tree.query(&[1, 2, 3, 4, 6]), Decision::None);
    }

    #[test]
    fn sixty_percent_buys_read_hold_not_buy() {
        let mut tree = PrefixDecisionTree::new(0.70);
        for _ in 0..6 {
            tree.insert(&[1, 2, 3], true, false);
        }
        for _ in 0..4 {
            tree.insert(&[1, 2, 3], false, false);
        }

        let terminal = tree.find(&[1, 2, 3]).unwrap();
        assert_eq!(terminal.weight, 10);
        assert_eq!(
            terminal.stats,
            Stats {
                buy_wins: 6,
                sell_wins: 0,
                hold_count: 4,
            }
        );
        assert_eq!(tree.query(&[1, 2, 3]), Decision::Hold);
    }

    #[test]
    fn sell_side_clears_gate_when_buy_does_not() {
        let mut tree = PrefixDecisionTree::new(0.70);
        for _ in 0..10 {
            tree.insert(&[7, 8], false, true);
        }
        assert_eq!(tree.query(&[7, 8]), Decision::Sell);
    }

    #[test]
    fn buy_dominates_sell_when_both_clear_the_gate() {
        let mut tree = PrefixDecisionTree::new(0.70);
        for _ in 0..5 {
            tree.insert(&[3, 3], true, true);
        }
        let terminal = tree.find(&[3, 3]).unwrap();
        assert_eq!(terminal.stats.buy_wins, 5);
        assert_eq!(terminal.stats.sell_wins, 5);
        assert_eq!(tree.query(&[3, 3]), Decision::Buy);
    }

    #[test]
    fn empty_sequence_is_inert() {
        let mut tree = PrefixDecisionTree::new(0.70);
        tree.insert(&[], true, true);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.query(&[]), Decision::None);
    }

    #[test]
    fn interior_nodes_gain_weight_but_no_stats() {
        let mut tree = PrefixDecisionTree::new(0.70);
        for _ in 0..3 {
            tree.insert(&[1, 2], true, false);
        }

        let interior = tree.find(&[1]).unwrap();
        assert_eq!(interior.weight, 3);
        assert_eq!(interior.stats, Stats::default());
        assert_eq!(interior.synthesis, Decision::None);

        let terminal = tree.find(&[1, 2]).unwrap();
        assert_eq!(terminal.weight, 3);
        assert_eq!(terminal.stats.buy_wins, 3);
    }

    #[test]
    fn ids_are_monotonic_and_observer_sees_every_creation() {
        let seen: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut tree = PrefixDecisionTree::new(0.70);
        tree.set_observer(move |event: NodeEvent| sink.borrow_mut().push(event.id));

        let mut previous_count = tree.node_count();
        for sequence in [&[1, 2, 3][..], &[1, 2, 4][..], &[2, 2, 3][..], &[1, 2, 3][..]] {
            tree.insert(sequence, true, false);
            assert!(tree.node_count() >= previous_count);
            previous_count = tree.node_count();
        }

        let ids = seen.borrow();
        let expected: Vec<u32> = (1..tree.node_count()).collect();
        assert_eq!(*ids, expected);
    }

    #[test]
    fn observer_event_captures_creation_state() {
        let events: Rc<RefCell<Vec<NodeEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let mut tree = PrefixDecisionTree::new(0.70);
        tree.set_observer(move |event: NodeEvent| sink.borrow_mut().push(event));
        tree.insert(&[4, 9], true, false);

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].symbol, 4);
        assert_eq!(events[1].symbol, 9);
        // Creation fires before the visit bumps the weight.
        assert!(events.iter().all(|e| e.weight == 0));
        assert!(events.iter().all(|e| e.synthesis == Decision::None));
    }
}
