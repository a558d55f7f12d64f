//! Training and streaming drivers around the quantizer and decision tree.
//!
//! Bulk training turns the bar history into (window, outcome) pairs via the
//! profitability oracle; streaming inference keeps a rolling window of the
//! last L symbols and queries the tree once it is full.

use std::collections::VecDeque;

use tracing::{info, warn};

use crate::bar::Bar;
use crate::config::EngineConfig;
use crate::decision::Decision;
use crate::quantizer::Quantizer;
use crate::tree::{NodeObserver, PrefixDecisionTree};

/// Side of the profitability scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Buy,
    Sell,
}

/// Owns the quantizer, the tree and the bar/symbol buffers, and drives both
/// bulk training and per-bar inference.
pub struct Engine {
    config: EngineConfig,
    quantizer: Quantizer,
    tree: PrefixDecisionTree,
    bars: Vec<Bar>,
    symbols: Vec<i32>,
    window: VecDeque<i32>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            quantizer: Quantizer::new(config.num_bins),
            tree: PrefixDecisionTree::new(config.confidence_threshold),
            bars: Vec::new(),
            symbols: Vec::new(),
            window: VecDeque::with_capacity(config.sequence_length),
            config,
        }
    }

    /// Install the historical bar series and fit the quantizer on it.
    ///
    /// Reading bars from storage is the loader crate's job; the engine only
    /// consumes the in-memory series.
    pub fn load_bars(&mut self, bars: Vec<Bar>) {
        self.bars = bars;
        self.quantizer.fit(&self.bars);
        info!(bars = self.bars.len(), "bar history loaded, quantizer fitted");
    }

    /// Train the tree on every length-L window of the symbol record.
    ///
    /// Each window is labeled by scanning the bars after its anchor (the bar
    /// right past the window) for a take-profit touch on either side.
    /// Returns the number of sequences inserted; with fewer than L + H bars
    /// nothing is inserted and the tree stays untouched.
    pub fn train(&mut self) -> usize {
        let required = self.config.sequence_length + self.config.lookahead_days;
        if self.bars.len() < required {
            warn!(
                bars = self.bars.len(),
                required, "insufficient data for training"
            );
            return 0;
        }

        self.symbols = self.derive_symbols();

        let seq_len = self.config.sequence_length;
        let mut inserted = 0;
        for start in 0..self.symbols.len().saturating_sub(seq_len) {
            let anchor = start + seq_len;
            let buy_profitable = self.profitable(anchor, Side::Buy);
            let sell_profitable = self.profitable(anchor, Side::Sell);
            self.tree.insert(
                &self.symbols[start..start + seq_len],
                buy_profitable,
                sell_profitable,
            );
            inserted += 1;
        }

        info!(
            sequences = inserted,
            nodes = self.tree.node_count(),
            "training complete"
        );
        inserted
    }

    /// Append a live bar and return the decision for the current window.
    ///
    /// NONE until two bars exist and the rolling window has filled up to L
    /// symbols; after that, the tree is queried with the window as-is.
    pub fn process_new_bar(&mut self, bar: Bar) -> Decision {
        self.bars.push(bar);
        if self.bars.len() < 2 {
            return Decision::None;
        }

        let prev_close = self.bars[self.bars.len() - 2].close;
        let symbol = self
            .quantizer
            .transform(Quantizer::log_return(prev_close, bar.close));
        self.symbols.push(symbol);

        self.window.push_back(symbol);
        while self.window.len() > self.config.sequence_length {
            self.window.pop_front();
        }

        if self.window.len() == self.config.sequence_length {
            return self.tree.query(self.window.make_contiguous());
        }
        Decision::None
    }

    /// Any-touch profitability scan over the lookahead horizon.
    ///
    /// Entry is the close at `anchor`; the scan covers the bars strictly
    /// after it, up to `anchor + lookahead_days` exclusive. A single touch
    /// of ±take_profit_threshold decides the side.
    fn profitable(&self, anchor: usize, side: Side) -> bool {
        if anchor >= self.bars.len() {
            return false;
        }

        let entry = self.bars[anchor].close;
        let end = (anchor + self.config.lookahead_days).min(self.bars.len());

        for i in anchor + 1..end {
            let ret = (self.bars[i].close - entry) / entry;
            match side {
                Side::Buy if ret >= self.config.take_profit_threshold => return true,
                Side::Sell if ret <= -self.config.take_profit_threshold => return true,
                _ => {}
            }
        }
        false
    }

    fn derive_symbols(&self) -> Vec<i32> {
        self.bars
            .windows(2)
            .map(|pair| {
                self.quantizer
                    .transform(Quantizer::log_return(pair[0].close, pair[1].close))
            })
            .collect()
    }

    /// Install the node-creation sink on the tree. Set it before `train`
    /// to see every node.
    pub fn set_observer<O: NodeObserver + 'static>(&mut self, observer: O) {
        self.tree.set_observer(observer);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn quantizer(&self) -> &Quantizer {
        &self.quantizer
    }

    pub fn tree(&self) -> &PrefixDecisionTree {
        &self.tree
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Symbol record derived from consecutive closes; one entry fewer than
    /// bars once populated by `train` or streaming.
    pub fn symbols(&self) -> &[i32] {
        &self.symbols
    }
}
