//! Quantile binning of close-to-close log-returns.
//!
//! Edges are fitted once on the historical return distribution; after that
//! the quantizer is read-only and every transform is a deterministic lookup.

use crate::bar::Bar;

/// Maps log-returns onto a discrete alphabet `[0, num_bins)`.
///
/// Bin edges start at zero and are replaced by `fit` with the empirical
/// quantiles of the training returns. Duplicate edges are allowed; a flat
/// return distribution simply collapses several bins onto one value.
#[derive(Debug, Clone)]
pub struct Quantizer {
    num_bins: i32,
    bin_edges: Vec<f64>,
}

impl Quantizer {
    pub fn new(num_bins: i32) -> Self {
        let edge_count = (num_bins as usize).saturating_sub(1);
        Self {
            num_bins,
            bin_edges: vec![0.0; edge_count],
        }
    }

    /// `ln(curr/prev)` for strictly positive, finite closes; `0.0` otherwise.
    pub fn log_return(prev_close: f64, curr_close: f64) -> f64 {
        if !(prev_close.is_finite() && curr_close.is_finite()) {
            return 0.0;
        }
        if prev_close <= 0.0 || curr_close <= 0.0 {
            return 0.0;
        }
        (curr_close / prev_close).ln()
    }

    /// Fit bin edges on the consecutive log-returns of `bars`.
    ///
    /// Edge `i` (1-based) is the sorted return at index `floor(i/K · N)`,
    /// clamped to the last element. Fewer than 2 bars, or no finite returns,
    /// leaves the current edges untouched. Fitting twice on the same data
    /// yields identical edges.
    pub fn fit(&mut self, bars: &[Bar]) {
        if bars.len() < 2 {
            return;
        }

        let mut returns: Vec<f64> = bars
            .windows(2)
            .map(|pair| Self::log_return(pair[0].close, pair[1].close))
            .filter(|r| r.is_finite())
            .collect();

        if returns.is_empty() {
            return;
        }
        returns.sort_by(|a, b| a.total_cmp(b));

        self.bin_edges.clear();
        for i in 1..self.num_bins {
            let quantile = i as f64 / self.num_bins as f64;
            let mut index = (quantile * returns.len() as f64) as usize;
            if index >= returns.len() {
                index = returns.len() - 1;
            }
            self.bin_edges.push(returns[index]);
        }
    }

    /// Bin index of `log_return`: the count of edges with `r >= edge`.
    ///
    /// Non-finite input maps to the middle bin. Result is always in
    /// `[0, num_bins)`.
    pub fn transform(&self, log_return: f64) -> i32 {
        if !log_return.is_finite() {
            return self.num_bins / 2;
        }

        let mut bin = 0;
        for &edge in &self.bin_edges {
            if log_return < edge {
                break;
            }
            bin += 1;
        }
        bin
    }

    pub fn num_bins(&self) -> i32 {
        self.num_bins
    }

    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }
}
