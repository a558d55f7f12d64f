//! Core of the Sequential Trading Decision System: log-return quantization,
//! a prefix tree of symbol sequences with per-node outcome statistics, and
//! the engine that drives training and streaming inference over OHLCV bars.

pub mod bar;
pub mod config;
pub mod decision;
pub mod engine;
pub mod quantizer;
pub mod snapshot;
pub mod tree;
