//! Bar-series loading for the decision engine.
//!
//! Boundary crate: reads OHLCV CSV exports and produces the in-memory
//! `Vec<Bar>` the engine consumes.

pub mod csv_loader;
