//! Technical indicator implementations.
//!
//! Indicators are pure functions over a price series. Warm-up entries are
//! `None`; strategies treat `None` as "no signal".

pub mod rsi;

pub use rsi::compute_rsi;
