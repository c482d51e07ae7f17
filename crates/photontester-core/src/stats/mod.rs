//! Latency statistics and sample logs
//!
//! One accumulator per measurement stream, plus the append-only sample log
//! that feeds persistent storage when a sink is attached.

pub mod persist;
pub mod store;
pub mod stream;
