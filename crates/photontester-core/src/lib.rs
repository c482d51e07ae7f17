//! Photontester Core - Click-to-photon latency engine and run-time state machine
//!
//! This library measures display latency by pairing a click stimulus (a wired
//! mouse switch or a USB HID report) with a photosensor watching the screen.
//! It provides the timed edge measurement, baseline sync, per-stream running
//! statistics, the three measurement modes, and the hold-driven state machine
//! that ties them together. Hardware is reached through the traits in [`hal`];
//! [`sim`] supplies a deterministic rig for tests and the host runner.

pub mod config;
pub mod hal;
pub mod machine;
pub mod measure;
pub mod modes;
pub mod rig;
pub mod sim;
pub mod stats;

pub use config::Config;
pub use machine::{Controller, State, StatusView};
pub use modes::Mode;
pub use rig::Rig;
pub use stats::persist::CsvLogSink;
pub use stats::store::{LatencyStats, StatsStore};
pub use stats::stream::Stream;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (YYYY-MM-DD), set by build.rs
pub const BUILD_DATE: &str = env!("BUILD_DATE");
