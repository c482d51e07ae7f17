//! Photontester - Click-to-photon display latency instrument
//!
//! This library re-exports the measurement engine, state machine, and
//! simulated rig from `photontester-core`, and adds the host-side pieces used
//! by the `photontester` binary: argument parsing ([`cli`]) and a console
//! [`Display`](photontester_core::hal::Display) ([`ui`]).

pub mod cli;
pub mod ui;

pub use photontester_core::{config, hal, machine, measure, modes, rig, sim, stats};

pub use photontester_core::{
    Config, Controller, CsvLogSink, LatencyStats, Mode, State, StatsStore, StatusView, Stream,
};
pub use photontester_core::{BUILD_DATE, VERSION};
