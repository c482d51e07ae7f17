//! Display snapshot
//!
//! The controller describes what to show; layout, fonts, and refresh cadence
//! belong to the [`Display`](crate::hal::Display) implementor.

use super::startup::StartupReport;
use super::state::HoldOrigin;
use super::transitions::HoldLevel;
use crate::modes::Mode;
use crate::stats::store::LatencyStats;
use crate::stats::stream::Stream;

/// Statistics of one stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamSummary {
    pub stream: Stream,
    pub stats: LatencyStats,
}

/// Per-state content
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Setup {
        /// None while sampling
        report: Option<StartupReport>,
    },
    Menu {
        title: &'static str,
        options: Vec<String>,
        cursor: usize,
    },
    Measuring {
        mode: Mode,
        streams: Vec<StreamSummary>,
        completed_runs: u32,
        /// 0 means unlimited
        max_runs: u32,
        /// Aperture sync still pending
        syncing: bool,
        level: u16,
    },
    RunsComplete {
        mode: Mode,
        streams: Vec<StreamSummary>,
    },
    Hold {
        from: HoldOrigin,
        held_ms: u64,
        /// What releasing now would do
        pending: HoldLevel,
    },
    DebugMouse {
        level: u16,
        detected: bool,
        startup_failed: bool,
    },
    DebugSensor {
        level: u16,
        last_range: Option<u16>,
        stable: bool,
    },
    PollingTest {
        reports: u64,
    },
    Error {
        message: String,
    },
}

/// Everything the display shows
#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    pub page: Page,
    /// Vetoed transition or other one-line message
    pub notice: Option<String>,
}
