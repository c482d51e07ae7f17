//! Mode controllers
//!
//! A session repeats measurement cycles until its run limit or an operator
//! hold. Each call to [`Cycle::run`] is one cycle:
//!
//! 1. Stop if the run limit is reached
//! 2. Flush due sample logs during unlimited sessions
//! 3. Aperture modes only: sync and warm-up on the first cycle, otherwise
//!    resync to the opposite level before measuring
//! 4. Measure, and record on success
//! 5. Jittered, interruptible inter-run delay

pub mod aperture;
pub mod automatic;

use crate::config::Config;
use crate::hal::click::ClickKind;
use crate::measure::edge::Edge;
use crate::measure::jitter::Jitter;
use crate::measure::sync::SyncFailure;
use crate::measure::wait::Pause;
use crate::rig::Bench;
use crate::stats::persist::flush_stream;
use crate::stats::store::StatsStore;
use crate::stats::stream::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Wired click, dark-to-light only
    Automatic,
    /// Wired click, both edges
    AutoAperture,
    /// USB HID click, both edges
    DirectAperture,
}

impl Mode {
    /// Menu order
    pub const ALL: [Mode; 3] = [Mode::Automatic, Mode::AutoAperture, Mode::DirectAperture];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Automatic => "Automatic",
            Mode::AutoAperture => "Auto Aperture",
            Mode::DirectAperture => "Direct Aperture",
        }
    }

    /// Actuator used for the whole session
    pub fn click_kind(self) -> ClickKind {
        match self {
            Mode::Automatic | Mode::AutoAperture => ClickKind::Wired,
            Mode::DirectAperture => ClickKind::Hid,
        }
    }

    pub fn is_aperture(self) -> bool {
        !matches!(self, Mode::Automatic)
    }

    /// Streams this mode records into
    pub fn streams(self) -> &'static [Stream] {
        match self {
            Mode::Automatic => &[Stream::Auto],
            Mode::AutoAperture => &[Stream::AutoApertureRise, Stream::AutoApertureFall],
            Mode::DirectAperture => &[Stream::DirectApertureRise, Stream::DirectApertureFall],
        }
    }

    /// Stream for a measured edge
    pub fn stream_for(self, edge: Edge) -> Stream {
        match (self, edge) {
            (Mode::Automatic, _) => Stream::Auto,
            (Mode::AutoAperture, Edge::Rising) => Stream::AutoApertureRise,
            (Mode::AutoAperture, Edge::Falling) => Stream::AutoApertureFall,
            (Mode::DirectAperture, Edge::Rising) => Stream::DirectApertureRise,
            (Mode::DirectAperture, Edge::Falling) => Stream::DirectApertureFall,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// State of the active measurement session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSession {
    pub mode: Mode,
    /// 0 means unlimited
    pub max_runs: u32,
    /// Aperture modes sync instead of measuring on the first cycle
    pub is_first_run: bool,
    /// Aperture sub-phase: next measured edge is dark-to-light
    pub waiting_for_rising_edge: bool,
}

impl RunSession {
    pub fn new(mode: Mode, max_runs: u32) -> Self {
        Self {
            mode,
            max_runs,
            is_first_run: true,
            waiting_for_rising_edge: true,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_runs == 0
    }

    /// Completed runs; an aperture run is one rising plus one falling sample
    pub fn completed_runs(&self, stats: &StatsStore) -> u32 {
        self.mode
            .streams()
            .iter()
            .map(|&s| stats.stats(s).run_count)
            .min()
            .unwrap_or(0)
    }

    pub fn limit_reached(&self, stats: &StatsStore) -> bool {
        !self.is_unlimited() && self.completed_runs(stats) >= self.max_runs
    }

    /// Edge the next measurement times
    pub fn next_edge(&self) -> Edge {
        if self.waiting_for_rising_edge {
            Edge::Rising
        } else {
            Edge::Falling
        }
    }
}

/// Why a cycle produced no sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Measured crossing not seen within budget
    MeasureTimeout,
    /// Screen never returned to the opposite level
    ResyncTimeout,
    /// Automatic mode: screen still lit from the previous flash
    StillLight,
}

/// Result of one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    Recorded { stream: Stream, latency_ms: f64 },
    Skipped(SkipReason),
    /// First aperture cycle finished sync and warm-up
    Synced,
    SyncFailed(SyncFailure),
    LimitReached,
    HoldAbort,
}

/// Borrowed state for one cycle
pub struct Cycle<'a> {
    pub bench: Bench<'a>,
    pub stats: &'a mut StatsStore,
    pub session: &'a mut RunSession,
    pub jitter: &'a mut Jitter,
    pub config: &'a Config,
}

impl Cycle<'_> {
    /// Run one cycle of the session's mode
    pub fn run(&mut self) -> CycleOutcome {
        if self.session.limit_reached(self.stats) {
            return CycleOutcome::LimitReached;
        }
        if self.session.is_unlimited() {
            self.flush_due();
        }
        match self.session.mode {
            Mode::Automatic => automatic::run_cycle(self),
            Mode::AutoAperture | Mode::DirectAperture => aperture::run_cycle(self),
        }
    }

    fn record(&mut self, stream: Stream, latency_ms: f64) -> CycleOutcome {
        self.stats.record(stream, latency_ms);
        CycleOutcome::Recorded { stream, latency_ms }
    }

    /// Flush streams whose log reached the periodic flush size
    fn flush_due(&mut self) {
        let every = self.config.session.flush_every_runs as usize;
        if every == 0 {
            return;
        }
        let Some(sink) = self.bench.sink.as_deref_mut() else {
            return;
        };
        for &stream in self.session.mode.streams() {
            if self.stats.log(stream).len() >= every {
                if let Err(e) = flush_stream(self.stats, stream, sink) {
                    tracing::warn!(stream = %stream, error = %e, "periodic_flush_failed");
                }
            }
        }
    }

    /// Jittered delay before the next cycle
    fn inter_run_delay(&mut self) -> Pause {
        let timing = &self.config.timing;
        let delay_ms = self.jitter.delay_ms(timing.inter_run_delay_ms, timing.jitter_ms);
        self.bench.probe.pause_ms(delay_ms)
    }

    /// Delay, then report `outcome` unless the delay was interrupted
    fn finish(&mut self, outcome: CycleOutcome) -> CycleOutcome {
        match self.inter_run_delay() {
            Pause::Elapsed => outcome,
            Pause::HoldAbort => CycleOutcome::HoldAbort,
        }
    }
}
