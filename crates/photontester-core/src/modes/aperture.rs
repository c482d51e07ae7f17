//! Aperture modes
//!
//! Both edges of a toggling target are timed, alternating rising and
//! falling. The first cycle of a session syncs to a dark baseline and warms
//! up instead of measuring. Later cycles first confirm the screen sits at
//! the level opposite the edge about to be measured, so a missed transition
//! costs one skipped cycle rather than a corrupted sample.
//!
//! The phase only flips after a recorded sample. A timeout leaves it
//! unchanged and the next cycle retries the same edge.

use super::{Cycle, CycleOutcome, SkipReason};
use crate::measure::edge::EdgeWait;
use crate::measure::latency::{measure, us_to_ms};
use crate::measure::sync::{smart_sync, warm_up, SyncOutcome};
use crate::measure::wait::WaitOutcome;

pub(super) fn run_cycle(cycle: &mut Cycle<'_>) -> CycleOutcome {
    if cycle.session.is_first_run {
        return sync_cycle(cycle);
    }

    let config = cycle.config;
    let edge = cycle.session.next_edge();

    let resync = EdgeWait::new(edge.opposite(), &config.light, config.timing.resync_timeout_us);
    match cycle.bench.probe.wait_for(&resync) {
        WaitOutcome::Reached => {}
        WaitOutcome::TimedOut => {
            tracing::debug!(edge = ?edge, "aperture_resync_timeout");
            return cycle.finish(CycleOutcome::Skipped(SkipReason::ResyncTimeout));
        }
        WaitOutcome::HoldAbort => return CycleOutcome::HoldAbort,
    }

    let wait = EdgeWait::new(edge, &config.light, config.timing.aperture_timeout_us);
    let probe = &mut cycle.bench.probe;
    let outcome = match measure(probe.clock, &mut *probe.sensor, &mut *cycle.bench.click, &wait) {
        Ok(us) => {
            let stream = cycle.session.mode.stream_for(edge);
            tracing::debug!(stream = %stream, latency_us = us, "aperture_measured");
            cycle.session.waiting_for_rising_edge = !cycle.session.waiting_for_rising_edge;
            cycle.record(stream, us_to_ms(us))
        }
        Err(e) => {
            tracing::debug!(edge = ?edge, error = %e, "aperture_timeout");
            CycleOutcome::Skipped(SkipReason::MeasureTimeout)
        }
    };

    cycle.finish(outcome)
}

/// Sync and warm-up; the session measures from the next cycle on success
fn sync_cycle(cycle: &mut Cycle<'_>) -> CycleOutcome {
    let config = cycle.config;
    let bench = &mut cycle.bench;

    let mut result = smart_sync(&mut bench.probe, &mut *bench.click, config);
    if result == SyncOutcome::Success {
        result = warm_up(&mut bench.probe, &mut *bench.click, config);
    }

    match result {
        SyncOutcome::Success => {
            tracing::info!(mode = %cycle.session.mode, "aperture_synced");
            cycle.session.is_first_run = false;
            cycle.session.waiting_for_rising_edge = true;
            cycle.finish(CycleOutcome::Synced)
        }
        SyncOutcome::Failed(failure) => {
            tracing::warn!(mode = %cycle.session.mode, error = %failure, "aperture_sync_failed");
            cycle.finish(CycleOutcome::SyncFailed(failure))
        }
        SyncOutcome::HoldAbort => CycleOutcome::HoldAbort,
    }
}
