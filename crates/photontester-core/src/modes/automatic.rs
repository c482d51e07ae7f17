//! Plain automatic mode
//!
//! Wired click, then time the dark-to-light crossing. The screen under test
//! is expected to flash and return to dark before the next cycle.

use super::{Cycle, CycleOutcome, SkipReason};
use crate::measure::edge::{classify, Edge, EdgeWait, Level};
use crate::measure::latency::{measure, us_to_ms};
use crate::stats::stream::Stream;

pub(super) fn run_cycle(cycle: &mut Cycle<'_>) -> CycleOutcome {
    let light = cycle.config.light;

    // A lit screen would register as an instant crossing
    let level = cycle.bench.probe.read();
    if classify(level, &light) == Level::Light {
        tracing::debug!(level, "auto_still_light");
        return cycle.finish(CycleOutcome::Skipped(SkipReason::StillLight));
    }

    let wait = EdgeWait::new(
        Edge::Rising,
        &light,
        cycle.config.timing.measure_timeout_us,
    );
    let probe = &mut cycle.bench.probe;
    let measured = measure(
        probe.clock,
        &mut *probe.sensor,
        &mut *cycle.bench.click,
        &wait,
    );
    let outcome = match measured {
        Ok(us) => {
            let latency_ms = us_to_ms(us);
            tracing::debug!(
                latency_us = us,
                run = cycle.stats.stats(Stream::Auto).run_count + 1,
                "auto_measured"
            );
            cycle.record(Stream::Auto, latency_ms)
        }
        Err(e) => {
            tracing::debug!(error = %e, "auto_timeout");
            CycleOutcome::Skipped(SkipReason::MeasureTimeout)
        }
    };

    cycle.finish(outcome)
}
