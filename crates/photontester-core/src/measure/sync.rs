//! Baseline sync and warm-up
//!
//! Aperture sessions time both edges, so they must start from a known dark
//! screen. Smart sync:
//!
//! 1. Focus click, then settle
//! 2. Classify the screen: light, dark, or in between
//! 3. Dark: done. Light: one toggle click. In between: fail and retry later
//! 4. After a toggle, verify the screen reaches dark within the budget
//!
//! Warm-up then runs one unmeasured rising and one unmeasured falling
//! transition, since the first real transition after sync can be off.
//!
//! Every wait can be interrupted by a hold, reported as
//! [`SyncOutcome::HoldAbort`] and never folded into a failure.

use super::edge::{classify, Edge, EdgeWait, Level};
use super::wait::{Pause, Probe, WaitOutcome};
use crate::config::Config;
use crate::hal::click::ClickActuator;
use thiserror::Error;

/// Retryable sync failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncFailure {
    #[error("Screen level {level} is between thresholds")]
    Indeterminate { level: u16 },

    #[error("Screen did not reach dark after the toggle click")]
    VerifyTimeout,

    #[error("Warm-up {edge:?} transition timed out")]
    WarmUpTimeout { edge: Edge },
}

/// Three-way sync result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Success,
    /// Retry on the next cycle
    Failed(SyncFailure),
    /// Operator hold; hand control back to the state machine
    HoldAbort,
}

/// Drive the screen to a verified dark baseline
pub fn smart_sync(
    probe: &mut Probe<'_>,
    click: &mut dyn ClickActuator,
    config: &Config,
) -> SyncOutcome {
    let thresholds = &config.light;

    click.click(probe.clock);
    let settle_us = click.settle_delay_us() + config.timing.focus_settle_ms * 1000;
    if probe.pause_us(settle_us) == Pause::HoldAbort {
        return SyncOutcome::HoldAbort;
    }

    let level = probe.read();
    match classify(level, thresholds) {
        Level::Dark => {
            tracing::debug!(level, "sync_already_dark");
            SyncOutcome::Success
        }
        Level::Indeterminate => {
            tracing::debug!(level, "sync_indeterminate");
            SyncOutcome::Failed(SyncFailure::Indeterminate { level })
        }
        Level::Light => {
            tracing::debug!(level, "sync_toggle");
            click.click(probe.clock);
            if probe.pause_us(click.settle_delay_us()) == Pause::HoldAbort {
                return SyncOutcome::HoldAbort;
            }
            let verify = EdgeWait::new(
                Edge::Falling,
                thresholds,
                config.timing.verify_timeout_ms * 1000,
            );
            match probe.wait_for(&verify) {
                WaitOutcome::Reached => SyncOutcome::Success,
                WaitOutcome::TimedOut => SyncOutcome::Failed(SyncFailure::VerifyTimeout),
                WaitOutcome::HoldAbort => SyncOutcome::HoldAbort,
            }
        }
    }
}

/// One unmeasured rising and one unmeasured falling transition
pub fn warm_up(
    probe: &mut Probe<'_>,
    click: &mut dyn ClickActuator,
    config: &Config,
) -> SyncOutcome {
    for edge in [Edge::Rising, Edge::Falling] {
        click.click(probe.clock);
        if probe.pause_us(click.settle_delay_us()) == Pause::HoldAbort {
            return SyncOutcome::HoldAbort;
        }
        let wait = EdgeWait::new(edge, &config.light, config.timing.aperture_timeout_us);
        match probe.wait_for(&wait) {
            WaitOutcome::Reached => {}
            WaitOutcome::TimedOut => {
                return SyncOutcome::Failed(SyncFailure::WarmUpTimeout { edge })
            }
            WaitOutcome::HoldAbort => return SyncOutcome::HoldAbort,
        }
    }
    SyncOutcome::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::click::ClickKind;
    use crate::sim::{ScreenModel, SimHandle};

    fn toggle() -> ScreenModel {
        ScreenModel::Toggle {
            rise_latency_us: 15_000,
            fall_latency_us: 20_000,
        }
    }

    #[test]
    fn test_dark_screen_needs_no_toggle() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        let config = Config::default();
        let mut rig = sim.rig(&config);
        let (mut probe, click) = rig.split(ClickKind::Wired, config.hold.start_ms);

        assert_eq!(smart_sync(&mut probe, click, &config), SyncOutcome::Success);
        assert_eq!(sim.clicks(), 1, "Only the focus click should be sent");
    }

    #[test]
    fn test_light_screen_gets_one_toggle() {
        let sim = SimHandle::new(toggle());
        sim.with(|w| {
            w.lit = true;
            w.target_lit = true;
            w.focused = false;
        });
        let config = Config::default();
        let mut rig = sim.rig(&config);
        let (mut probe, click) = rig.split(ClickKind::Wired, config.hold.start_ms);

        assert_eq!(smart_sync(&mut probe, click, &config), SyncOutcome::Success);
        assert_eq!(sim.clicks(), 2, "Focus click plus exactly one toggle");
        assert!(!sim.with(|w| w.lit));
    }

    #[test]
    fn test_light_screen_that_stays_light_fails() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        sim.with(|w| {
            w.lit = true;
            w.target_lit = true;
        });
        let config = Config::default();
        let mut rig = sim.rig(&config);
        let (mut probe, click) = rig.split(ClickKind::Wired, config.hold.start_ms);

        let before = sim.now_us();
        assert_eq!(
            smart_sync(&mut probe, click, &config),
            SyncOutcome::Failed(SyncFailure::VerifyTimeout)
        );
        assert_eq!(sim.clicks(), 2);
        assert!(sim.now_us() - before >= config.timing.verify_timeout_ms * 1000);
    }

    #[test]
    fn test_indeterminate_level_fails() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        sim.with(|w| w.fixed_level = Some(80));
        let config = Config::default();
        let mut rig = sim.rig(&config);
        let (mut probe, click) = rig.split(ClickKind::Wired, config.hold.start_ms);

        assert_eq!(
            smart_sync(&mut probe, click, &config),
            SyncOutcome::Failed(SyncFailure::Indeterminate { level: 80 })
        );
        assert_eq!(sim.clicks(), 1);
    }

    #[test]
    fn test_hold_during_settle_aborts_without_toggle() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        sim.with(|w| {
            w.lit = true;
            w.target_lit = true;
        });
        sim.press(5, 2_000);
        let config = Config::default();
        let mut rig = sim.rig(&config);
        let (mut probe, click) = rig.split(ClickKind::Wired, config.hold.start_ms);

        assert_eq!(smart_sync(&mut probe, click, &config), SyncOutcome::HoldAbort);
        assert_eq!(sim.clicks(), 1, "No stimulus after the abort");
    }

    #[test]
    fn test_hold_during_verify_aborts() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        sim.with(|w| {
            w.lit = true;
            w.target_lit = true;
        });
        // Focus settle ends at 300ms; hold crosses 250ms at ~1250ms
        sim.press(1_000, 2_000);
        let config = Config::default();
        let mut rig = sim.rig(&config);
        let (mut probe, click) = rig.split(ClickKind::Wired, config.hold.start_ms);

        assert_eq!(smart_sync(&mut probe, click, &config), SyncOutcome::HoldAbort);
        assert_eq!(sim.clicks(), 2);
        assert!(sim.now_us() < 1_300_000);
    }

    #[test]
    fn test_warm_up_runs_both_edges() {
        let sim = SimHandle::new(toggle());
        let config = Config::default();
        let mut rig = sim.rig(&config);
        let (mut probe, click) = rig.split(ClickKind::Wired, config.hold.start_ms);

        assert_eq!(warm_up(&mut probe, click, &config), SyncOutcome::Success);
        assert_eq!(sim.clicks(), 2);
        assert!(!sim.with(|w| w.lit), "Warm-up ends dark");
    }

    #[test]
    fn test_warm_up_timeout_reports_edge() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        let config = Config::default();
        let mut rig = sim.rig(&config);
        let (mut probe, click) = rig.split(ClickKind::Wired, config.hold.start_ms);

        assert_eq!(
            warm_up(&mut probe, click, &config),
            SyncOutcome::Failed(SyncFailure::WarmUpTimeout { edge: Edge::Rising })
        );
    }

    #[test]
    fn test_hid_sync_waits_for_settle() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        let mut config = Config::default();
        config.timing.focus_settle_ms = 0;
        config.timing.hid_settle_us = 5_000;
        let mut rig = sim.rig(&config);
        let (mut probe, click) = rig.split(ClickKind::Hid, config.hold.start_ms);

        assert_eq!(smart_sync(&mut probe, click, &config), SyncOutcome::Success);
        assert!(sim.now_us() >= 5_000);
        assert_eq!(sim.with(|w| w.hid_clicks), 1);
    }
}
