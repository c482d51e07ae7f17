//! Interruptible polling waits
//!
//! Every wait outside the timed measurement samples the button on each
//! iteration. A hold past the hold-start threshold ends the wait at once
//! with [`WaitOutcome::HoldAbort`], which is how the operator escapes a
//! stuck sync or a long unlimited session.

use super::edge::{EdgeWait, Poll};
use crate::hal::{Clock, InputControl, LightSensor};

/// Result of waiting for a crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Reached,
    TimedOut,
    HoldAbort,
}

/// Result of a timed pause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    Elapsed,
    HoldAbort,
}

/// Borrowed view of the collaborators a wait polls
pub struct Probe<'a> {
    pub clock: &'a dyn Clock,
    pub sensor: &'a mut dyn LightSensor,
    pub button: &'a mut dyn InputControl,
    /// Hold duration that aborts a wait
    pub hold_start_ms: u64,
}

impl<'a> Probe<'a> {
    pub fn new(
        clock: &'a dyn Clock,
        sensor: &'a mut dyn LightSensor,
        button: &'a mut dyn InputControl,
        hold_start_ms: u64,
    ) -> Self {
        Self {
            clock,
            sensor,
            button,
            hold_start_ms,
        }
    }

    /// Sample the light sensor
    pub fn read(&mut self) -> u16 {
        self.sensor.read()
    }

    /// Sample the button and report a hold past the abort threshold
    pub fn hold_detected(&mut self) -> bool {
        self.button.update(self.clock.now_ms());
        self.button.is_pressed() && self.button.current_hold_ms() >= self.hold_start_ms
    }

    /// Pause for `us` microseconds unless a hold interrupts
    pub fn pause_us(&mut self, us: u64) -> Pause {
        let start = self.clock.now_us();
        loop {
            if self.hold_detected() {
                return Pause::HoldAbort;
            }
            if self.clock.now_us().saturating_sub(start) >= us {
                return Pause::Elapsed;
            }
        }
    }

    pub fn pause_ms(&mut self, ms: u64) -> Pause {
        self.pause_us(ms.saturating_mul(1000))
    }

    /// Poll until the crossing, the budget, or a hold
    pub fn wait_for(&mut self, wait: &EdgeWait) -> WaitOutcome {
        let start = self.clock.now_us();
        loop {
            if self.hold_detected() {
                return WaitOutcome::HoldAbort;
            }
            let elapsed = self.clock.now_us().saturating_sub(start);
            match wait.step(elapsed, self.sensor.read()) {
                Poll::Pending => {}
                Poll::Crossed => return WaitOutcome::Reached,
                Poll::TimedOut => return WaitOutcome::TimedOut,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, LightThresholds};
    use crate::hal::click::ClickKind;
    use crate::measure::edge::Edge;
    use crate::sim::{ScreenModel, SimHandle};

    #[test]
    fn test_pause_elapses() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        let mut rig = sim.rig(&Config::default());
        let (mut probe, _) = rig.split(ClickKind::Wired, 250);

        let before = sim.now_us();
        assert_eq!(probe.pause_ms(100), Pause::Elapsed);
        let spent = sim.now_us() - before;
        assert!(
            (100_000..101_000).contains(&spent),
            "Pause took {}us",
            spent
        );
    }

    #[test]
    fn test_pause_aborts_on_hold() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        sim.press(10, 5_000);
        let mut rig = sim.rig(&Config::default());
        let (mut probe, _) = rig.split(ClickKind::Wired, 250);

        assert_eq!(probe.pause_ms(2_000), Pause::HoldAbort);
        let now_ms = sim.now_us() / 1000;
        assert!(
            (260..300).contains(&now_ms),
            "Abort should land just after 250ms of hold, got {}ms",
            now_ms
        );
    }

    #[test]
    fn test_short_tap_does_not_abort() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        sim.press(10, 100);
        let mut rig = sim.rig(&Config::default());
        let (mut probe, _) = rig.split(ClickKind::Wired, 250);

        assert_eq!(probe.pause_ms(500), Pause::Elapsed);
    }

    #[test]
    fn test_wait_for_times_out_at_budget() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        let mut rig = sim.rig(&Config::default());
        let (mut probe, _) = rig.split(ClickKind::Wired, 250);

        let wait = EdgeWait::new(Edge::Rising, &LightThresholds::default(), 50_000);
        let before = sim.now_us();
        assert_eq!(probe.wait_for(&wait), WaitOutcome::TimedOut);
        assert!(sim.now_us() - before >= 50_000);
    }

    #[test]
    fn test_wait_for_reaches_current_level() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        let mut rig = sim.rig(&Config::default());
        let (mut probe, _) = rig.split(ClickKind::Wired, 250);

        let wait = EdgeWait::new(Edge::Falling, &LightThresholds::default(), 50_000);
        assert_eq!(probe.wait_for(&wait), WaitOutcome::Reached);
    }
}
