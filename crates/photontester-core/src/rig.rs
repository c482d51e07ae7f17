//! Owned hardware collaborators
//!
//! The controller owns one [`Rig`]. Measurement code borrows disjoint parts
//! of it through [`Rig::bench`], which also picks the session's actuator.

use crate::hal::click::{ClickActuator, ClickKind, GpioClick, HidClick};
use crate::hal::{CapabilityProbe, Clock, Display, InputControl, LightSensor, Restart, StatusLed};
use crate::measure::wait::Probe;
use crate::stats::persist::LogSink;

/// Everything the instrument talks to
pub struct Rig {
    pub clock: Box<dyn Clock>,
    pub sensor: Box<dyn LightSensor>,
    pub button: Box<dyn InputControl>,
    pub wired: GpioClick,
    pub hid: HidClick,
    pub probe: Box<dyn CapabilityProbe>,
    pub led: Box<dyn StatusLed>,
    pub display: Box<dyn Display>,
    pub restart: Box<dyn Restart>,
    /// Present when persistent logging is available
    pub sink: Option<Box<dyn LogSink>>,
}

/// Borrowed working set for one measurement cycle
pub struct Bench<'a> {
    pub probe: Probe<'a>,
    pub click: &'a mut dyn ClickActuator,
    pub sink: Option<&'a mut (dyn LogSink + 'static)>,
}

impl Rig {
    /// Borrow the polling collaborators, the actuator for `kind`, and the sink
    pub fn bench(&mut self, kind: ClickKind, hold_start_ms: u64) -> Bench<'_> {
        let click: &mut dyn ClickActuator = match kind {
            ClickKind::Wired => &mut self.wired,
            ClickKind::Hid => &mut self.hid,
        };
        Bench {
            probe: Probe::new(
                self.clock.as_ref(),
                self.sensor.as_mut(),
                self.button.as_mut(),
                hold_start_ms,
            ),
            click,
            sink: self.sink.as_deref_mut(),
        }
    }

    /// Probe and actuator only
    pub fn split(
        &mut self,
        kind: ClickKind,
        hold_start_ms: u64,
    ) -> (Probe<'_>, &mut dyn ClickActuator) {
        let bench = self.bench(kind, hold_start_ms);
        (bench.probe, bench.click)
    }

    /// Sample the button at the current time
    pub fn poll_button(&mut self) {
        let now_ms = self.clock.now_ms();
        self.button.update(now_ms);
    }

    pub fn logging(&self) -> bool {
        self.sink.is_some()
    }
}
