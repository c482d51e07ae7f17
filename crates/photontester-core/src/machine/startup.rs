//! Startup stability sampling
//!
//! Both the light sensor and the mouse-presence line are sampled for a
//! fixed window. A signal is stable when its max-min spread stays below the
//! fluctuation limit; the mouse line must also stay at or above the presence
//! level.

use crate::config::Stability;
use crate::rig::Rig;

/// Spacing between samples
const SAMPLE_INTERVAL_US: u64 = 1000;

/// Min/max over the sampling window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub min: u16,
    pub max: u16,
    pub passed: bool,
}

impl CheckResult {
    pub fn range(&self) -> u16 {
        self.max.saturating_sub(self.min)
    }
}

/// Startup check results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupReport {
    pub sensor: CheckResult,
    pub mouse: CheckResult,
}

impl StartupReport {
    pub fn passed(&self) -> bool {
        self.sensor.passed && self.mouse.passed
    }
}

/// Running min/max
#[derive(Debug, Clone, Copy)]
struct Spread {
    min: u16,
    max: u16,
}

impl Spread {
    fn new() -> Self {
        Self {
            min: u16::MAX,
            max: 0,
        }
    }

    fn add(&mut self, value: u16) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn range(&self) -> u16 {
        self.max.saturating_sub(self.min)
    }
}

/// Sample both signals for `stability.window_ms`
pub fn sample(rig: &mut Rig, stability: &Stability) -> StartupReport {
    let mut sensor = Spread::new();
    let mut mouse = Spread::new();

    let start = rig.clock.now_us();
    let window_us = stability.window_ms * 1000;
    loop {
        sensor.add(rig.sensor.read());
        mouse.add(rig.probe.mouse_presence_level());
        if rig.clock.now_us().saturating_sub(start) >= window_us {
            break;
        }
        rig.clock.delay_us(SAMPLE_INTERVAL_US);
    }

    let report = StartupReport {
        sensor: CheckResult {
            min: sensor.min,
            max: sensor.max,
            passed: sensor.range() < stability.sensor_fluctuation_max,
        },
        mouse: CheckResult {
            min: mouse.min,
            max: mouse.max,
            passed: mouse.range() < stability.mouse_fluctuation_max
                && mouse.min >= stability.mouse_presence_min,
        },
    };

    tracing::info!(
        sensor_min = report.sensor.min,
        sensor_max = report.sensor.max,
        sensor_ok = report.sensor.passed,
        mouse_min = report.mouse.min,
        mouse_max = report.mouse.max,
        mouse_ok = report.mouse.passed,
        "startup_checks"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sim::{ScreenModel, SimHandle};

    #[test]
    fn test_quiet_signals_pass() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        let config = Config::default();
        let mut rig = sim.rig(&config);

        let report = sample(&mut rig, &config.stability);

        assert!(report.passed());
        assert_eq!(report.sensor.range(), 0);
        assert!(sim.now_us() >= config.stability.window_ms * 1000);
    }

    #[test]
    fn test_noisy_sensor_fails() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        sim.with(|w| w.sensor_wobble = 25);
        let config = Config::default();
        let mut rig = sim.rig(&config);

        let report = sample(&mut rig, &config.stability);

        assert!(!report.sensor.passed);
        assert_eq!(report.sensor.range(), 25);
        assert!(report.mouse.passed);
    }

    #[test]
    fn test_weak_mouse_line_fails() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        sim.with(|w| w.mouse_level = 100);
        let config = Config::default();
        let mut rig = sim.rig(&config);

        let report = sample(&mut rig, &config.stability);

        assert!(report.sensor.passed);
        assert!(!report.mouse.passed, "Stable but below presence level");
    }

    #[test]
    fn test_fluctuation_limit_is_exclusive() {
        let sim = SimHandle::new(ScreenModel::Frozen);
        sim.with(|w| w.sensor_wobble = 20);
        let config = Config::default();
        let mut rig = sim.rig(&config);

        assert!(!sample(&mut rig, &config.stability).sensor.passed);
    }
}
