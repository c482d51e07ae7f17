//! Debug view helpers

use std::f64::consts::TAU;

/// Polling-test circle radius in counts
pub const CIRCLE_RADIUS: f64 = 100.0;
/// Angle advanced per report
pub const CIRCLE_STEP_RAD: f64 = 0.08;

/// Fault LED phase for a blink interval
pub fn blink_on(now_ms: u64, interval_ms: u64) -> bool {
    interval_ms == 0 || (now_ms / interval_ms) % 2 == 0
}

/// Consecutive fixed-length windows over a signal
///
/// The verdict of the last completed window decides stability, so a single
/// spike keeps the signal unstable for at least one window.
#[derive(Debug, Clone)]
pub struct StabilityWindow {
    window_ms: u64,
    max_range: u16,
    start_ms: Option<u64>,
    min: u16,
    max: u16,
    last_range: Option<u16>,
}

impl StabilityWindow {
    pub fn new(window_ms: u64, max_range: u16) -> Self {
        Self {
            window_ms,
            max_range,
            start_ms: None,
            min: u16::MAX,
            max: 0,
            last_range: None,
        }
    }

    /// Add a sample; returns the range of a window that just completed
    pub fn observe(&mut self, now_ms: u64, level: u16) -> Option<u16> {
        let start = *self.start_ms.get_or_insert(now_ms);
        self.min = self.min.min(level);
        self.max = self.max.max(level);

        if now_ms.saturating_sub(start) < self.window_ms {
            return None;
        }
        let range = self.max.saturating_sub(self.min);
        self.last_range = Some(range);
        self.start_ms = Some(now_ms);
        self.min = level;
        self.max = level;
        Some(range)
    }

    /// Last completed window stayed under the fluctuation limit
    pub fn is_stable(&self) -> bool {
        self.last_range.is_some_and(|r| r < self.max_range)
    }

    pub fn last_range(&self) -> Option<u16> {
        self.last_range
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.window_ms, self.max_range);
    }
}

/// Relative moves tracing a circle, one report per call
#[derive(Debug, Clone)]
pub struct CirclePath {
    angle: f64,
    last: (i32, i32),
}

impl Default for CirclePath {
    fn default() -> Self {
        Self {
            angle: 0.0,
            last: Self::point(0.0),
        }
    }
}

impl CirclePath {
    fn point(angle: f64) -> (i32, i32) {
        (
            (CIRCLE_RADIUS * angle.cos()).round() as i32,
            (CIRCLE_RADIUS * angle.sin()).round() as i32,
        )
    }

    /// Next move; may be (0, 0), which is still sent
    pub fn next_delta(&mut self) -> (i16, i16) {
        self.angle += CIRCLE_STEP_RAD;
        if self.angle >= TAU {
            self.angle -= TAU;
        }
        let point = Self::point(self.angle);
        let delta = (point.0 - self.last.0, point.1 - self.last.1);
        self.last = point;
        (delta.0 as i16, delta.1 as i16)
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }
}
