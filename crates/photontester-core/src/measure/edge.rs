//! Threshold crossing as a pure step
//!
//! [`EdgeWait::step`] maps one `(elapsed, sample)` observation to continue,
//! crossed, or timed out. Polling loops only supply observations.

use crate::config::LightThresholds;

/// Direction of the transition being waited for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Dark to light: sample reaches the high threshold
    Rising,
    /// Light to dark: sample falls to the low threshold
    Falling,
}

impl Edge {
    pub fn opposite(self) -> Self {
        match self {
            Edge::Rising => Edge::Falling,
            Edge::Falling => Edge::Rising,
        }
    }
}

/// Outcome of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Pending,
    Crossed,
    TimedOut,
}

/// Screen state classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Light,
    Dark,
    /// Between thresholds
    Indeterminate,
}

/// Classify a raw sample against the thresholds
pub fn classify(sample: u16, thresholds: &LightThresholds) -> Level {
    if sample >= thresholds.high {
        Level::Light
    } else if sample <= thresholds.low {
        Level::Dark
    } else {
        Level::Indeterminate
    }
}

/// Wait for a crossing within a budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeWait {
    pub edge: Edge,
    pub high: u16,
    pub low: u16,
    pub timeout_us: u64,
}

impl EdgeWait {
    pub fn new(edge: Edge, thresholds: &LightThresholds, timeout_us: u64) -> Self {
        Self {
            edge,
            high: thresholds.high,
            low: thresholds.low,
            timeout_us,
        }
    }

    /// Whether a sample is past the threshold for this edge
    #[inline]
    pub fn crossed(&self, sample: u16) -> bool {
        match self.edge {
            Edge::Rising => sample >= self.high,
            Edge::Falling => sample <= self.low,
        }
    }

    /// Evaluate one observation. A crossing wins over a simultaneous timeout.
    #[inline]
    pub fn step(&self, elapsed_us: u64, sample: u16) -> Poll {
        if self.crossed(sample) {
            Poll::Crossed
        } else if elapsed_us >= self.timeout_us {
            Poll::TimedOut
        } else {
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> LightThresholds {
        LightThresholds { high: 120, low: 40 }
    }

    #[test]
    fn test_rising_step() {
        let wait = EdgeWait::new(Edge::Rising, &thresholds(), 1000);
        assert_eq!(wait.step(0, 10), Poll::Pending);
        assert_eq!(wait.step(500, 119), Poll::Pending);
        assert_eq!(wait.step(500, 120), Poll::Crossed);
        assert_eq!(wait.step(999, 60), Poll::Pending);
        assert_eq!(wait.step(1000, 60), Poll::TimedOut);
    }

    #[test]
    fn test_falling_step() {
        let wait = EdgeWait::new(Edge::Falling, &thresholds(), 1000);
        assert_eq!(wait.step(0, 200), Poll::Pending);
        assert_eq!(wait.step(10, 41), Poll::Pending);
        assert_eq!(wait.step(10, 40), Poll::Crossed);
        assert_eq!(wait.step(2000, 200), Poll::TimedOut);
    }

    #[test]
    fn test_crossing_beats_timeout() {
        let wait = EdgeWait::new(Edge::Rising, &thresholds(), 1000);
        assert_eq!(wait.step(1000, 255), Poll::Crossed);
    }

    #[test]
    fn test_classify() {
        let t = thresholds();
        assert_eq!(classify(0, &t), Level::Dark);
        assert_eq!(classify(40, &t), Level::Dark);
        assert_eq!(classify(41, &t), Level::Indeterminate);
        assert_eq!(classify(119, &t), Level::Indeterminate);
        assert_eq!(classify(120, &t), Level::Light);
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Edge::Rising.opposite(), Edge::Falling);
        assert_eq!(Edge::Falling.opposite(), Edge::Rising);
    }
}
