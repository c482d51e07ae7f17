//! Timed click-to-crossing measurement
//!
//! The innermost loop of the instrument. The timer starts, the stimulus is
//! asserted, and the sensor is polled until the requested crossing or the
//! budget. Nothing else runs inside the loop: no button check, no logging,
//! no display.

use super::edge::{EdgeWait, Poll};
use crate::hal::click::ClickActuator;
use crate::hal::{Clock, LightSensor};
use thiserror::Error;

/// Measurement errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureError {
    #[error("No threshold crossing within {elapsed_us}us")]
    Timeout { elapsed_us: u64 },
}

/// Measure stimulus-to-crossing time in microseconds
///
/// The stimulus is released after the loop on both outcomes, so a failed
/// measurement never leaves a wired click asserted.
///
/// # Arguments
/// * `clock` - Time base
/// * `sensor` - Photosensor
/// * `click` - Session actuator
/// * `wait` - Edge, thresholds, and budget
///
/// # Returns
/// Elapsed microseconds at the first sample past the threshold
pub fn measure(
    clock: &dyn Clock,
    sensor: &mut dyn LightSensor,
    click: &mut dyn ClickActuator,
    wait: &EdgeWait,
) -> Result<u64, MeasureError> {
    let start = clock.now_us();
    click.assert_stimulus();

    let outcome = loop {
        let elapsed = clock.now_us().saturating_sub(start);
        match wait.step(elapsed, sensor.read()) {
            Poll::Pending => {}
            Poll::Crossed => break Ok(elapsed),
            Poll::TimedOut => break Err(MeasureError::Timeout { elapsed_us: elapsed }),
        }
    };

    click.release();
    outcome
}

/// Microseconds to milliseconds
pub fn us_to_ms(us: u64) -> f64 {
    us as f64 / 1000.0
}
