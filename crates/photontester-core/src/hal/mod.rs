//! Hardware seams
//!
//! The engine never touches registers directly. Every collaborator is a
//! narrow trait consumed through `dyn`, so the same controller drives real
//! adapters on the instrument and the simulated rig in [`crate::sim`].
//!
//! - Time base ([`Clock`])
//! - Photosensor ([`LightSensor`])
//! - Debounced button ([`InputControl`])
//! - Click outputs ([`DigitalOutput`], [`HidMouse`]) wrapped by [`click`]
//! - Capability probes, status LED, display, restart

pub mod click;
pub mod system;

use crate::machine::view::StatusView;
use thiserror::Error;

/// Monotonic time base with microsecond resolution
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin
    fn now_us(&self) -> u64;

    /// Milliseconds since the same origin
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }

    /// Busy delay. Only used for short click pulses, never for waits that
    /// must observe the button.
    fn delay_us(&self, us: u64) {
        let start = self.now_us();
        while self.now_us().saturating_sub(start) < us {}
    }
}

/// Single-channel brightness reading
///
/// Called thousands of times per measurement, so implementations must not
/// block or log.
pub trait LightSensor {
    fn read(&mut self) -> u16;
}

/// Debounced single button
///
/// Edges are reported once, for the first `update` after they happen.
pub trait InputControl {
    /// Sample the button. Must be called before the queries below.
    fn update(&mut self, now_ms: u64);
    fn is_pressed(&self) -> bool;
    /// Duration of the press in progress, 0 when released
    fn current_hold_ms(&self) -> u64;
    /// Duration of the last completed press
    fn previous_hold_ms(&self) -> u64;
    /// Button went down since the previous `update`
    fn pressed_edge(&self) -> bool;
    /// Button came up since the previous `update`
    fn released_edge(&self) -> bool;
}

/// Binary signal line wired into the mouse under test
pub trait DigitalOutput {
    fn set_high(&mut self);
    fn set_low(&mut self);
    fn is_high(&self) -> bool;
}

/// USB HID mouse endpoint exposed to the host
pub trait HidMouse {
    /// Queue a full press/release report pair. Delivery is host-paced.
    fn click(&mut self);
    /// Queue a relative movement report, even when both deltas are zero
    fn move_by(&mut self, dx: i16, dy: i16);
}

/// Capability checks consulted at startup and before starting a session
pub trait CapabilityProbe {
    /// Host has enumerated the USB device
    fn usb_connected(&mut self) -> bool;
    /// Raw level on the mouse-presence line
    fn mouse_presence_level(&mut self) -> u16;
}

/// Fault indicator
pub trait StatusLed {
    fn set(&mut self, on: bool);
}

/// Display errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    #[error("Display init failed: {0}")]
    InitFailed(String),
}

/// On-device screen. Layout and refresh cadence belong to the implementor.
pub trait Display {
    fn init(&mut self) -> Result<(), DisplayError>;
    fn render(&mut self, view: &StatusView);
}

/// Watchdog-style device restart
///
/// On hardware this never returns. Implementations that do return (the
/// simulator) get a freshly initialised controller afterwards.
pub trait Restart {
    fn restart(&mut self);
}
