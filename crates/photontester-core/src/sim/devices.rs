//! Simulated collaborators
//!
//! Each device holds a [`SimHandle`] and reads or writes the shared world.

use super::world::Press;
use super::SimHandle;
use crate::hal::{
    CapabilityProbe, Clock, DigitalOutput, Display, DisplayError, HidMouse, InputControl,
    LightSensor, Restart, StatusLed,
};
use crate::machine::view::StatusView;
use crate::stats::persist::{LogSink, PersistError};
use crate::stats::stream::Stream;
use std::io;
use std::path::PathBuf;

pub struct SimClock(pub(crate) SimHandle);

impl Clock for SimClock {
    fn now_us(&self) -> u64 {
        self.0.with(|w| w.advance())
    }
}

pub struct SimSensor(pub(crate) SimHandle);

impl LightSensor for SimSensor {
    fn read(&mut self) -> u16 {
        self.0.with(|w| w.sensor_level())
    }
}

/// Button driven by the world's scripted presses
pub struct SimButton {
    sim: SimHandle,
    active: Option<Press>,
    current_hold_ms: u64,
    previous_hold_ms: u64,
    pressed_edge: bool,
    released_edge: bool,
}

impl SimButton {
    pub(crate) fn new(sim: SimHandle) -> Self {
        Self {
            sim,
            active: None,
            current_hold_ms: 0,
            previous_hold_ms: 0,
            pressed_edge: false,
            released_edge: false,
        }
    }
}

impl InputControl for SimButton {
    fn update(&mut self, now_ms: u64) {
        let press = self.sim.with(|w| w.press_at(now_ms));
        self.pressed_edge = false;
        self.released_edge = false;

        match (self.active, press) {
            (None, Some(p)) => {
                self.pressed_edge = true;
                self.active = Some(p);
            }
            (Some(prev), None) => {
                self.released_edge = true;
                self.previous_hold_ms = prev.duration_ms;
                self.active = None;
            }
            (Some(prev), Some(p)) if prev != p => {
                // Back-to-back presses: report the release, pick up the new
                // press on the next update
                self.released_edge = true;
                self.previous_hold_ms = prev.duration_ms;
                self.active = None;
            }
            _ => {}
        }

        self.current_hold_ms = match self.active {
            Some(p) => now_ms.saturating_sub(p.start_ms),
            None => 0,
        };
    }

    fn is_pressed(&self) -> bool {
        self.active.is_some()
    }

    fn current_hold_ms(&self) -> u64 {
        self.current_hold_ms
    }

    fn previous_hold_ms(&self) -> u64 {
        self.previous_hold_ms
    }

    fn pressed_edge(&self) -> bool {
        self.pressed_edge
    }

    fn released_edge(&self) -> bool {
        self.released_edge
    }
}

/// Wired click line; the target sees a click on each rising edge
pub struct SimPin(pub(crate) SimHandle);

impl DigitalOutput for SimPin {
    fn set_high(&mut self) {
        self.0.with(|w| {
            if !w.wired_high {
                w.wired_high = true;
                let now = w.now_us;
                w.deliver_click(now);
            }
        });
    }

    fn set_low(&mut self) {
        self.0.with(|w| w.wired_high = false);
    }

    fn is_high(&self) -> bool {
        self.0.with(|w| w.wired_high)
    }
}

pub struct SimMouse(pub(crate) SimHandle);

impl HidMouse for SimMouse {
    fn click(&mut self) {
        self.0.with(|w| {
            w.hid_clicks += 1;
            let at = w.now_us + w.hid_delay_us;
            w.deliver_click(at);
        });
    }

    fn move_by(&mut self, dx: i16, dy: i16) {
        self.0.with(|w| {
            w.hid_moves += 1;
            w.last_move = (dx, dy);
        });
    }
}

pub struct SimProbe(pub(crate) SimHandle);

impl CapabilityProbe for SimProbe {
    fn usb_connected(&mut self) -> bool {
        self.0.with(|w| w.usb_connected)
    }

    fn mouse_presence_level(&mut self) -> u16 {
        self.0.with(|w| w.presence_level())
    }
}

pub struct SimLed(pub(crate) SimHandle);

impl StatusLed for SimLed {
    fn set(&mut self, on: bool) {
        self.0.with(|w| {
            if w.led_on != on {
                w.led_on = on;
                w.led_changes += 1;
            }
        });
    }
}

pub struct SimDisplay(pub(crate) SimHandle);

impl Display for SimDisplay {
    fn init(&mut self) -> Result<(), DisplayError> {
        if self.0.with(|w| w.display_fails) {
            Err(DisplayError::InitFailed("no response from panel".into()))
        } else {
            Ok(())
        }
    }

    fn render(&mut self, view: &StatusView) {
        self.0.with(|w| {
            w.views.push(view.clone());
            w.last_view = Some(view.clone());
        });
    }
}

pub struct SimRestart(pub(crate) SimHandle);

impl Restart for SimRestart {
    fn restart(&mut self) {
        self.0.with(|w| w.restarts += 1);
    }
}

/// Sink that keeps flushed samples in the world
pub struct MemoryLogSink(pub(crate) SimHandle);

impl LogSink for MemoryLogSink {
    fn persist(&mut self, stream: Stream, samples: &[f64]) -> Result<(), PersistError> {
        if samples.is_empty() {
            return Err(PersistError::EmptyStream(stream));
        }
        self.0.with(|w| {
            if w.sink_fails {
                return Err(PersistError::Io {
                    path: PathBuf::from("memory"),
                    source: io::Error::new(io::ErrorKind::Other, "card removed"),
                });
            }
            w.persisted.push((stream, samples.to_vec()));
            Ok(())
        })
    }

    fn new_session(&mut self) {
        self.0.with(|w| w.sink_sessions += 1);
    }
}
