//! Deterministic simulated rig
//!
//! All simulated devices share one [`SimWorld`]. The virtual clock advances
//! a fixed step on every read, so polling loops make progress without real
//! delays and every timing is reproducible. The screen reacts to clicks
//! according to its [`ScreenModel`]; the button follows scripted presses.
//!
//! ```ignore
//! let sim = SimHandle::new(ScreenModel::Flash { latency_us: 1200, duration_us: 30_000 });
//! let mut controller = Controller::new(sim.rig(&config), config);
//! ```

pub mod devices;
pub mod script;
pub mod world;

pub use world::{Press, ScreenModel, SimWorld};

use crate::config::Config;
use crate::hal::click::{GpioClick, HidClick};
use crate::rig::Rig;
use crate::stats::persist::LogSink;
use devices::{
    MemoryLogSink, SimButton, SimClock, SimDisplay, SimLed, SimMouse, SimPin, SimProbe,
    SimRestart, SimSensor,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Cloneable handle to the shared world
#[derive(Debug, Clone)]
pub struct SimHandle(Rc<RefCell<SimWorld>>);

impl SimHandle {
    pub fn new(screen: ScreenModel) -> Self {
        Self(Rc::new(RefCell::new(SimWorld::new(screen))))
    }

    /// Run `f` against the world
    pub fn with<R>(&self, f: impl FnOnce(&mut SimWorld) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// Current virtual time without advancing it
    pub fn now_us(&self) -> u64 {
        self.with(|w| w.now_us)
    }

    pub fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }

    /// Clicks delivered to the target, including a swallowed focus click
    pub fn clicks(&self) -> u32 {
        self.with(|w| w.clicks)
    }

    pub fn wired_high(&self) -> bool {
        self.with(|w| w.wired_high)
    }

    /// Script a button press
    pub fn press(&self, start_ms: u64, duration_ms: u64) {
        self.with(|w| {
            w.presses.push(Press {
                start_ms,
                duration_ms,
            })
        });
    }

    /// Build a rig whose devices all act on this world
    pub fn rig(&self, config: &Config) -> Rig {
        let sink: Option<Box<dyn LogSink>> = if self.with(|w| w.attach_sink) {
            Some(Box::new(MemoryLogSink(self.clone())))
        } else {
            None
        };
        Rig {
            clock: Box::new(SimClock(self.clone())),
            sensor: Box::new(SimSensor(self.clone())),
            button: Box::new(SimButton::new(self.clone())),
            wired: GpioClick::new(Box::new(SimPin(self.clone())), config.timing.gpio_hold_us),
            hid: HidClick::new(Box::new(SimMouse(self.clone())), config.timing.hid_settle_us),
            probe: Box::new(SimProbe(self.clone())),
            led: Box::new(SimLed(self.clone())),
            display: Box::new(SimDisplay(self.clone())),
            restart: Box::new(SimRestart(self.clone())),
            sink,
        }
    }
}
