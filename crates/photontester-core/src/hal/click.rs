//! Click actuators
//!
//! Two ways of making the system under test see a click:
//! - [`GpioClick`] pulls the line wired into a real mouse's switch
//! - [`HidClick`] sends a click report over our own USB HID endpoint
//!
//! The wired line stays asserted until [`ClickActuator::release`], so a
//! caller that times a response must release it whatever the outcome. HID
//! clicks are momentary but their delivery is paced by host polling, so
//! unmeasured waits that follow one start only after
//! [`ClickActuator::settle_delay_us`].

use super::{Clock, DigitalOutput, HidMouse};
use serde::{Deserialize, Serialize};

/// Which actuator a session drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickKind {
    /// Signal line into a physical mouse
    Wired,
    /// USB HID report from the instrument itself
    Hid,
}

/// Stimulus capability selected once per session
pub trait ClickActuator {
    /// Start the stimulus
    fn assert_stimulus(&mut self);

    /// Retract the stimulus. Must leave the actuator idle.
    fn release(&mut self);

    /// Extra wait after a click before an unmeasured timer may start
    fn settle_delay_us(&self) -> u64;

    /// Full unmeasured click: assert, hold, release
    fn click(&mut self, clock: &dyn Clock);
}

/// Wired click on a digital output
pub struct GpioClick {
    pin: Box<dyn DigitalOutput>,
    hold_us: u64,
}

impl GpioClick {
    /// Create a wired actuator
    ///
    /// # Arguments
    /// * `pin` - Output line into the mouse switch
    /// * `hold_us` - Pulse width for unmeasured clicks
    pub fn new(mut pin: Box<dyn DigitalOutput>, hold_us: u64) -> Self {
        pin.set_low();
        Self { pin, hold_us }
    }

    /// Current line level
    pub fn is_asserted(&self) -> bool {
        self.pin.is_high()
    }
}

impl ClickActuator for GpioClick {
    fn assert_stimulus(&mut self) {
        self.pin.set_high();
    }

    fn release(&mut self) {
        self.pin.set_low();
    }

    fn settle_delay_us(&self) -> u64 {
        0
    }

    fn click(&mut self, clock: &dyn Clock) {
        self.pin.set_high();
        clock.delay_us(self.hold_us);
        self.pin.set_low();
    }
}

/// USB HID click
pub struct HidClick {
    mouse: Box<dyn HidMouse>,
    settle_us: u64,
}

impl HidClick {
    /// Create a HID actuator
    ///
    /// # Arguments
    /// * `mouse` - HID endpoint
    /// * `settle_us` - Host delivery allowance after each unmeasured click
    pub fn new(mouse: Box<dyn HidMouse>, settle_us: u64) -> Self {
        Self { mouse, settle_us }
    }

    /// Direct access for the polling-rate test, which moves rather than clicks
    pub fn mouse_mut(&mut self) -> &mut dyn HidMouse {
        self.mouse.as_mut()
    }
}

impl ClickActuator for HidClick {
    fn assert_stimulus(&mut self) {
        self.mouse.click();
    }

    fn release(&mut self) {}

    fn settle_delay_us(&self) -> u64 {
        self.settle_us
    }

    fn click(&mut self, _clock: &dyn Clock) {
        self.mouse.click();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct StepClock(Cell<u64>);

    impl Clock for StepClock {
        fn now_us(&self) -> u64 {
            self.0.set(self.0.get() + 1);
            self.0.get()
        }
    }

    #[derive(Clone, Default)]
    struct Line(Rc<RefCell<Vec<bool>>>);

    impl DigitalOutput for Line {
        fn set_high(&mut self) {
            self.0.borrow_mut().push(true);
        }
        fn set_low(&mut self) {
            self.0.borrow_mut().push(false);
        }
        fn is_high(&self) -> bool {
            self.0.borrow().last().copied().unwrap_or(false)
        }
    }

    #[derive(Clone, Default)]
    struct Counter(Rc<Cell<u32>>);

    impl HidMouse for Counter {
        fn click(&mut self) {
            self.0.set(self.0.get() + 1);
        }
        fn move_by(&mut self, _dx: i16, _dy: i16) {}
    }

    #[test]
    fn test_gpio_starts_low() {
        let line = Line::default();
        let click = GpioClick::new(Box::new(line.clone()), 100);
        assert!(!click.is_asserted());
        assert_eq!(*line.0.borrow(), vec![false]);
    }

    #[test]
    fn test_gpio_click_pulses_for_hold_duration() {
        let line = Line::default();
        let clock = StepClock(Cell::new(0));
        let mut click = GpioClick::new(Box::new(line.clone()), 100);

        click.click(&clock);

        assert_eq!(*line.0.borrow(), vec![false, true, false]);
        assert!(clock.0.get() >= 100, "Pulse should last the hold duration");
    }

    #[test]
    fn test_gpio_release_after_assert() {
        let line = Line::default();
        let mut click = GpioClick::new(Box::new(line), 100);
        click.assert_stimulus();
        assert!(click.is_asserted());
        click.release();
        assert!(!click.is_asserted());
        assert_eq!(click.settle_delay_us(), 0);
    }

    #[test]
    fn test_hid_click_is_momentary() {
        let counter = Counter::default();
        let mut click = HidClick::new(Box::new(counter.clone()), 2000);

        click.assert_stimulus();
        click.release();
        click.click(&StepClock(Cell::new(0)));

        assert_eq!(counter.0.get(), 2);
        assert_eq!(click.settle_delay_us(), 2000);
    }
}
