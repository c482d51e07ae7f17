//! Shared state of the simulated rig

use crate::machine::view::StatusView;
use crate::stats::stream::Stream;

/// How the simulated screen responds to clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenModel {
    /// Each click lights the screen after `latency_us` for `duration_us`
    Flash { latency_us: u64, duration_us: u64 },
    /// Each click flips the screen; the new level lands after the latency for
    /// that direction
    Toggle {
        rise_latency_us: u64,
        fall_latency_us: u64,
    },
    /// Clicks have no visible effect
    Frozen,
}

/// Scripted button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Press {
    pub start_ms: u64,
    pub duration_ms: u64,
}

impl Press {
    pub fn end_ms(&self) -> u64 {
        self.start_ms + self.duration_ms
    }

    pub fn covers(&self, now_ms: u64) -> bool {
        self.start_ms <= now_ms && now_ms < self.end_ms()
    }
}

/// Everything the simulated devices read and write
///
/// Fields are public so tests can arrange and inspect the rig directly.
#[derive(Debug, Clone)]
pub struct SimWorld {
    /// Virtual time, advanced by `step_us` on every clock read
    pub now_us: u64,
    pub step_us: u64,

    pub screen: ScreenModel,
    /// When false the next click only focuses the target and is otherwise lost
    pub focused: bool,
    pub lit: bool,
    /// Level the screen is heading to in the toggle model
    pub target_lit: bool,
    /// Pending screen changes as (due time, lit), ordered by due time
    pub transitions: Vec<(u64, bool)>,

    pub light_level: u16,
    pub dark_level: u16,
    /// Overrides the screen model when set
    pub fixed_level: Option<u16>,
    /// Peak-to-peak noise added to sensor readings
    pub sensor_wobble: u16,

    pub usb_connected: bool,
    pub mouse_level: u16,
    pub mouse_wobble: u16,

    /// Host delivery delay for HID clicks
    pub hid_delay_us: u64,
    /// All clicks the target received or swallowed, wired and HID
    pub clicks: u32,
    pub hid_clicks: u32,
    pub hid_moves: u64,
    pub last_move: (i16, i16),
    pub wired_high: bool,

    pub led_on: bool,
    pub led_changes: u32,

    pub display_fails: bool,
    pub last_view: Option<StatusView>,
    /// Every rendered view, in order
    pub views: Vec<StatusView>,

    pub restarts: u32,

    /// Attach a memory log sink to rigs built from this world
    pub attach_sink: bool,
    pub sink_fails: bool,
    pub persisted: Vec<(Stream, Vec<f64>)>,
    pub sink_sessions: u32,

    pub presses: Vec<Press>,

    sensor_phase: bool,
    mouse_phase: bool,
}

impl SimWorld {
    pub fn new(screen: ScreenModel) -> Self {
        Self {
            now_us: 0,
            step_us: 1,
            screen,
            focused: true,
            lit: false,
            target_lit: false,
            transitions: Vec::new(),
            light_level: 230,
            dark_level: 15,
            fixed_level: None,
            sensor_wobble: 0,
            usb_connected: true,
            mouse_level: 200,
            mouse_wobble: 0,
            hid_delay_us: 0,
            clicks: 0,
            hid_clicks: 0,
            hid_moves: 0,
            last_move: (0, 0),
            wired_high: false,
            led_on: false,
            led_changes: 0,
            display_fails: false,
            last_view: None,
            views: Vec::new(),
            restarts: 0,
            attach_sink: true,
            sink_fails: false,
            persisted: Vec::new(),
            sink_sessions: 0,
            presses: Vec::new(),
            sensor_phase: false,
            mouse_phase: false,
        }
    }

    /// Advance the clock one step and return the new time
    pub(crate) fn advance(&mut self) -> u64 {
        self.now_us += self.step_us;
        self.now_us
    }

    /// A click reaches the target at `at_us`
    pub(crate) fn deliver_click(&mut self, at_us: u64) {
        self.clicks += 1;
        if !self.focused {
            self.focused = true;
            return;
        }
        match self.screen {
            ScreenModel::Flash {
                latency_us,
                duration_us,
            } => {
                self.schedule(at_us + latency_us, true);
                self.schedule(at_us + latency_us + duration_us, false);
            }
            ScreenModel::Toggle {
                rise_latency_us,
                fall_latency_us,
            } => {
                self.target_lit = !self.target_lit;
                let latency = if self.target_lit {
                    rise_latency_us
                } else {
                    fall_latency_us
                };
                self.schedule(at_us + latency, self.target_lit);
            }
            ScreenModel::Frozen => {}
        }
    }

    fn schedule(&mut self, at_us: u64, lit: bool) {
        let index = self.transitions.partition_point(|&(t, _)| t <= at_us);
        self.transitions.insert(index, (at_us, lit));
    }

    /// Apply screen changes that are due
    fn settle_screen(&mut self) {
        let due = self.transitions.partition_point(|&(t, _)| t <= self.now_us);
        if let Some(&(_, lit)) = self.transitions[..due].last() {
            self.lit = lit;
        }
        self.transitions.drain(..due);
    }

    pub(crate) fn sensor_level(&mut self) -> u16 {
        self.settle_screen();
        if let Some(level) = self.fixed_level {
            return level;
        }
        let base = if self.lit {
            self.light_level
        } else {
            self.dark_level
        };
        base.saturating_add(wobble(&mut self.sensor_phase, self.sensor_wobble))
    }

    pub(crate) fn presence_level(&mut self) -> u16 {
        self.mouse_level
            .saturating_add(wobble(&mut self.mouse_phase, self.mouse_wobble))
    }

    /// Scripted press in progress at `now_ms`
    pub(crate) fn press_at(&self, now_ms: u64) -> Option<Press> {
        self.presses.iter().copied().find(|p| p.covers(now_ms))
    }
}

/// Alternates between adding `amount` and nothing
fn wobble(phase: &mut bool, amount: u16) -> u16 {
    *phase = !*phase;
    if *phase {
        amount
    } else {
        0
    }
}
