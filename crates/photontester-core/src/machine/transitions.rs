//! Transition table
//!
//! `next(state, event)` is a pure function returning the target state and
//! the side effect the controller must perform. Hold resolution compares the
//! total hold against the thresholds highest first, so a long hold can never
//! be taken for a shorter action.
//!
//! | From            | Event           | To                 | Action          |
//! |-----------------|-----------------|--------------------|-----------------|
//! | Setup           | StartupChecked  | menu / debug view  | cursor / debug  |
//! | Setup           | DisplayFailed   | ErrorHalt          | Halt            |
//! | menu states     | ShortPress      | same               | MoveCursor      |
//! | operational     | HoldStarted     | HoldAction{from}   | -               |
//! | HoldAction      | Released        | see [`resolve_hold`] |               |
//! | Measuring       | RunLimitReached | RunsComplete       | FlushLogs       |

use super::state::{DebugView, HoldOrigin, State};
use crate::config::HoldThresholds;
use crate::modes::Mode;

/// Hold duration bands, in resolution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldLevel {
    /// Shorter than select: return to where the hold started
    Abort,
    /// SELECT, EXIT, or BYPASS depending on origin
    Select,
    /// Open the debug menu
    Debug,
    /// Restart the device
    Reset,
}

impl HoldLevel {
    pub fn label(self) -> &'static str {
        match self {
            HoldLevel::Abort => "Release to cancel",
            HoldLevel::Select => "Release to select",
            HoldLevel::Debug => "Release for debug",
            HoldLevel::Reset => "Release to reset",
        }
    }
}

/// Band for a total hold duration, highest threshold first
pub fn classify_hold(held_ms: u64, hold: &HoldThresholds) -> HoldLevel {
    if held_ms >= hold.reset_ms {
        HoldLevel::Reset
    } else if held_ms >= hold.debug_ms {
        HoldLevel::Debug
    } else if held_ms >= hold.select_ms {
        HoldLevel::Select
    } else {
        HoldLevel::Abort
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    StartupChecked { sensor_ok: bool, mouse_ok: bool },
    DisplayFailed,
    /// Press released before the hold start threshold
    ShortPress,
    /// Button held past the start threshold, or an interruptible wait aborted
    HoldStarted,
    Released { held_ms: u64 },
    RunLimitReached,
}

/// Side effect performed by the controller after switching state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    MoveCursor,
    ResetCursor,
    /// Check preconditions, reset the mode's stats, start the session
    StartSession { mode: Mode, limit_index: usize },
    EnterDebug(DebugView),
    /// Flush and clear the mode's stats
    ExitSession(Mode),
    /// Abandon any session and show the debug menu
    OpenDebugMenu { abandoned: Option<Mode> },
    /// Clear the fault LED despite a failed mouse check
    Bypass,
    /// Leave the sensor view, vetoed while the sensor is unstable
    LeaveSensorDebug,
    LeaveDebug,
    Restart,
    FlushLogs,
    Halt,
}

/// Target state and side effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub to: State,
    pub action: Action,
}

impl Transition {
    fn to(to: State, action: Action) -> Self {
        Self { to, action }
    }

    fn stay(state: State) -> Self {
        Self::to(state, Action::None)
    }
}

/// Next state and action
///
/// # Arguments
/// * `state` - Current state
/// * `event` - Input to process
/// * `hold` - Hold thresholds
/// * `cursor` - Highlighted option of the current menu
pub fn next(state: State, event: Event, hold: &HoldThresholds, cursor: usize) -> Transition {
    match (state, event) {
        (State::Setup, Event::DisplayFailed) => Transition::to(State::ErrorHalt, Action::Halt),
        (State::Setup, Event::StartupChecked { sensor_ok, mouse_ok }) => {
            if !sensor_ok {
                Transition::to(
                    State::Debug(DebugView::Sensor),
                    Action::EnterDebug(DebugView::Sensor),
                )
            } else if !mouse_ok {
                Transition::to(
                    State::Debug(DebugView::Mouse),
                    Action::EnterDebug(DebugView::Mouse),
                )
            } else {
                Transition::to(State::SelectMenu, Action::ResetCursor)
            }
        }

        (s, Event::ShortPress) if s.is_menu() => Transition::to(s, Action::MoveCursor),

        (s, Event::HoldStarted) => match s.hold_origin() {
            Some(from) => Transition::stay(State::HoldAction { from }),
            None => Transition::stay(s),
        },

        (State::HoldAction { from }, Event::Released { held_ms }) => {
            resolve_hold(from, classify_hold(held_ms, hold), cursor)
        }

        (State::Measuring(mode), Event::RunLimitReached) => {
            Transition::to(State::RunsComplete(mode), Action::FlushLogs)
        }

        (s, _) => Transition::stay(s),
    }
}

/// Outcome of a released hold
pub fn resolve_hold(from: HoldOrigin, level: HoldLevel, cursor: usize) -> Transition {
    match level {
        HoldLevel::Reset => Transition::to(State::Setup, Action::Restart),
        HoldLevel::Debug => {
            let abandoned = match from {
                HoldOrigin::Measuring(mode) | HoldOrigin::RunsComplete(mode) => Some(mode),
                _ => None,
            };
            Transition::to(State::SelectDebugMenu, Action::OpenDebugMenu { abandoned })
        }
        HoldLevel::Select => select(from, cursor),
        HoldLevel::Abort => Transition::stay(from.state()),
    }
}

/// SELECT, EXIT, or BYPASS by origin
fn select(from: HoldOrigin, cursor: usize) -> Transition {
    match from {
        HoldOrigin::SelectMenu => {
            let mode = Mode::ALL[cursor % Mode::ALL.len()];
            Transition::to(State::SelectRunLimit(mode), Action::ResetCursor)
        }
        HoldOrigin::SelectRunLimit(mode) => Transition::to(
            State::Measuring(mode),
            Action::StartSession {
                mode,
                limit_index: cursor,
            },
        ),
        HoldOrigin::SelectDebugMenu => {
            let view = DebugView::ALL[cursor % DebugView::ALL.len()];
            Transition::to(State::Debug(view), Action::EnterDebug(view))
        }
        HoldOrigin::Measuring(mode) | HoldOrigin::RunsComplete(mode) => {
            Transition::to(State::SelectMenu, Action::ExitSession(mode))
        }
        HoldOrigin::Debug(DebugView::Mouse) => Transition::to(State::SelectMenu, Action::Bypass),
        HoldOrigin::Debug(DebugView::Sensor) => {
            Transition::to(State::SelectMenu, Action::LeaveSensorDebug)
        }
        HoldOrigin::Debug(DebugView::PollingTest) => {
            Transition::to(State::SelectMenu, Action::LeaveDebug)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hold() -> HoldThresholds {
        HoldThresholds::default()
    }

    fn release(from: HoldOrigin, held_ms: u64, cursor: usize) -> Transition {
        next(
            State::HoldAction { from },
            Event::Released { held_ms },
            &hold(),
            cursor,
        )
    }

    #[test]
    fn test_classify_highest_first() {
        let h = hold();
        assert_eq!(classify_hold(400, &h), HoldLevel::Abort);
        assert_eq!(classify_hold(799, &h), HoldLevel::Abort);
        assert_eq!(classify_hold(800, &h), HoldLevel::Select);
        assert_eq!(classify_hold(900, &h), HoldLevel::Select);
        assert_eq!(classify_hold(1400, &h), HoldLevel::Debug);
        assert_eq!(classify_hold(1800, &h), HoldLevel::Reset);
        assert_eq!(classify_hold(60_000, &h), HoldLevel::Reset);
    }

    #[test]
    fn test_hold_durations_from_measuring() {
        let from = HoldOrigin::Measuring(Mode::Automatic);

        let abort = release(from, 400, 0);
        assert_eq!(abort.to, State::Measuring(Mode::Automatic));
        assert_eq!(abort.action, Action::None);

        let exit = release(from, 900, 0);
        assert_eq!(exit.to, State::SelectMenu);
        assert_eq!(exit.action, Action::ExitSession(Mode::Automatic));

        let debug = release(from, 1400, 0);
        assert_eq!(debug.to, State::SelectDebugMenu);
        assert_eq!(
            debug.action,
            Action::OpenDebugMenu {
                abandoned: Some(Mode::Automatic)
            }
        );

        let reset = release(from, 2000, 0);
        assert_eq!(reset.to, State::Setup);
        assert_eq!(reset.action, Action::Restart);
    }

    #[test]
    fn test_select_from_menus() {
        let t = release(HoldOrigin::SelectMenu, 900, 2);
        assert_eq!(t.to, State::SelectRunLimit(Mode::DirectAperture));

        let t = release(HoldOrigin::SelectRunLimit(Mode::AutoAperture), 900, 3);
        assert_eq!(t.to, State::Measuring(Mode::AutoAperture));
        assert_eq!(
            t.action,
            Action::StartSession {
                mode: Mode::AutoAperture,
                limit_index: 3
            }
        );

        let t = release(HoldOrigin::SelectDebugMenu, 900, 1);
        assert_eq!(t.to, State::Debug(DebugView::Sensor));
        assert_eq!(t.action, Action::EnterDebug(DebugView::Sensor));
    }

    #[test]
    fn test_bypass_only_from_mouse_view() {
        let t = release(HoldOrigin::Debug(DebugView::Mouse), 900, 0);
        assert_eq!(t.action, Action::Bypass);
        for view in [DebugView::Sensor, DebugView::PollingTest] {
            assert_ne!(release(HoldOrigin::Debug(view), 900, 0).action, Action::Bypass);
        }
    }

    #[test]
    fn test_abort_returns_to_every_origin() {
        let origins = [
            HoldOrigin::SelectMenu,
            HoldOrigin::SelectRunLimit(Mode::Automatic),
            HoldOrigin::Measuring(Mode::DirectAperture),
            HoldOrigin::RunsComplete(Mode::AutoAperture),
            HoldOrigin::SelectDebugMenu,
            HoldOrigin::Debug(DebugView::PollingTest),
        ];
        for from in origins {
            assert_eq!(release(from, 300, 0), Transition::stay(from.state()));
        }
    }

    #[test]
    fn test_short_press_only_in_menus() {
        let h = hold();
        assert_eq!(
            next(State::SelectMenu, Event::ShortPress, &h, 0).action,
            Action::MoveCursor
        );
        assert_eq!(
            next(State::Measuring(Mode::Automatic), Event::ShortPress, &h, 0),
            Transition::stay(State::Measuring(Mode::Automatic))
        );
        let holding = State::HoldAction {
            from: HoldOrigin::SelectMenu,
        };
        assert_eq!(
            next(holding, Event::ShortPress, &h, 0),
            Transition::stay(holding)
        );
    }

    #[test]
    fn test_hold_started_enters_hold_action() {
        let t = next(State::RunsComplete(Mode::Automatic), Event::HoldStarted, &hold(), 0);
        assert_eq!(
            t.to,
            State::HoldAction {
                from: HoldOrigin::RunsComplete(Mode::Automatic)
            }
        );
        assert_eq!(
            next(State::Setup, Event::HoldStarted, &hold(), 0).to,
            State::Setup
        );
    }

    #[test]
    fn test_startup_routing() {
        let h = hold();
        let ok = Event::StartupChecked {
            sensor_ok: true,
            mouse_ok: true,
        };
        assert_eq!(next(State::Setup, ok, &h, 0).to, State::SelectMenu);

        let no_mouse = Event::StartupChecked {
            sensor_ok: true,
            mouse_ok: false,
        };
        assert_eq!(
            next(State::Setup, no_mouse, &h, 0).to,
            State::Debug(DebugView::Mouse)
        );

        let nothing = Event::StartupChecked {
            sensor_ok: false,
            mouse_ok: false,
        };
        assert_eq!(
            next(State::Setup, nothing, &h, 0).to,
            State::Debug(DebugView::Sensor)
        );

        assert_eq!(
            next(State::Setup, Event::DisplayFailed, &h, 0).to,
            State::ErrorHalt
        );
    }

    #[test]
    fn test_run_limit_completes_session() {
        let t = next(
            State::Measuring(Mode::AutoAperture),
            Event::RunLimitReached,
            &hold(),
            0,
        );
        assert_eq!(t.to, State::RunsComplete(Mode::AutoAperture));
        assert_eq!(t.action, Action::FlushLogs);
    }

    #[test]
    fn test_error_halt_is_terminal() {
        let h = hold();
        for event in [
            Event::ShortPress,
            Event::HoldStarted,
            Event::Released { held_ms: 5000 },
            Event::RunLimitReached,
        ] {
            assert_eq!(next(State::ErrorHalt, event, &h, 0).to, State::ErrorHalt);
        }
    }
}
