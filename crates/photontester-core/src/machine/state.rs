//! Controller states

use crate::modes::Mode;

/// Debug views reachable from the debug menu or a failed startup check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugView {
    /// Live mouse-presence level; BYPASS escapes a failed mouse check
    Mouse,
    /// Live light level with a rolling stability window
    Sensor,
    /// HID report stream for host polling-rate tools
    PollingTest,
}

impl DebugView {
    /// Debug menu order
    pub const ALL: [DebugView; 3] = [DebugView::Mouse, DebugView::Sensor, DebugView::PollingTest];

    pub fn label(self) -> &'static str {
        match self {
            DebugView::Mouse => "Mouse",
            DebugView::Sensor => "Sensor",
            DebugView::PollingTest => "Polling Test",
        }
    }
}

/// State a hold was started from, and returned to on abort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldOrigin {
    SelectMenu,
    SelectRunLimit(Mode),
    Measuring(Mode),
    RunsComplete(Mode),
    SelectDebugMenu,
    Debug(DebugView),
}

impl HoldOrigin {
    pub fn state(self) -> State {
        match self {
            HoldOrigin::SelectMenu => State::SelectMenu,
            HoldOrigin::SelectRunLimit(mode) => State::SelectRunLimit(mode),
            HoldOrigin::Measuring(mode) => State::Measuring(mode),
            HoldOrigin::RunsComplete(mode) => State::RunsComplete(mode),
            HoldOrigin::SelectDebugMenu => State::SelectDebugMenu,
            HoldOrigin::Debug(view) => State::Debug(view),
        }
    }
}

/// UI and measurement phase. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Display init and stability sampling
    Setup,
    SelectMenu,
    /// Run limit choice for the mode picked in the select menu
    SelectRunLimit(Mode),
    Measuring(Mode),
    /// Run limit reached; statistics frozen until EXIT
    RunsComplete(Mode),
    SelectDebugMenu,
    Debug(DebugView),
    /// Button held past the start threshold; resolved on release
    HoldAction { from: HoldOrigin },
    /// Unrecoverable startup failure
    ErrorHalt,
}

impl State {
    /// Where a hold started in this state returns to, if holds are accepted
    pub fn hold_origin(self) -> Option<HoldOrigin> {
        match self {
            State::SelectMenu => Some(HoldOrigin::SelectMenu),
            State::SelectRunLimit(mode) => Some(HoldOrigin::SelectRunLimit(mode)),
            State::Measuring(mode) => Some(HoldOrigin::Measuring(mode)),
            State::RunsComplete(mode) => Some(HoldOrigin::RunsComplete(mode)),
            State::SelectDebugMenu => Some(HoldOrigin::SelectDebugMenu),
            State::Debug(view) => Some(HoldOrigin::Debug(view)),
            State::Setup | State::HoldAction { .. } | State::ErrorHalt => None,
        }
    }

    /// States where short presses move the cursor
    pub fn is_menu(self) -> bool {
        matches!(
            self,
            State::SelectMenu | State::SelectRunLimit(_) | State::SelectDebugMenu
        )
    }
}
