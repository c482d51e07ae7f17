//! Button scripts for driving a [`Controller`] on the simulated rig

use super::SimHandle;
use crate::machine::{Controller, State};
use crate::modes::Mode;

/// Short press that moves a menu cursor
pub const TAP_MS: u64 = 50;
/// Hold that resolves to SELECT with default thresholds
pub const SELECT_HOLD_MS: u64 = 900;
/// Idle time after each scripted release
const GAP_MS: u64 = 20;
/// Extra time allowed for a hold to resolve after its release
const RESOLVE_SLACK_MS: u64 = 10_000;

/// Tick for `ms` of virtual time
pub fn run_for_ms(controller: &mut Controller, sim: &SimHandle, ms: u64) {
    let end = sim.now_ms() + ms;
    while sim.now_ms() < end {
        controller.tick();
    }
}

/// Tick until `done` holds or `timeout_ms` passes; returns whether it held
pub fn run_until(
    controller: &mut Controller,
    sim: &SimHandle,
    timeout_ms: u64,
    done: impl Fn(&Controller) -> bool,
) -> bool {
    let end = sim.now_ms() + timeout_ms;
    while !done(controller) {
        if sim.now_ms() >= end {
            return false;
        }
        controller.tick();
    }
    true
}

/// Press for `duration_ms` starting on the next millisecond, then idle briefly
pub fn hold(controller: &mut Controller, sim: &SimHandle, duration_ms: u64) {
    let start = sim.now_ms() + 1;
    sim.press(start, duration_ms);
    let end = start + duration_ms + GAP_MS;
    while sim.now_ms() < end {
        controller.tick();
    }
}

pub fn tap(controller: &mut Controller, sim: &SimHandle) {
    hold(controller, sim, TAP_MS);
}

pub fn select(controller: &mut Controller, sim: &SimHandle) {
    hold(controller, sim, SELECT_HOLD_MS);
}

/// Hold for `duration_ms` and return the state the release resolved to
///
/// Stops ticking as soon as the hold-action state is left, so the result is
/// observed before the next state does any work.
pub fn hold_and_resolve(controller: &mut Controller, sim: &SimHandle, duration_ms: u64) -> State {
    let start = sim.now_ms() + 1;
    sim.press(start, duration_ms);
    let deadline = start + duration_ms + RESOLVE_SLACK_MS;

    let holding = |c: &Controller| matches!(c.state(), State::HoldAction { .. });
    if !run_until(controller, sim, deadline - sim.now_ms(), holding) {
        return controller.state();
    }
    run_until(controller, sim, deadline.saturating_sub(sim.now_ms()), |c| {
        !holding(c)
    });
    controller.state()
}

/// From the select menu: pick `mode`, then the run limit at `limit_index`
pub fn start_session(controller: &mut Controller, sim: &SimHandle, mode: Mode, limit_index: usize) {
    let position = Mode::ALL.iter().position(|&m| m == mode).unwrap_or(0);
    for _ in 0..position {
        tap(controller, sim);
    }
    select(controller, sim);
    for _ in 0..limit_index {
        tap(controller, sim);
    }
    select(controller, sim);
}
