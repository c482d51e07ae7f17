//! E2E tests for aperture sessions
//!
//! Aperture modes time both screen edges on a toggling target. The first
//! cycle only syncs and warms up; afterwards measured edges alternate.

use photontester::sim::{script, ScreenModel, SimHandle};
use photontester::{Config, Controller, Mode, State, Stream};

const RISE_US: u64 = 12_000;
const FALL_US: u64 = 18_500;

fn toggle() -> ScreenModel {
    ScreenModel::Toggle {
        rise_latency_us: RISE_US,
        fall_latency_us: FALL_US,
    }
}

fn booted(sim: &SimHandle, config: Config) -> Controller {
    let mut controller = Controller::new(sim.rig(&config), config);
    assert!(script::run_until(&mut controller, sim, 5_000, |c| {
        c.state() == State::SelectMenu
    }));
    controller
}

/// The sync cycle records nothing
#[test]
fn test_first_cycle_produces_no_samples() {
    let sim = SimHandle::new(toggle());
    let mut config = Config::default();
    config.session.run_limits = vec![2];
    let mut controller = booted(&sim, config);

    script::start_session(&mut controller, &sim, Mode::AutoAperture, 0);
    assert_eq!(controller.state(), State::Measuring(Mode::AutoAperture));

    let session = controller.session().copied().unwrap();
    assert!(!session.is_first_run, "Sync should have run during the scripted release gap");
    assert_eq!(controller.stats().stats(Stream::AutoApertureRise).run_count, 0);
    assert_eq!(controller.stats().stats(Stream::AutoApertureFall).run_count, 0);
}

/// Both edges measured to the limit with their own latencies
#[test]
fn test_auto_aperture_alternates_edges() {
    let sim = SimHandle::new(toggle());
    let mut config = Config::default();
    config.session.run_limits = vec![3];
    let mut controller = booted(&sim, config);

    script::start_session(&mut controller, &sim, Mode::AutoAperture, 0);
    assert!(script::run_until(&mut controller, &sim, 10_000, |c| {
        c.state() == State::RunsComplete(Mode::AutoAperture)
    }));

    let rise = controller.stats().stats(Stream::AutoApertureRise);
    let fall = controller.stats().stats(Stream::AutoApertureFall);
    assert_eq!(rise.run_count, 3);
    assert_eq!(fall.run_count, 3);
    assert_eq!(rise.avg_latency, 12.0);
    assert_eq!(fall.avg_latency, 18.5);
    assert_eq!(rise.max_latency, 12.0);
    assert_eq!(fall.min_latency, 18.5);
}

/// Direct aperture clicks over HID only, and needs USB
#[test]
fn test_direct_aperture_uses_hid() {
    let sim = SimHandle::new(toggle());
    let mut config = Config::default();
    config.session.run_limits = vec![2];
    let mut controller = booted(&sim, config);

    script::start_session(&mut controller, &sim, Mode::DirectAperture, 0);
    assert!(script::run_until(&mut controller, &sim, 10_000, |c| {
        c.state() == State::RunsComplete(Mode::DirectAperture)
    }));

    assert_eq!(controller.stats().stats(Stream::DirectApertureRise).run_count, 2);
    assert_eq!(controller.stats().stats(Stream::DirectApertureFall).run_count, 2);
    assert_eq!(controller.stats().stats(Stream::AutoApertureRise).run_count, 0);
    assert!(sim.with(|w| w.hid_clicks) >= 4);
    assert!(!sim.wired_high());
}

#[test]
fn test_direct_aperture_vetoed_without_usb() {
    let sim = SimHandle::new(toggle());
    sim.with(|w| w.usb_connected = false);
    let mut controller = booted(&sim, Config::default());

    script::start_session(&mut controller, &sim, Mode::DirectAperture, 0);

    assert_eq!(controller.state(), State::SelectMenu);
    assert_eq!(controller.notice(), Some("Connect USB to the PC"));
    assert!(controller.session().is_none());
    assert_eq!(sim.with(|w| w.hid_clicks), 0);
}

/// A stuck panel produces no samples but the session keeps going
#[test]
fn test_stuck_panel_keeps_measuring() {
    let sim = SimHandle::new(toggle());
    let mut config = Config::default();
    config.timing.aperture_timeout_us = 100_000;
    config.timing.resync_timeout_us = 100_000;
    config.session.run_limits = vec![2];
    let mut controller = booted(&sim, config);

    script::start_session(&mut controller, &sim, Mode::AutoAperture, 0);
    sim.with(|w| w.screen = ScreenModel::Frozen);
    script::run_for_ms(&mut controller, &sim, 2_000);

    assert_eq!(controller.state(), State::Measuring(Mode::AutoAperture));
    assert_eq!(controller.stats().stats(Stream::AutoApertureRise).run_count, 0);
    assert_eq!(controller.stats().stats(Stream::AutoApertureFall).run_count, 0);
}
