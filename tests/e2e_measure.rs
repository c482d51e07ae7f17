//! E2E tests for the timed measurement loop
//!
//! Runs `measure` against the simulated rig with both actuators and both
//! edges, including the timeout path.

use photontester::hal::click::ClickKind;
use photontester::measure::edge::{Edge, EdgeWait};
use photontester::measure::latency::{measure, us_to_ms, MeasureError};
use photontester::sim::{ScreenModel, SimHandle};
use photontester::Config;

fn wait(config: &Config, edge: Edge, timeout_us: u64) -> EdgeWait {
    EdgeWait::new(edge, &config.light, timeout_us)
}

/// Wired click on a flashing panel measures the configured latency exactly
#[test]
fn test_wired_flash_latency() {
    let sim = SimHandle::new(ScreenModel::Flash {
        latency_us: 16_700,
        duration_us: 30_000,
    });
    let config = Config::default();
    let mut rig = sim.rig(&config);
    let (probe, click) = rig.split(ClickKind::Wired, config.hold.start_ms);

    let us = measure(
        probe.clock,
        &mut *probe.sensor,
        click,
        &wait(&config, Edge::Rising, 1_000_000),
    )
    .unwrap();

    assert_eq!(us, 16_700);
    assert_eq!(us_to_ms(us), 16.7);
    assert!(!sim.wired_high(), "Stimulus must be released after the crossing");
}

/// HID delivery delay is part of the measured latency
#[test]
fn test_hid_delivery_delay_is_measured() {
    let sim = SimHandle::new(ScreenModel::Flash {
        latency_us: 5_000,
        duration_us: 30_000,
    });
    sim.with(|w| w.hid_delay_us = 2_000);
    let config = Config::default();
    let mut rig = sim.rig(&config);
    let (probe, click) = rig.split(ClickKind::Hid, config.hold.start_ms);

    let us = measure(
        probe.clock,
        &mut *probe.sensor,
        click,
        &wait(&config, Edge::Rising, 1_000_000),
    )
    .unwrap();

    assert_eq!(us, 7_000);
    assert_eq!(sim.with(|w| w.hid_clicks), 1);
    assert_eq!(sim.clicks(), 1);
}

/// A lit toggling panel is timed on its falling edge
#[test]
fn test_falling_edge_on_toggle() {
    let sim = SimHandle::new(ScreenModel::Toggle {
        rise_latency_us: 9_000,
        fall_latency_us: 21_000,
    });
    sim.with(|w| {
        w.lit = true;
        w.target_lit = true;
    });
    let config = Config::default();
    let mut rig = sim.rig(&config);
    let (probe, click) = rig.split(ClickKind::Wired, config.hold.start_ms);

    let us = measure(
        probe.clock,
        &mut *probe.sensor,
        click,
        &wait(&config, Edge::Falling, 1_000_000),
    )
    .unwrap();

    assert_eq!(us, 21_000);
    assert!(!sim.with(|w| w.lit));
}

/// No crossing within budget is a timeout, never a sample
#[test]
fn test_timeout_releases_stimulus() {
    let sim = SimHandle::new(ScreenModel::Frozen);
    let config = Config::default();
    let mut rig = sim.rig(&config);
    let (probe, click) = rig.split(ClickKind::Wired, config.hold.start_ms);

    let result = measure(
        probe.clock,
        &mut *probe.sensor,
        click,
        &wait(&config, Edge::Rising, 20_000),
    );

    match result {
        Err(MeasureError::Timeout { elapsed_us }) => assert!(elapsed_us >= 20_000),
        other => panic!("Expected timeout, got {:?}", other),
    }
    assert!(!sim.wired_high());
    assert_eq!(sim.clicks(), 1);
}

/// A level between the thresholds crosses neither edge
#[test]
fn test_indeterminate_level_times_out() {
    let sim = SimHandle::new(ScreenModel::Frozen);
    sim.with(|w| w.fixed_level = Some(80));
    let config = Config::default();
    let mut rig = sim.rig(&config);

    for edge in [Edge::Rising, Edge::Falling] {
        let (probe, click) = rig.split(ClickKind::Wired, config.hold.start_ms);
        assert!(measure(
            probe.clock,
            &mut *probe.sensor,
            click,
            &wait(&config, edge, 5_000),
        )
        .is_err());
    }
}
