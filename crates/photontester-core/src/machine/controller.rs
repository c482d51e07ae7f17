//! Instrument controller
//!
//! Owns the rig, configuration, statistics, and session, and advances the
//! state machine one polling iteration per [`Controller::tick`]. Every state
//! change goes through [`transitions::next`]; the controller only performs
//! the returned [`Action`], which may veto the change (failed precondition,
//! unstable sensor).

use super::debug::{blink_on, CirclePath, StabilityWindow};
use super::menu::{self, Menu};
use super::startup::{self, StartupReport};
use super::state::{DebugView, State};
use super::transitions::{self, classify_hold, Action, Event};
use super::view::{Page, StatusView, StreamSummary};
use crate::config::Config;
use crate::hal::click::ClickKind;
use crate::measure::jitter::Jitter;
use crate::modes::{Cycle, CycleOutcome, Mode, RunSession};
use crate::rig::Rig;
use crate::stats::persist::flush_stream;
use crate::stats::store::StatsStore;
use thiserror::Error;

/// Button poll interval in menus and debug views
const IDLE_POLL_US: u64 = 1000;
/// Report interval of the HID polling test (8 kHz)
const POLLING_REPORT_US: u64 = 125;

/// Capability checks that veto a transition
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    #[error("Connect USB to the PC")]
    UsbDisconnected,

    #[error("Mouse not detected")]
    MouseNotDetected,

    #[error("Sensor not stable yet")]
    SensorUnstable,
}

/// The instrument
pub struct Controller {
    rig: Rig,
    config: Config,
    state: State,
    stats: StatsStore,
    session: Option<RunSession>,
    jitter: Jitter,
    menu: Menu,
    startup: Option<StartupReport>,
    notice: Option<String>,
    halt_reason: Option<String>,
    held_ms: u64,
    level: u16,
    presence: u16,
    sensor_window: StabilityWindow,
    circle: CirclePath,
    polling_reports: u64,
    last_view: Option<StatusView>,
}

impl Controller {
    /// Create a controller in [`State::Setup`]
    pub fn new(rig: Rig, config: Config) -> Self {
        let stats = StatsStore::new(rig.logging())
            .with_log_capacity(config.session.max_pending_samples as usize);
        let jitter = Jitter::new(config.session.seed);
        let sensor_window = StabilityWindow::new(
            config.stability.window_ms,
            config.stability.sensor_fluctuation_max,
        );
        Self {
            rig,
            config,
            state: State::Setup,
            stats,
            session: None,
            jitter,
            menu: Menu::default(),
            startup: None,
            notice: None,
            halt_reason: None,
            held_ms: 0,
            level: 0,
            presence: 0,
            sensor_window,
            circle: CirclePath::default(),
            polling_reports: 0,
            last_view: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    pub fn session(&self) -> Option<&RunSession> {
        self.session.as_ref()
    }

    pub fn startup(&self) -> Option<&StartupReport> {
        self.startup.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn menu_cursor(&self) -> usize {
        self.menu.cursor()
    }

    /// One iteration of the control loop
    pub fn tick(&mut self) {
        match self.state {
            State::Setup => self.run_startup(),
            State::Measuring(mode) => self.measure_tick(mode),
            State::HoldAction { .. } => self.hold_tick(),
            State::ErrorHalt => {
                self.rig.led.set(true);
                self.rig.clock.delay_us(IDLE_POLL_US);
            }
            State::Debug(view) => {
                self.debug_tick(view);
                self.poll_operator();
            }
            State::SelectMenu
            | State::SelectRunLimit(_)
            | State::RunsComplete(_)
            | State::SelectDebugMenu => {
                self.poll_operator();
                self.rig.clock.delay_us(IDLE_POLL_US);
            }
        }
        self.render();
    }

    fn run_startup(&mut self) {
        if let Err(e) = self.rig.display.init() {
            tracing::error!(error = %e, "display_init_failed");
            self.halt_reason = Some(e.to_string());
            self.dispatch(Event::DisplayFailed);
            return;
        }
        let report = startup::sample(&mut self.rig, &self.config.stability);
        self.startup = Some(report);

        // Show the pass/fail results before leaving setup
        self.render();
        self.rig
            .clock
            .delay_us(self.config.timing.setup_display_ms * 1000);

        self.dispatch(Event::StartupChecked {
            sensor_ok: report.sensor.passed,
            mouse_ok: report.mouse.passed,
        });
    }

    fn measure_tick(&mut self, mode: Mode) {
        let Some(session) = self.session.as_mut() else {
            tracing::warn!(mode = %mode, "measuring_without_session");
            self.state = State::SelectMenu;
            return;
        };

        let outcome = Cycle {
            bench: self.rig.bench(mode.click_kind(), self.config.hold.start_ms),
            stats: &mut self.stats,
            session,
            jitter: &mut self.jitter,
            config: &self.config,
        }
        .run();

        match outcome {
            CycleOutcome::LimitReached => self.dispatch(Event::RunLimitReached),
            CycleOutcome::HoldAbort => {
                self.held_ms = self.rig.button.current_hold_ms();
                self.dispatch(Event::HoldStarted);
            }
            CycleOutcome::Skipped(reason) => {
                tracing::debug!(mode = %mode, reason = ?reason, "cycle_skipped");
                self.after_cycle();
            }
            CycleOutcome::SyncFailed(_) | CycleOutcome::Synced | CycleOutcome::Recorded { .. } => {
                self.after_cycle();
            }
        }
    }

    fn after_cycle(&mut self) {
        self.level = self.rig.sensor.read();
        self.poll_operator();
    }

    fn hold_tick(&mut self) {
        self.rig.poll_button();
        if self.rig.button.is_pressed() {
            self.held_ms = self.rig.button.current_hold_ms();
            self.rig.clock.delay_us(IDLE_POLL_US);
        } else {
            let held_ms = self.rig.button.previous_hold_ms();
            self.held_ms = held_ms;
            self.dispatch(Event::Released { held_ms });
        }
    }

    /// Sample the button and raise short-press or hold events
    fn poll_operator(&mut self) {
        self.rig.poll_button();
        let start_ms = self.config.hold.start_ms;
        let button = &self.rig.button;

        if button.released_edge() {
            let held_ms = button.previous_hold_ms();
            if held_ms < start_ms {
                self.dispatch(Event::ShortPress);
            } else {
                // The hold start went unseen; resolve it now
                self.dispatch(Event::HoldStarted);
                self.held_ms = held_ms;
                self.dispatch(Event::Released { held_ms });
            }
        } else if button.is_pressed() && button.current_hold_ms() >= start_ms {
            self.held_ms = button.current_hold_ms();
            self.dispatch(Event::HoldStarted);
        }
    }

    fn debug_tick(&mut self, view: DebugView) {
        let now_ms = self.rig.clock.now_ms();
        let blink = blink_on(now_ms, self.config.timing.blink_interval_ms);
        match view {
            DebugView::Mouse => {
                self.presence = self.rig.probe.mouse_presence_level();
                let failed = self.startup.is_some_and(|r| !r.mouse.passed);
                self.rig.led.set(failed && blink);
                self.rig.clock.delay_us(IDLE_POLL_US);
            }
            DebugView::Sensor => {
                self.level = self.rig.sensor.read();
                if let Some(range) = self.sensor_window.observe(now_ms, self.level) {
                    tracing::debug!(
                        range,
                        stable = self.sensor_window.is_stable(),
                        "sensor_window"
                    );
                }
                self.rig.led.set(!self.sensor_window.is_stable() && blink);
                self.rig.clock.delay_us(IDLE_POLL_US);
            }
            DebugView::PollingTest => {
                let (dx, dy) = self.circle.next_delta();
                self.rig.hid.mouse_mut().move_by(dx, dy);
                self.polling_reports += 1;
                self.rig.clock.delay_us(POLLING_REPORT_US);
            }
        }
    }

    /// Run the transition table and perform its action
    fn dispatch(&mut self, event: Event) {
        let from = self.state;
        let transition = transitions::next(from, event, &self.config.hold, self.menu.cursor());
        if transition.to != from {
            self.notice = None;
        }
        self.state = transition.to;
        self.apply(transition.action);

        if self.state != from {
            tracing::info!(from = ?from, to = ?self.state, event = ?event, "state_transition");
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::MoveCursor => {
                let count = menu::option_count(self.state, &self.config);
                self.menu.advance(count);
            }
            Action::ResetCursor => self.menu.reset(),
            Action::StartSession { mode, limit_index } => self.start_session(mode, limit_index),
            Action::EnterDebug(view) => self.enter_debug(view),
            Action::ExitSession(mode) => {
                self.end_session(mode);
                for &stream in mode.streams() {
                    self.stats.reset(stream);
                }
                self.menu.reset();
                tracing::info!(mode = %mode, "session_exited");
            }
            Action::OpenDebugMenu { abandoned } => {
                if let Some(mode) = abandoned {
                    self.end_session(mode);
                }
                self.menu.reset();
            }
            Action::Bypass => {
                self.rig.led.set(false);
                self.menu.reset();
                tracing::warn!("mouse_check_bypassed");
            }
            Action::LeaveSensorDebug => {
                if self.sensor_window.is_stable() {
                    self.rig.led.set(false);
                    self.menu.reset();
                } else {
                    tracing::warn!(range = ?self.sensor_window.last_range(), "sensor_exit_vetoed");
                    self.state = State::Debug(DebugView::Sensor);
                    self.notice = Some(Precondition::SensorUnstable.to_string());
                }
            }
            Action::LeaveDebug => {
                self.rig.led.set(false);
                self.menu.reset();
            }
            Action::Restart => {
                tracing::info!("restart_requested");
                self.rig.restart.restart();
                self.reinitialize();
            }
            Action::FlushLogs => {
                if let Some(mode) = self.session.map(|s| s.mode) {
                    self.flush_logs(mode);
                    tracing::info!(
                        mode = %mode,
                        runs = self.session.map_or(0, |s| s.completed_runs(&self.stats)),
                        "session_complete"
                    );
                }
            }
            Action::Halt => self.rig.led.set(true),
        }
    }

    fn check_preconditions(&mut self, mode: Mode) -> Result<(), Precondition> {
        match mode.click_kind() {
            ClickKind::Hid => {
                if self.rig.probe.usb_connected() {
                    Ok(())
                } else {
                    Err(Precondition::UsbDisconnected)
                }
            }
            ClickKind::Wired => {
                let confirmed_at_startup = self.startup.is_some_and(|r| r.mouse.passed);
                if confirmed_at_startup
                    || self.rig.probe.mouse_presence_level()
                        >= self.config.stability.mouse_presence_min
                {
                    Ok(())
                } else {
                    Err(Precondition::MouseNotDetected)
                }
            }
        }
    }

    fn start_session(&mut self, mode: Mode, limit_index: usize) {
        if let Err(veto) = self.check_preconditions(mode) {
            tracing::warn!(mode = %mode, reason = %veto, "session_vetoed");
            self.state = State::SelectMenu;
            self.menu.reset();
            self.notice = Some(veto.to_string());
            return;
        }

        let limits = &self.config.session.run_limits;
        let max_runs = if limits.is_empty() {
            0
        } else {
            limits[limit_index % limits.len()]
        };

        for &stream in mode.streams() {
            self.stats.reset(stream);
        }
        if let Some(sink) = self.rig.sink.as_mut() {
            sink.new_session();
        }
        self.session = Some(RunSession::new(mode, max_runs));
        self.level = self.rig.sensor.read();
        tracing::info!(mode = %mode, max_runs, "session_started");
    }

    /// Flush pending samples and drop the session
    fn end_session(&mut self, mode: Mode) {
        self.flush_logs(mode);
        self.session = None;
    }

    fn flush_logs(&mut self, mode: Mode) {
        let Some(sink) = self.rig.sink.as_deref_mut() else {
            return;
        };
        for &stream in mode.streams() {
            match flush_stream(&mut self.stats, stream, sink) {
                Ok(0) => {}
                Ok(count) => tracing::debug!(stream = %stream, count, "logs_flushed"),
                Err(e) => tracing::warn!(stream = %stream, error = %e, "flush_failed"),
            }
        }
    }

    fn enter_debug(&mut self, view: DebugView) {
        if view == DebugView::PollingTest && !self.rig.probe.usb_connected() {
            tracing::warn!("polling_test_vetoed");
            self.state = State::SelectDebugMenu;
            self.notice = Some(Precondition::UsbDisconnected.to_string());
            return;
        }
        self.sensor_window.reset();
        self.circle = CirclePath::default();
        self.polling_reports = 0;
    }

    /// Power-on state after a restart that returned
    fn reinitialize(&mut self) {
        self.state = State::Setup;
        self.stats = StatsStore::new(self.rig.logging())
            .with_log_capacity(self.config.session.max_pending_samples as usize);
        self.session = None;
        self.jitter = Jitter::new(self.config.session.seed);
        self.menu.reset();
        self.startup = None;
        self.notice = None;
        self.halt_reason = None;
        self.held_ms = 0;
        self.sensor_window.reset();
        self.circle = CirclePath::default();
        self.polling_reports = 0;
        self.last_view = None;
        self.rig.led.set(false);
    }

    fn summaries(&self, mode: Mode) -> Vec<StreamSummary> {
        mode.streams()
            .iter()
            .map(|&stream| StreamSummary {
                stream,
                stats: *self.stats.stats(stream),
            })
            .collect()
    }

    /// Snapshot for the display
    pub fn view(&self) -> StatusView {
        let page = match self.state {
            State::Setup => Page::Setup {
                report: self.startup,
            },
            State::SelectMenu | State::SelectRunLimit(_) | State::SelectDebugMenu => {
                menu::page(self.state, &self.config, &self.menu).unwrap_or(Page::Menu {
                    title: "",
                    options: Vec::new(),
                    cursor: 0,
                })
            }
            State::Measuring(mode) => {
                let session = self.session.unwrap_or_else(|| RunSession::new(mode, 0));
                Page::Measuring {
                    mode,
                    streams: self.summaries(mode),
                    completed_runs: session.completed_runs(&self.stats),
                    max_runs: session.max_runs,
                    syncing: mode.is_aperture() && session.is_first_run,
                    level: self.level,
                }
            }
            State::RunsComplete(mode) => Page::RunsComplete {
                mode,
                streams: self.summaries(mode),
            },
            State::HoldAction { from } => Page::Hold {
                from,
                held_ms: self.held_ms,
                pending: classify_hold(self.held_ms, &self.config.hold),
            },
            State::Debug(DebugView::Mouse) => Page::DebugMouse {
                level: self.presence,
                detected: self.presence >= self.config.stability.mouse_presence_min,
                startup_failed: self.startup.is_some_and(|r| !r.mouse.passed),
            },
            State::Debug(DebugView::Sensor) => Page::DebugSensor {
                level: self.level,
                last_range: self.sensor_window.last_range(),
                stable: self.sensor_window.is_stable(),
            },
            State::Debug(DebugView::PollingTest) => Page::PollingTest {
                reports: self.polling_reports,
            },
            State::ErrorHalt => Page::Error {
                message: self
                    .halt_reason
                    .clone()
                    .unwrap_or_else(|| "Halted".to_string()),
            },
        };
        StatusView {
            page,
            notice: self.notice.clone(),
        }
    }

    /// Render when the snapshot changed
    fn render(&mut self) {
        let view = self.view();
        if self.last_view.as_ref() != Some(&view) {
            self.rig.display.render(&view);
            self.last_view = Some(view);
        }
    }
}
