//! Console display
//!
//! Renders each [`StatusView`] as one line on stdout, skipping repeats.

use photontester_core::hal::{Display, DisplayError};
use photontester_core::machine::view::{Page, StreamSummary};
use photontester_core::machine::HoldOrigin;
use photontester_core::stats::store::LatencyStats;
use photontester_core::StatusView;

/// Line-per-view console renderer
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    last_line: String,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for ConsoleDisplay {
    fn init(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }

    fn render(&mut self, view: &StatusView) {
        let line = format_view(view);
        // Only print if changed (reduce spam)
        if line != self.last_line {
            println!("{}", line);
            self.last_line = line;
        }
    }
}

fn format_stats(stats: &LatencyStats) -> String {
    if !stats.has_samples() {
        return "--".to_string();
    }
    format!(
        "last {:.2} avg {:.2} min {:.2} max {:.2} ms",
        stats.last_latency, stats.avg_latency, stats.min_latency, stats.max_latency
    )
}

fn format_streams(streams: &[StreamSummary]) -> String {
    streams
        .iter()
        .map(|s| format!("{} n={} {}", s.stream.label(), s.stats.run_count, format_stats(&s.stats)))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn origin_label(from: HoldOrigin) -> String {
    match from {
        HoldOrigin::SelectMenu => "menu".to_string(),
        HoldOrigin::SelectRunLimit(mode) => format!("{} run limit", mode),
        HoldOrigin::Measuring(mode) => format!("{} running", mode),
        HoldOrigin::RunsComplete(mode) => format!("{} complete", mode),
        HoldOrigin::SelectDebugMenu => "debug menu".to_string(),
        HoldOrigin::Debug(view) => format!("{} debug", view.label()),
    }
}

/// One-line rendering of a view
pub fn format_view(view: &StatusView) -> String {
    let body = match &view.page {
        Page::Setup { report: None } => "Setup: sampling sensor and mouse".to_string(),
        Page::Setup {
            report: Some(report),
        } => format!(
            "Setup: sensor {}..{} {} | mouse {}..{} {}",
            report.sensor.min,
            report.sensor.max,
            if report.sensor.passed { "OK" } else { "FAIL" },
            report.mouse.min,
            report.mouse.max,
            if report.mouse.passed { "OK" } else { "FAIL" },
        ),
        Page::Menu {
            title,
            options,
            cursor,
        } => {
            let items: Vec<String> = options
                .iter()
                .enumerate()
                .map(|(i, o)| {
                    if i == *cursor {
                        format!("[{}]", o)
                    } else {
                        o.clone()
                    }
                })
                .collect();
            format!("{}: {}", title, items.join("  "))
        }
        Page::Measuring {
            mode,
            streams,
            completed_runs,
            max_runs,
            syncing,
            level,
        } => {
            let limit = if *max_runs == 0 {
                "unlimited".to_string()
            } else {
                max_runs.to_string()
            };
            if *syncing {
                format!("{} | syncing | level {}", mode, level)
            } else {
                format!(
                    "{} | run {}/{} | {}",
                    mode,
                    completed_runs,
                    limit,
                    format_streams(streams)
                )
            }
        }
        Page::RunsComplete { mode, streams } => {
            format!("{} complete | {}", mode, format_streams(streams))
        }
        Page::Hold {
            from,
            held_ms,
            pending,
        } => format!(
            "Hold {}ms from {} | {}",
            held_ms,
            origin_label(*from),
            pending.label()
        ),
        Page::DebugMouse {
            level,
            detected,
            startup_failed,
        } => format!(
            "Mouse debug: level {} {}{}",
            level,
            if *detected { "detected" } else { "not detected" },
            if *startup_failed {
                " | hold to bypass"
            } else {
                ""
            }
        ),
        Page::DebugSensor {
            level,
            last_range,
            stable,
        } => format!(
            "Sensor debug: level {} range {} {}",
            level,
            last_range.map_or("--".to_string(), |r| r.to_string()),
            if *stable { "stable" } else { "unstable" }
        ),
        Page::PollingTest { reports } => format!("Polling test: {} reports", reports),
        Page::Error { message } => format!("ERROR: {}", message),
    };

    match &view.notice {
        Some(notice) => format!("{} ({})", body, notice),
        None => body,
    }
}
