//! Photontester - Click-to-photon display latency instrument
//!
//! Drives the full instrument (startup checks, menus, measurement session)
//! against the simulated rig, printing the status display to the console.

use anyhow::{bail, Result};
use photontester::cli::{self, Command, RunOptions};
use photontester::sim::{script, ScreenModel, SimHandle};
use photontester::ui::ConsoleDisplay;
use photontester::{Config, Controller, CsvLogSink, Mode, State};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Virtual time allowed for startup checks to reach the menu
const BOOT_TIMEOUT_MS: u64 = 10_000;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("photontester=info".parse()?)
                .add_directive("photontester_core=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match cli::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            return Ok(());
        }
    };

    match command {
        Command::Help => print_help(),
        Command::Version => {
            println!("photontester {} ({})", photontester::VERSION, photontester::BUILD_DATE)
        }
        Command::PrintConfig(path) => {
            let config = Config::load(&path.unwrap_or_else(Config::path));
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Run(options) => run_simulated(&options)?,
    }

    Ok(())
}

fn print_help() {
    println!("Usage: photontester [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -m, --mode MODE         auto, auto-aperture or direct-aperture (default: auto)");
    println!("  -n, --runs N            Run limit, 0 for unlimited (default: 10)");
    println!("      --latency-us US     Simulated flash latency for auto mode (default: 16700)");
    println!("      --rise-us US        Simulated dark-to-light latency (default: 14000)");
    println!("      --fall-us US        Simulated light-to-dark latency (default: 19000)");
    println!("      --seed N            Inter-run jitter seed");
    println!("  -c, --config PATH       Config file (default: {})", Config::path().display());
    println!("  -o, --log-dir DIR       Write per-stream CSV sample logs to DIR");
    println!("      --print-config      Print the effective config as JSON");
    println!("  -v, --version           Show version");
    println!("  -h, --help              Show this help");
    println!();
    println!("Examples:");
    println!("  photontester --mode auto --runs 25 --latency-us 12000");
    println!("  photontester -m direct-aperture -n 0 -o ./logs");
}

fn screen_model(options: &RunOptions) -> ScreenModel {
    match options.mode {
        Mode::Automatic => ScreenModel::Flash {
            latency_us: options.latency_us,
            duration_us: 50_000,
        },
        Mode::AutoAperture | Mode::DirectAperture => ScreenModel::Toggle {
            rise_latency_us: options.rise_us,
            fall_latency_us: options.fall_us,
        },
    }
}

fn run_simulated(options: &RunOptions) -> Result<()> {
    let config_path = options.config_path.clone().unwrap_or_else(Config::path);
    let mut config = Config::load(&config_path);
    config.session.run_limits = vec![options.runs];
    if let Some(seed) = options.seed {
        config.session.seed = seed;
    }

    let sim = SimHandle::new(screen_model(options));
    sim.with(|w| w.attach_sink = false);

    let mut rig = sim.rig(&config);
    rig.display = Box::new(ConsoleDisplay::new());
    if let Some(dir) = &options.log_dir {
        info!(dir = %dir.display(), "Logging samples to CSV");
        rig.sink = Some(Box::new(CsvLogSink::new(dir.clone())));
    }

    println!("Photontester v{} - {} on the simulated rig", photontester::VERSION, options.mode);
    println!("────────────────────────────────────────");

    let mut controller = Controller::new(rig, config);

    let booted = script::run_until(&mut controller, &sim, BOOT_TIMEOUT_MS, |c| {
        matches!(c.state(), State::SelectMenu | State::ErrorHalt)
    });
    if !booted || controller.state() != State::SelectMenu {
        bail!("Startup did not reach the menu (state {:?})", controller.state());
    }

    script::start_session(&mut controller, &sim, options.mode, 0);
    if controller.state() != State::Measuring(options.mode) {
        bail!(
            "Session did not start: {}",
            controller.notice().unwrap_or("unexpected state")
        );
    }

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .ok();

    while running.load(Ordering::SeqCst) {
        if controller.state() == State::RunsComplete(options.mode) {
            break;
        }
        controller.tick();
    }

    // Streams reset when the session is exited, so read them first
    let summaries: Vec<_> = options
        .mode
        .streams()
        .iter()
        .map(|&stream| (stream, *controller.stats().stats(stream)))
        .collect();

    if !running.load(Ordering::SeqCst) {
        println!();
        println!("Stopping...");
        script::select(&mut controller, &sim);
        if controller.state() != State::SelectMenu {
            warn!(state = ?controller.state(), "Session exit was not accepted");
        }
    }

    println!();
    println!("Results ({} ms virtual time):", sim.now_ms());
    for (stream, stats) in summaries {
        if stats.has_samples() {
            println!(
                "  {:<20} runs {:>4} | last {:>7.3} | avg {:>7.3} | min {:>7.3} | max {:>7.3} ms",
                stream.slug(),
                stats.run_count,
                stats.last_latency,
                stats.avg_latency,
                stats.min_latency,
                stats.max_latency
            );
        } else {
            println!("  {:<20} no samples", stream.slug());
        }
    }
    println!("Done.");

    Ok(())
}
