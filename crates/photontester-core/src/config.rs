//! Persistent instrument configuration
//!
//! Every threshold the engine compares against lives here rather than in
//! constants: sensor thresholds and stability limits depend on the sensor,
//! its ADC setup, and the panel under test.
//!
//! Stored as JSON at `<config_dir>/photontester/config.json`. Missing fields
//! fall back to their defaults, so partial files are valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Hold thresholds must increase: {start} < {select} < {debug} < {reset}")]
    InvalidHoldOrder {
        start: u64,
        select: u64,
        debug: u64,
        reset: u64,
    },

    #[error("Dark threshold {low} must be below light threshold {high}")]
    InvalidLightThresholds { low: u16, high: u16 },

    #[error("At least one run limit option is required")]
    NoRunLimits,
}

/// Light/dark classification thresholds on raw sensor levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightThresholds {
    /// At or above: screen is light
    pub high: u16,
    /// At or below: screen is dark
    pub low: u16,
}

impl Default for LightThresholds {
    fn default() -> Self {
        Self { high: 120, low: 40 }
    }
}

/// Button hold durations, resolved highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldThresholds {
    /// Hold long enough to enter the hold-action state
    pub start_ms: u64,
    pub select_ms: u64,
    pub debug_ms: u64,
    pub reset_ms: u64,
}

impl Default for HoldThresholds {
    fn default() -> Self {
        Self {
            start_ms: 250,
            select_ms: 800,
            debug_ms: 1300,
            reset_ms: 1800,
        }
    }
}

impl HoldThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_ms < self.select_ms
            && self.select_ms < self.debug_ms
            && self.debug_ms < self.reset_ms
        {
            Ok(())
        } else {
            Err(ConfigError::InvalidHoldOrder {
                start: self.start_ms,
                select: self.select_ms,
                debug: self.debug_ms,
                reset: self.reset_ms,
            })
        }
    }
}

/// Timeouts, settle delays, and pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Measurement budget in plain automatic mode
    pub measure_timeout_us: u64,
    /// Measurement budget for each aperture edge
    pub aperture_timeout_us: u64,
    /// Budget for the unmeasured return to the opposite level
    pub resync_timeout_us: u64,
    /// Wait after the sync focus click
    pub focus_settle_ms: u64,
    /// Budget for the screen to reach dark after the sync toggle
    pub verify_timeout_ms: u64,
    /// Wired click pulse width
    pub gpio_hold_us: u64,
    /// Allowance for host-paced HID delivery
    pub hid_settle_us: u64,
    pub inter_run_delay_ms: u64,
    /// Inter-run delay varies uniformly by up to this much either way
    pub jitter_ms: u64,
    pub blink_interval_ms: u64,
    /// How long the startup check results stay on screen
    pub setup_display_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            measure_timeout_us: 5_000_000,
            aperture_timeout_us: 1_000_000,
            resync_timeout_us: 1_000_000,
            focus_settle_ms: 300,
            verify_timeout_ms: 3000,
            gpio_hold_us: 100,
            hid_settle_us: 2000,
            inter_run_delay_ms: 100,
            jitter_ms: 20,
            blink_interval_ms: 250,
            setup_display_ms: 1500,
        }
    }
}

/// Startup stability sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stability {
    pub window_ms: u64,
    /// Largest max-min spread for a stable light sensor
    pub sensor_fluctuation_max: u16,
    /// Largest max-min spread for a stable mouse-presence line
    pub mouse_fluctuation_max: u16,
    /// Lowest presence level that counts as a connected mouse
    pub mouse_presence_min: u16,
}

impl Default for Stability {
    fn default() -> Self {
        Self {
            window_ms: 500,
            sensor_fluctuation_max: 20,
            mouse_fluctuation_max: 30,
            mouse_presence_min: 155,
        }
    }
}

/// Session options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Run limit menu entries; 0 means unlimited
    pub run_limits: Vec<u32>,
    /// Flush the sample log every N samples during unlimited sessions
    pub flush_every_runs: u32,
    /// Unflushed samples kept per stream; the oldest are dropped beyond this
    pub max_pending_samples: u32,
    /// Jitter seed
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            run_limits: vec![10, 25, 50, 100, 0],
            flush_every_runs: 100,
            max_pending_samples: 1000,
            seed: 0x5EED_1A7E,
        }
    }
}

/// Complete instrument configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub light: LightThresholds,
    pub hold: HoldThresholds,
    pub timing: Timing,
    pub stability: Stability,
    pub session: SessionConfig,
}

impl Config {
    /// Config file path: `<config_dir>/photontester/config.json`
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photontester")
            .join("config.json")
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hold.validate()?;
        if self.light.low >= self.light.high {
            return Err(ConfigError::InvalidLightThresholds {
                low: self.light.low,
                high: self.light.high,
            });
        }
        if self.session.run_limits.is_empty() {
            return Err(ConfigError::NoRunLimits);
        }
        Ok(())
    }

    /// Load config from disk, falling back to defaults on any error
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Config>(&contents) {
                Ok(config) => match config.validate() {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), "Loaded config from disk");
                        config
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Invalid config, using defaults"
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to parse config, using defaults"
                    );
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Config saved to disk");
        Ok(())
    }
}
