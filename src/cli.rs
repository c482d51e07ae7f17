//! Command line options
//!
//! Hand-parsed flags; every value flag takes the next argument.

use photontester_core::Mode;
use std::path::PathBuf;
use thiserror::Error;

/// Argument errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("Invalid value for {flag}: {value}")]
    InvalidValue { flag: String, value: String },

    #[error("Unknown mode: {0} (expected auto, auto-aperture, direct-aperture)")]
    UnknownMode(String),

    #[error("Unknown argument: {0}")]
    UnknownArgument(String),
}

/// Options for a simulated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: Mode,
    /// Run limit; 0 runs until Ctrl+C
    pub runs: u32,
    /// Flash latency for automatic mode
    pub latency_us: u64,
    /// Toggle latencies for aperture modes
    pub rise_us: u64,
    pub fall_us: u64,
    pub config_path: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Automatic,
            runs: 10,
            latency_us: 16_700,
            rise_us: 14_000,
            fall_us: 19_000,
            config_path: None,
            log_dir: None,
            seed: None,
        }
    }
}

/// What the binary should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunOptions),
    PrintConfig(Option<PathBuf>),
    Help,
    Version,
}

/// Parse a mode name
pub fn parse_mode(name: &str) -> Result<Mode, CliError> {
    match name.to_ascii_lowercase().as_str() {
        "auto" | "automatic" => Ok(Mode::Automatic),
        "auto-aperture" | "aperture" => Ok(Mode::AutoAperture),
        "direct-aperture" | "direct" | "hid" => Ok(Mode::DirectAperture),
        _ => Err(CliError::UnknownMode(name.to_string())),
    }
}

fn value<'a>(args: &'a [String], i: usize) -> Result<&'a str, CliError> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| CliError::MissingValue(args[i].clone()))
}

fn number<T: std::str::FromStr>(args: &[String], i: usize) -> Result<T, CliError> {
    let raw = value(args, i)?;
    raw.parse().map_err(|_| CliError::InvalidValue {
        flag: args[i].clone(),
        value: raw.to_string(),
    })
}

/// Parse arguments, excluding the program name
pub fn parse(args: &[String]) -> Result<Command, CliError> {
    let mut options = RunOptions::default();
    let mut print_config = false;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-v" => return Ok(Command::Version),
            "--print-config" => {
                print_config = true;
                i += 1;
                continue;
            }
            "--mode" | "-m" => options.mode = parse_mode(value(args, i)?)?,
            "--runs" | "-n" => options.runs = number(args, i)?,
            "--latency-us" => options.latency_us = number(args, i)?,
            "--rise-us" => options.rise_us = number(args, i)?,
            "--fall-us" => options.fall_us = number(args, i)?,
            "--seed" => options.seed = Some(number(args, i)?),
            "--config" | "-c" => options.config_path = Some(PathBuf::from(value(args, i)?)),
            "--log-dir" | "-o" => options.log_dir = Some(PathBuf::from(value(args, i)?)),
            other => return Err(CliError::UnknownArgument(other.to_string())),
        }
        i += 2;
    }

    if print_config {
        Ok(Command::PrintConfig(options.config_path))
    } else {
        Ok(Command::Run(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(parse(&[]).unwrap(), Command::Run(RunOptions::default()));
    }

    #[test]
    fn test_full_run_options() {
        let cmd = parse(&args(&[
            "--mode",
            "direct-aperture",
            "--runs",
            "0",
            "--rise-us",
            "8000",
            "--fall-us",
            "9000",
            "--seed",
            "7",
            "--log-dir",
            "logs",
        ]))
        .unwrap();

        let Command::Run(opts) = cmd else {
            panic!("Expected run command");
        };
        assert_eq!(opts.mode, Mode::DirectAperture);
        assert_eq!(opts.runs, 0);
        assert_eq!(opts.rise_us, 8000);
        assert_eq!(opts.fall_us, 9000);
        assert_eq!(opts.seed, Some(7));
        assert_eq!(opts.log_dir, Some(PathBuf::from("logs")));
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(
            parse(&args(&["--runs"])),
            Err(CliError::MissingValue("--runs".into()))
        );
    }

    #[test]
    fn test_invalid_number() {
        assert!(matches!(
            parse(&args(&["--latency-us", "fast"])),
            Err(CliError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(parse_mode("AUTO").unwrap(), Mode::Automatic);
        assert_eq!(parse_mode("auto-aperture").unwrap(), Mode::AutoAperture);
        assert_eq!(parse_mode("hid").unwrap(), Mode::DirectAperture);
        assert!(parse_mode("manual").is_err());
    }

    #[test]
    fn test_help_and_version_win() {
        assert_eq!(parse(&args(&["--runs", "3", "-h"])).unwrap(), Command::Help);
        assert_eq!(parse(&args(&["--version"])).unwrap(), Command::Version);
    }

    #[test]
    fn test_print_config_keeps_path() {
        assert_eq!(
            parse(&args(&["--print-config", "--config", "x.json"])).unwrap(),
            Command::PrintConfig(Some(PathBuf::from("x.json")))
        );
    }

    #[test]
    fn test_unknown_argument() {
        assert!(matches!(
            parse(&args(&["--frobnicate"])),
            Err(CliError::UnknownArgument(_))
        ));
    }
}
