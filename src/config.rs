//! Command line parsing and the run configuration derived from it.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::sampling;

/// Frequencies above this are accepted but logged as a warning.
pub const HIGH_FREQUENCY_HZ: f64 = 100.0;

/// Sample the memory usage of a command through /proc/<pid>/smaps_rollup.
///
/// The command runs through `/bin/sh -c` in its own process group. When it
/// exits (or on SIGINT/SIGTERM) per-metric statistics are written as CSV or JSON.
#[derive(Parser, Debug, Clone)]
#[command(name = "memrollup-stats", version, about, long_about = None, after_help = AFTER_HELP)]
pub struct Cli {
    /// Sampling frequency in Hz
    #[arg(
        short = 'F',
        long,
        default_value = "1.0",
        value_parser = parse_frequency,
        allow_negative_numbers = true
    )]
    pub frequency: f64,

    /// Write the report to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Emit JSON instead of CSV
    #[arg(short, long)]
    pub json: bool,

    /// Log monitoring progress
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to run and monitor
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

const AFTER_HELP: &str = "\
Examples:
  memrollup-stats -F 10 ./my_program
  memrollup-stats -F 2 -o stats.csv ./my_program
  memrollup-stats -F 1 -j -o stats.json ./my_program

Exit codes:
  0  Success
  1  General error
  2  Invalid arguments
  3  Process start failure
  4  Permission denied
  5  System resource unavailable";

fn parse_frequency(raw: &str) -> Result<f64, String> {
    let frequency: f64 = raw
        .trim()
        .parse()
        .map_err(|err| format!("`{raw}` is not a number: {err}"))?;
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(format!("frequency must be a positive number, got `{raw}`"));
    }
    Ok(frequency)
}

/// Settings of one monitoring run. Built once and passed to every component.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    /// Sampling frequency in Hz, always finite and positive.
    pub frequency: f64,
    /// Shell command line to monitor.
    pub command: String,
    pub verbose: bool,
    pub output: Option<PathBuf>,
    pub json: bool,
}

impl RunConfiguration {
    /// Time between two samples.
    pub fn period(&self) -> Duration {
        sampling::period_for(self.frequency)
    }

    pub fn is_high_frequency(&self) -> bool {
        self.frequency > HIGH_FREQUENCY_HZ
    }
}

impl From<Cli> for RunConfiguration {
    fn from(cli: Cli) -> Self {
        Self {
            frequency: cli.frequency,
            command: cli.command.join(" "),
            verbose: cli.verbose,
            output: cli.output,
            json: cli.json,
        }
    }
}
