use std::process::ExitCode;

use clap::Parser;
use memrollup_stats::config::{Cli, RunConfiguration};
use memrollup_stats::error::exit_code;

/// Entry point of `memrollup-stats`.
///
/// Logs go to stderr at `warn` level, or `info` with `--verbose`. `RUST_LOG`
/// overrides both. Usage errors exit with code 2 (handled by clap).
///
/// # Examples
///
/// ```bash
/// memrollup-stats -F 10 -j -o stats.json ./my_program --its-flag
/// ```
#[tokio::main]
async fn main() -> ExitCode {
    let config = RunConfiguration::from(Cli::parse());

    env_logger::Builder::new()
        .filter_level(if config.verbose {
            log::LevelFilter::Info
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    match memrollup_stats::run(&config).await {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
