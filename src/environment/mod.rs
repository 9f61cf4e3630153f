//! Platform checks run once before the child process is started.
mod checks;
mod error;
mod validate;

pub use checks::{WRITE_PROBE_NAME, check_os, check_output_dir, check_rollup_available};
pub use error::{Error, Result};
pub use validate::validate_environment;
