use std::path::Path;

use super::Result;
use super::checks::{check_os, check_output_dir, check_rollup_available};

/// Validates that monitoring can run and the report can be written.
///
/// Checks, in order:
///
/// 1. The operating system is Linux.
/// 2. `<proc_root>/self/smaps_rollup` can be opened (kernel 4.14+).
/// 3. If `output` is given, its directory exists and is writable.
///
/// # Errors
///
/// Returns the first failed check. Nothing is started before this succeeds.
pub fn validate_environment(proc_root: impl AsRef<Path>, output: Option<&Path>) -> Result<()> {
    check_os()?;
    check_rollup_available(proc_root.as_ref())?;
    log::debug!(
        "Found smaps_rollup under `{}`",
        proc_root.as_ref().display()
    );

    if let Some(output) = output {
        let dir = check_output_dir(output)?;
        log::debug!("Output directory `{}` is writable", dir.display());
    }

    Ok(())
}
