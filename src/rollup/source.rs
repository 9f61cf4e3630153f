use std::io;
use std::path::PathBuf;
use std::time::Instant;

use nix::errno::Errno;

use super::{KeyValueStat, RollupStat};
use crate::fsutil;
use crate::series::MemorySample;

/// `smaps_rollup` is well below a page; one page is enough to read it in a single call.
const ROLLUP_READ_CAPACITY: usize = 4096;

/// Errors returned by a [`SampleSource`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The memory rollup of the process is gone, i.e. the process has exited.
    #[error("memory rollup for pid {pid} is no longer available")]
    Exhausted { pid: u32 },
    /// The memory rollup exists but could not be read or parsed.
    #[error("failed to read memory rollup `{path}`: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The collection task did not run to completion.
    #[error("sample collection for pid {pid} was aborted: {reason}")]
    Aborted { pid: u32, reason: String },
}

impl SourceError {
    /// Returns `true` if the process is gone, which ends monitoring normally.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, SourceError::Exhausted { .. })
    }
}

/// Produces one memory snapshot for a process.
///
/// Implementations are called from a blocking thread, one call at a time, and
/// must not keep state between calls.
pub trait SampleSource: Send + Sync + 'static {
    /// Captures the current memory usage of `pid`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Exhausted`] if the process no longer exists and
    /// [`SourceError::Unreadable`] for any other read failure.
    fn collect(&self, pid: u32) -> Result<MemorySample, SourceError>;
}

/// Reads `<proc_root>/<pid>/smaps_rollup`.
#[derive(Debug, Clone)]
pub struct ProcRollupSource {
    proc_root: PathBuf,
}

impl Default for ProcRollupSource {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcRollupSource {
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    fn rollup_path(&self, pid: u32) -> PathBuf {
        self.proc_root.join(pid.to_string()).join("smaps_rollup")
    }
}

impl SampleSource for ProcRollupSource {
    fn collect(&self, pid: u32) -> Result<MemorySample, SourceError> {
        let path = self.rollup_path(pid);
        let content = match fsutil::read_snapshot(&path, ROLLUP_READ_CAPACITY) {
            Ok(content) => content,
            Err(err) if is_process_gone(err.io_error()) => {
                log::debug!("rollup `{}` vanished: {}", err.path().display(), err);
                return Err(SourceError::Exhausted { pid });
            }
            Err(err) => {
                let (path, source) = err.into_parts();
                return Err(SourceError::Unreadable { path, source });
            }
        };
        let timestamp = Instant::now();
        if !has_counter_lines(&content) {
            return Err(SourceError::Exhausted { pid });
        }

        let stat = RollupStat::from_reader(&mut content.as_bytes())
            .map_err(|source| SourceError::Unreadable { path, source })?;

        Ok(MemorySample::new(timestamp, stat))
    }
}

/// The kernel renders a rollup without any `Key:` line once the address space
/// of the process is gone (e.g. a zombie that has not been reaped yet).
fn has_counter_lines(content: &str) -> bool {
    content.lines().any(|line| {
        line.split_whitespace()
            .next()
            .is_some_and(|token| token.len() > 1 && token.ends_with(':'))
    })
}

fn is_process_gone(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound || err.raw_os_error() == Some(Errno::ESRCH as i32)
}
