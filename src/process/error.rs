use std::path::PathBuf;

/// Errors raised while supervising the monitored child process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to start `{shell} -c {command}`: {source}")]
    Spawn {
        shell: PathBuf,
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("spawned child for `{command}` has no pid")]
    MissingPid { command: String },
    #[error("child process was already started (pid {pid})")]
    AlreadyStarted { pid: u32 },
    #[error("no child process was started")]
    NotStarted,
    #[error("lost track of child process {pid} before it exited")]
    ReaperGone { pid: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
