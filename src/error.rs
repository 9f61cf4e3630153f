use crate::environment;
use crate::process;
use crate::report;
use crate::rollup::SourceError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL: u8 = 1;
    pub const INVALID_ARGUMENTS: u8 = 2;
    pub const START_FAILURE: u8 = 3;
    pub const PERMISSION_DENIED: u8 = 4;
    pub const RESOURCE_UNAVAILABLE: u8 = 5;
}

/// Errors that end a monitoring run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("environment validation failed: {0}")]
    Environment(#[from] environment::Error),
    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
    #[error(transparent)]
    Start(process::Error),
    #[error("memory monitoring failed: {0}")]
    Monitoring(#[from] SourceError),
    #[error("failed to write results: {0}")]
    Output(#[from] report::Error),
}

impl Error {
    /// Exit code reported for this error, see [`exit_code`].
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Environment(err) if err.is_permission_denied() => exit_code::PERMISSION_DENIED,
            Error::Environment(environment::Error::OutputDirMissing { .. }) => {
                exit_code::INVALID_ARGUMENTS
            }
            Error::Environment(environment::Error::OutputDirNotWritable { .. }) => {
                exit_code::PERMISSION_DENIED
            }
            Error::Environment(_) | Error::Signal(_) => exit_code::RESOURCE_UNAVAILABLE,
            Error::Start(process::Error::Spawn { source, .. })
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                exit_code::PERMISSION_DENIED
            }
            Error::Start(_) => exit_code::START_FAILURE,
            Error::Monitoring(SourceError::Unreadable { source, .. })
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                exit_code::PERMISSION_DENIED
            }
            Error::Output(err)
                if err
                    .io_error()
                    .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied) =>
            {
                exit_code::PERMISSION_DENIED
            }
            Error::Monitoring(_) | Error::Output(_) => exit_code::GENERAL,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait ResultOkLogExt<T, E> {
    /// Logs the error at `error` level and discards it.
    fn ok_log(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self) -> Option<T> {
        self.inspect_err(|err| log::error!("{err}")).ok()
    }
}
