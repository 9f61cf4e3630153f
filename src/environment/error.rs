use std::path::PathBuf;

use crate::fsutil::FileOpenError;

/// Errors that may occur while validating the runtime environment.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("this program requires Linux, running on `{os}`")]
    UnsupportedOs { os: &'static str },
    #[error("smaps_rollup is not available, Linux 4.14 or later is required: {0}")]
    RollupUnavailable(#[source] FileOpenError),
    #[error("failed to check if path `{path}` exists: {source}")]
    ExistenceCheck {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("output directory `{path}` does not exist")]
    OutputDirMissing { path: PathBuf },
    #[error("cannot write to output directory `{path}`: {source}")]
    OutputDirNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if the check failed for lack of permissions.
    pub fn is_permission_denied(&self) -> bool {
        let source = match self {
            Error::RollupUnavailable(err) => &err.source,
            Error::ExistenceCheck { source, .. } | Error::OutputDirNotWritable { source, .. } => {
                source
            }
            Error::UnsupportedOs { .. } | Error::OutputDirMissing { .. } => return false,
        };
        source.kind() == std::io::ErrorKind::PermissionDenied
    }
}

pub type Result<T> = std::result::Result<T, Error>;
