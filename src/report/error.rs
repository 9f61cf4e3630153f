use std::path::PathBuf;

/// Errors raised while rendering or writing a report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to encode report as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to create output file `{path}`: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write report to {target}: {source}")]
    Write {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The underlying I/O error, if any.
    pub fn io_error(&self) -> Option<&std::io::Error> {
        match self {
            Error::Json(_) => None,
            Error::CreateFile { source, .. } | Error::Write { source, .. } => Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
