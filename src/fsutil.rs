use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Error that occurs when opening or reading a file fails.
#[derive(Debug, thiserror::Error)]
pub enum FileReadError {
    #[error(transparent)]
    Open(#[from] FileOpenError),
    #[error("failed to read file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileReadError {
    /// Returns the path of the file that could not be read.
    pub fn path(&self) -> &Path {
        match self {
            FileReadError::Open(err) => &err.path,
            FileReadError::Read { path, .. } => path,
        }
    }

    /// Returns the underlying I/O error.
    pub fn io_error(&self) -> &io::Error {
        match self {
            FileReadError::Open(err) => &err.source,
            FileReadError::Read { source, .. } => source,
        }
    }

    /// Consumes the error, returning the path and the underlying I/O error.
    pub fn into_parts(self) -> (PathBuf, io::Error) {
        match self {
            FileReadError::Open(err) => (err.path, err.source),
            FileReadError::Read { path, source } => (path, source),
        }
    }
}

/// Opens `path` for buffered reading.
///
/// # Errors
///
/// Returns a [`FileOpenError`] carrying `path` if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use memrollup_stats::fsutil;
/// let reader = fsutil::open_file_reader("/proc/self/smaps_rollup")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    open_with_capacity(path.as_ref(), DEFAULT_BUF_CAPACITY)
}

const DEFAULT_BUF_CAPACITY: usize = 8 * 1024;

fn open_with_capacity(path: &Path, capacity: usize) -> Result<BufReader<File>, FileOpenError> {
    File::open(path)
        .map(|file| BufReader::with_capacity(capacity, file))
        .map_err(|source| FileOpenError {
            path: path.to_owned(),
            source,
        })
}

/// Reads the whole file into memory through a buffer of at least `capacity` bytes.
///
/// procfs files that are rendered in one pass by the kernel (such as
/// `smaps_rollup`) are returned in full by the first `read(2)` when the buffer
/// is large enough, so the returned content is a single consistent snapshot.
///
/// # Errors
///
/// Returns [`FileReadError::Open`] if the file cannot be opened and
/// [`FileReadError::Read`] if reading from it fails.
pub fn read_snapshot(path: impl AsRef<Path>, capacity: usize) -> Result<String, FileReadError> {
    let path = path.as_ref();
    let mut reader = open_with_capacity(path, capacity)?;
    let mut content = String::with_capacity(capacity);
    reader
        .read_to_string(&mut content)
        .map_err(|source| FileReadError::Read {
            path: path.to_owned(),
            source,
        })?;
    Ok(content)
}
