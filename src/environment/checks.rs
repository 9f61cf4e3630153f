use super::{Error, Result};
use crate::fsutil;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Name prefix of the file created to probe the output directory.
pub const WRITE_PROBE_NAME: &str = ".write_test";

/// Returns an error unless the program was built for Linux.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOs`] on any other operating system.
pub fn check_os() -> Result<()> {
    if cfg!(target_os = "linux") {
        Ok(())
    } else {
        Err(Error::UnsupportedOs {
            os: std::env::consts::OS,
        })
    }
}

/// Checks that the kernel exposes `smaps_rollup` and that it can be opened.
///
/// # Arguments
///
/// * `proc_root` - Mount point of procfs, usually `/proc`.
///
/// # Errors
///
/// Returns [`Error::RollupUnavailable`] if `<proc_root>/self/smaps_rollup`
/// cannot be opened.
pub fn check_rollup_available(proc_root: impl AsRef<Path>) -> Result<()> {
    let path = proc_root.as_ref().join("self/smaps_rollup");
    fsutil::open_file_reader(&path)
        .map(drop)
        .map_err(Error::RollupUnavailable)
}

/// Checks that the directory the report will be written to exists and is writable.
///
/// Writability is probed by creating and removing a file in the directory.
///
/// # Arguments
///
/// * `output` - Path of the report file. A bare file name refers to the
///   current directory.
///
/// # Returns
///
/// The checked directory.
///
/// # Errors
///
/// * [`Error::ExistenceCheck`] if the existence of the directory cannot be determined.
/// * [`Error::OutputDirMissing`] if the directory does not exist.
/// * [`Error::OutputDirNotWritable`] if the probe file cannot be created.
pub fn check_output_dir(output: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = match output.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let exists = dir.try_exists().map_err(|source| Error::ExistenceCheck {
        path: dir.clone(),
        source,
    })?;
    if !exists {
        return Err(Error::OutputDirMissing { path: dir });
    }

    let probe = dir.join(format!("{WRITE_PROBE_NAME}.{}", std::process::id()));
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
        .map_err(|source| Error::OutputDirNotWritable {
            path: dir.clone(),
            source,
        })?;
    if let Err(err) = fs::remove_file(&probe) {
        log::warn!("Failed to remove write probe `{}`: {}", probe.display(), err);
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_os() {
        assert_eq!(check_os().is_ok(), cfg!(target_os = "linux"));
    }

    #[test]
    fn test_rollup_available() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("self")).unwrap();
        fs::write(root.path().join("self/smaps_rollup"), "Rss: 1 kB\n").unwrap();
        check_rollup_available(root.path()).unwrap();
    }

    #[test]
    fn test_rollup_missing() {
        let root = tempfile::tempdir().unwrap();
        match check_rollup_available(root.path()).unwrap_err() {
            Error::RollupUnavailable(err) => {
                assert_eq!(err.path, root.path().join("self/smaps_rollup"));
                assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("Expected RollupUnavailable error, got {other:?}"),
        }
    }

    #[test]
    fn test_output_dir_writable() {
        let dir = tempfile::tempdir().unwrap();
        let checked = check_output_dir(dir.path().join("report.csv")).unwrap();
        assert_eq!(checked, dir.path());
        // the probe is cleaned up
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_output_bare_file_name() {
        assert_eq!(check_output_dir("report.csv").unwrap(), Path::new("."));
    }

    #[test]
    fn test_output_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        match check_output_dir(missing.join("report.csv")).unwrap_err() {
            Error::OutputDirMissing { path } => assert_eq!(path, missing),
            other => panic!("Expected OutputDirMissing error, got {other:?}"),
        }
    }

    #[test]
    fn test_output_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, "").unwrap();
        let err = check_output_dir(file.join("report.csv")).unwrap_err();
        assert!(matches!(err, Error::OutputDirNotWritable { .. }));
        assert!(!err.is_permission_denied());
    }
}
