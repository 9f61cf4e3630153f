use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{Error, OutputFormatter, Report, Result};

/// Message printed instead of a report when no sample was accepted.
pub const NO_DATA_MESSAGE: &str = "No data collected";

/// Where the report goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    /// Created or truncated.
    File(PathBuf),
}

impl Destination {
    pub fn from_output(output: Option<&Path>) -> Self {
        output.map_or(Destination::Stdout, |path| {
            Destination::File(path.to_path_buf())
        })
    }

    fn describe(&self) -> String {
        match self {
            Destination::Stdout => "stdout".to_owned(),
            Destination::File(path) => format!("`{}`", path.display()),
        }
    }
}

/// Formats `report` and writes it to `destination`.
///
/// `None` means nothing was collected; [`NO_DATA_MESSAGE`] is printed to
/// stdout and no file is created.
///
/// # Errors
///
/// Returns an error if the report cannot be encoded, the output file cannot be
/// created or the write fails.
pub fn write_results(
    report: Option<&Report>,
    formatter: &dyn OutputFormatter,
    destination: &Destination,
) -> Result<()> {
    let Some(report) = report else {
        let mut stdout = io::stdout().lock();
        return writeln!(stdout, "{NO_DATA_MESSAGE}").map_err(|source| Error::Write {
            target: Destination::Stdout.describe(),
            source,
        });
    };

    let data = formatter.format(report)?;
    match destination {
        Destination::Stdout => write_all(&mut io::stdout().lock(), &data, destination),
        Destination::File(path) => {
            let mut file = File::create(path).map_err(|source| Error::CreateFile {
                path: path.clone(),
                source,
            })?;
            write_all(&mut file, &data, destination)
        }
    }
}

fn write_all(out: &mut impl Write, data: &[u8], destination: &Destination) -> Result<()> {
    out.write_all(data)
        .and_then(|()| out.flush())
        .map_err(|source| Error::Write {
            target: destination.describe(),
            source,
        })
}
