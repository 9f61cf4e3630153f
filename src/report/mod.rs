//! Statistics and rendering of the final report.
mod error;
mod format;
mod models;
mod stats;
mod writer;

pub use error::{Error, Result};
pub use format::{CSV_HEADER, CsvFormatter, JsonFormatter, OutputFormatter, formatter_for};
pub use models::{Metadata, Report};
pub use stats::{Statistics, UNIT};
pub use writer::{Destination, NO_DATA_MESSAGE, write_results};
