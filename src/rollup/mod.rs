//! Per-process memory sampling from the kernel's `smaps_rollup` interface.
//!
//! `/proc/<pid>/smaps_rollup` (Linux 4.14+) aggregates the memory mappings of
//! a process into a single `smaps`-style block. This module parses that block
//! and exposes it through the [`SampleSource`] capability used by the sampling
//! coordinator.
//!
//! # Key Components
//!
//! - [`KeyValueStat`]: generic `Key: value [unit]` parser.
//! - [`RollupStat`]: the six counters of interest, in kilobytes.
//! - [`ProcRollupSource`]: reads and parses the rollup of one pid per call.
//! - [`SourceError`]: distinguishes a vanished process from a real read failure.
mod error;
mod parser;
mod source;
mod stat;

pub use error::StatParseError;
pub use parser::KeyValueStat;
pub use source::{ProcRollupSource, SampleSource, SourceError};
pub use stat::RollupStat;
