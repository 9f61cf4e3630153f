//! Time series of memory samples collected for one process.

use std::fmt;
use std::time::{Duration, Instant};

use crate::rollup::RollupStat;

/// The metrics reported for a monitored process, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Rss,
    Pss,
    Uss,
    SharedClean,
    SharedDirty,
    PrivateClean,
    PrivateDirty,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Rss,
        Metric::Pss,
        Metric::Uss,
        Metric::SharedClean,
        Metric::SharedDirty,
        Metric::PrivateClean,
        Metric::PrivateDirty,
    ];

    /// Name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Rss => "RSS",
            Metric::Pss => "PSS",
            Metric::Uss => "USS",
            Metric::SharedClean => "SHARED_CLEAN",
            Metric::SharedDirty => "SHARED_DIRTY",
            Metric::PrivateClean => "PRIVATE_CLEAN",
            Metric::PrivateDirty => "PRIVATE_DIRTY",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One snapshot of a process's memory, all counters taken from the same read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySample {
    timestamp: Instant,
    stat: RollupStat,
}

impl MemorySample {
    pub fn new(timestamp: Instant, stat: RollupStat) -> Self {
        Self { timestamp, stat }
    }

    /// Instant the snapshot was captured.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the value of `metric` in kilobytes, if it was captured.
    ///
    /// USS is derived from the private counters of this same sample.
    pub fn value(&self, metric: Metric) -> Option<u64> {
        match metric {
            Metric::Rss => self.stat.rss,
            Metric::Pss => self.stat.pss,
            Metric::Uss => self.stat.uss(),
            Metric::SharedClean => self.stat.shared_clean,
            Metric::SharedDirty => self.stat.shared_dirty,
            Metric::PrivateClean => self.stat.private_clean,
            Metric::PrivateDirty => self.stat.private_dirty,
        }
    }
}

/// Append-only, chronologically ordered sequence of [`MemorySample`]s.
///
/// Samples are kept in insertion order, which is capture order. The series
/// never reorders or deduplicates.
#[derive(Debug, Clone, Default)]
pub struct MemorySeries {
    samples: Vec<MemorySample>,
}

impl MemorySeries {
    pub fn push(&mut self, sample: MemorySample) {
        debug_assert!(
            self.samples
                .last()
                .is_none_or(|last| last.timestamp <= sample.timestamp),
            "samples must be appended in capture order"
        );
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[MemorySample] {
        &self.samples
    }

    /// Values of `metric` for every sample that captured it, in order.
    pub fn values(&self, metric: Metric) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().filter_map(move |s| s.value(metric))
    }

    /// Elapsed time between the first and the last sample.
    pub fn duration(&self) -> Duration {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.timestamp.duration_since(first.timestamp),
            _ => Duration::ZERO,
        }
    }
}
