use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use super::Statistics;
use crate::series::{MemorySeries, Metric};

impl serde::Serialize for Metric {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

/// Describes the monitored run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Metadata {
    pub command: String,
    pub pid: u32,
    /// Configured sampling frequency in Hz.
    pub frequency: f64,
    /// Seconds between the first and the last sample.
    pub duration: f64,
    pub samples: usize,
    pub start_time: DateTime<Local>,
}

/// The final report: run metadata and per-metric statistics in report order.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Report {
    pub metadata: Metadata,
    pub statistics: BTreeMap<Metric, Statistics>,
}

impl Report {
    /// Builds the report of `series`. Each metric is summarized over the
    /// samples that captured it, so counts may differ between metrics.
    pub fn new(
        command: impl Into<String>,
        pid: u32,
        frequency: f64,
        start_time: DateTime<Local>,
        series: &MemorySeries,
    ) -> Self {
        let statistics = Metric::ALL
            .into_iter()
            .map(|metric| (metric, Statistics::compute(series.values(metric))))
            .collect();

        Self {
            metadata: Metadata {
                command: command.into(),
                pid,
                frequency,
                duration: series.duration().as_secs_f64(),
                samples: series.len(),
                start_time,
            },
            statistics,
        }
    }
}
