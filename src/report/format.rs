use std::fmt::Write as _;

use super::{Report, Result};

/// Renders a [`Report`] into bytes ready to be written out.
pub trait OutputFormatter: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the report cannot be encoded.
    fn format(&self, report: &Report) -> Result<Vec<u8>>;
}

/// Pretty printed JSON with statistics keyed by metric name.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &Report) -> Result<Vec<u8>> {
        let mut out = serde_json::to_vec_pretty(report)?;
        out.push(b'\n');
        Ok(out)
    }
}

/// One CSV row per metric, in report order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFormatter;

pub const CSV_HEADER: &str = "metric,min_kb,max_kb,avg_kb,std_kb,samples,duration_sec";

impl OutputFormatter for CsvFormatter {
    fn format(&self, report: &Report) -> Result<Vec<u8>> {
        let duration = report.metadata.duration;
        let mut out = String::with_capacity(64 * (report.statistics.len() + 1));
        out.push_str(CSV_HEADER);
        out.push('\n');
        for (metric, stats) in &report.statistics {
            // writing into a String cannot fail
            let _ = writeln!(
                out,
                "{metric},{},{},{:.2},{:.2},{},{duration:.3}",
                stats.min, stats.max, stats.avg, stats.std, stats.count
            );
        }
        Ok(out.into_bytes())
    }
}

/// Picks the formatter for the requested output format.
pub fn formatter_for(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(CsvFormatter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Statistics;
    use crate::series::{MemorySeries, Metric};
    use chrono::{Local, TimeZone};

    fn report() -> Report {
        let start_time = Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut report = Report::new("sleep 1", 4242, 10.0, start_time, &MemorySeries::default());
        report.metadata.duration = 1.23456;
        report.metadata.samples = 4;
        report
            .statistics
            .insert(Metric::Rss, Statistics::compute([100, 200, 150, 250]));
        report
    }

    #[test]
    fn test_csv_layout() {
        let out = String::from_utf8(CsvFormatter.format(&report()).unwrap()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 1 + Metric::ALL.len());
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "RSS,100,250,175.00,55.90,4,1.235");
        assert_eq!(lines[2], "PSS,0,0,0.00,0.00,0,1.235");
        let metrics: Vec<_> = lines[1..]
            .iter()
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(
            metrics,
            Metric::ALL.iter().map(|m| m.name()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_json_layout() {
        let out = JsonFormatter.format(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["metadata"]["command"], "sleep 1");
        assert_eq!(value["metadata"]["pid"], 4242);
        assert_eq!(value["metadata"]["frequency"], 10.0);
        assert_eq!(value["metadata"]["samples"], 4);
        assert!(
            value["metadata"]["start_time"]
                .as_str()
                .unwrap()
                .starts_with("2024-05-01T12:00:00")
        );

        let rss = &value["statistics"]["RSS"];
        assert_eq!(rss["min"], 100);
        assert_eq!(rss["max"], 250);
        assert_eq!(rss["avg"], 175.0);
        assert_eq!(rss["count"], 4);
        assert_eq!(rss["unit"], "kB");
        assert_eq!(value["statistics"]["USS"]["count"], 0);
        assert_eq!(
            value["statistics"].as_object().unwrap().len(),
            Metric::ALL.len()
        );
    }

    #[test]
    fn test_formatter_for() {
        let report = report();
        assert!(formatter_for(true).format(&report).unwrap().starts_with(b"{"));
        assert!(
            formatter_for(false)
                .format(&report)
                .unwrap()
                .starts_with(CSV_HEADER.as_bytes())
        );
    }
}
