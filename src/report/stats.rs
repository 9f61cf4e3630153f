/// Unit of every reported magnitude.
pub const UNIT: &str = "kB";

/// Summary statistics of one metric over a monitoring run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Statistics {
    pub min: u64,
    pub max: u64,
    pub avg: f64,
    /// Population standard deviation.
    pub std: f64,
    pub count: usize,
    pub unit: &'static str,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            min: 0,
            max: 0,
            avg: 0.0,
            std: 0.0,
            count: 0,
            unit: UNIT,
        }
    }
}

impl Statistics {
    /// Computes the statistics of `values`.
    ///
    /// An empty input yields all zeros with a count of zero.
    pub fn compute(values: impl IntoIterator<Item = u64>) -> Self {
        let values: Vec<u64> = values.into_iter().collect();
        let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
            return Self::default();
        };

        let count = values.len();
        let sum: u128 = values.iter().map(|&v| u128::from(v)).sum();
        let avg = sum as f64 / count as f64;
        let variance = values
            .iter()
            .map(|&v| {
                let diff = v as f64 - avg;
                diff * diff
            })
            .sum::<f64>()
            / count as f64;

        Self {
            min,
            max,
            avg,
            std: variance.sqrt(),
            count,
            unit: UNIT,
        }
    }
}
