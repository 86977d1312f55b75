//! Descriptive statistics for numeric columns.

use serde::{Deserialize, Serialize};

/// One row of the statistical summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub column: String,
    /// Non-missing numeric values
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); `None` for fewer than two values
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

/// Summarise the non-missing values of a column.
///
/// Returns `None` when the column has no numeric values at all.
pub fn describe_column(name: &str, values: &[Option<f64>]) -> Option<ColumnStatistics> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(f64::total_cmp);

    let count = present.len();
    let mean = present.iter().sum::<f64>() / count as f64;

    Some(ColumnStatistics {
        column: name.to_string(),
        count,
        mean,
        std: sample_std(&present, mean),
        min: present[0],
        p25: percentile(&present, 0.25),
        p50: percentile(&present, 0.50),
        p75: percentile(&present, 0.75),
        max: present[count - 1],
    })
}

/// Sample standard deviation around a precomputed mean.
pub fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let variance: f64 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}

/// Percentile of sorted values using linear interpolation between ranks.
///
/// `p` is a fraction in `[0, 1]`. An empty slice yields NaN.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = p.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}
