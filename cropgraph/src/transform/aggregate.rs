//! Cross-file aggregation.
//!
//! Reduces the same column taken from several parallel runs to a per-row
//! summary across runs:
//!
//! ```text
//!  run A ─┐
//!  run B ─┼─▶ row i: [a_i, b_i, c_i] ─▶ mean, stddev, min, max ─▶ band
//!  run C ─┘
//! ```
//!
//! Rows are aligned by position only. Row counts are checked, dates are not.

use serde::Serialize;

use crate::error::{GraphError, GraphResult};
use crate::models::Dataset;

/// Summary of one row across all sources.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregationResult {
    pub mean: f64,
    /// Population standard deviation (divides by the number of sources)
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

/// Candlestick-style band: mean ± one standard deviation inside min/max.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandEntry {
    pub open: f64,
    pub close: f64,
    pub low: f64,
    pub high: f64,
}

impl AggregationResult {
    /// Summarize one row of values. `values` must not be empty.
    pub fn from_values(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        let mut sum = 0.0;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        let mean = sum / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        Self {
            mean,
            stddev: variance.sqrt(),
            min,
            max,
        }
    }

    pub fn band(&self) -> BandEntry {
        BandEntry {
            open: self.mean - self.stddev,
            close: self.mean + self.stddev,
            low: self.min,
            high: self.max,
        }
    }
}

impl BandEntry {
    /// `[open, close, low, high]`, the order candlestick charts expect.
    pub fn to_array(&self) -> [f64; 4] {
        [self.open, self.close, self.low, self.high]
    }
}

/// Aggregate `column` across `sources`, row by row.
///
/// Every source must carry the column with exactly `row_count` rows.
pub fn aggregate(
    column: &str,
    sources: &[Dataset],
    row_count: usize,
) -> GraphResult<Vec<AggregationResult>> {
    if sources.is_empty() {
        return Err(GraphError::NoSources);
    }

    // by_row[i][k] = value of row i in source k
    let mut by_row = vec![Vec::with_capacity(sources.len()); row_count];
    for source in sources {
        let series = source.column(column)?;
        if series.len() != row_count {
            return Err(GraphError::MismatchedLengths {
                column: format!("{} in {}", column, source.origin()),
                expected: row_count,
                got: series.len(),
            });
        }
        for (row, cell) in by_row.iter_mut().zip(series.iter()) {
            row.push(cell.to_number()?);
        }
    }

    Ok(by_row
        .iter()
        .map(|values| AggregationResult::from_values(values))
        .collect())
}
