//! Read-only diagnostics over a cleaned results file.
//!
//! The analyzer never modifies its input. It gathers:
//! - Row and column counts
//! - Per-column dtype, non-null count and memory footprint
//! - The election years, election types and states covered
//! - count/mean/std/quartiles for the key numeric columns

mod statistics;

pub use statistics::{ColumnStatistics, describe_column, percentile, sample_std};

use crate::error::{CleaningError, Result};
use crate::io::load_csv;
use crate::types::{DESCRIBE_COLUMNS, ELECTION_TYPE, STATE_NAME};
use crate::utils::{has_column, numeric_values, string_values};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// Label used for missing cells in value counts.
pub const MISSING_LABEL: &str = "NaN";

/// Schema line for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
    /// Estimated in-memory size of the column, in bytes
    pub memory_bytes: usize,
}

/// Distinct election years found in the first column whose name contains "Year".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearScope {
    pub column: String,
    pub years: Vec<i64>,
}

impl YearScope {
    pub fn count(&self) -> usize {
        self.years.len()
    }

    /// First and last year, if any were found.
    pub fn range(&self) -> Option<(i64, i64)> {
        Some((*self.years.first()?, *self.years.last()?))
    }
}

/// Occurrences of one value in a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Everything the analyzer reports about a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// File the report describes
    pub source: String,
    /// Timestamp when the report was generated
    pub generated_at: String,
    pub rows: usize,
    pub columns: usize,
    pub schema: Vec<ColumnSchema>,
    pub total_memory_bytes: usize,
    pub year_scope: Option<YearScope>,
    /// Present only when the dataset has an `Election_Type` column
    pub election_types: Option<Vec<ValueCount>>,
    /// Present only when the dataset has a `State_Name` column
    pub state_count: Option<usize>,
    pub statistics: Vec<ColumnStatistics>,
}

/// Analyzer for cleaned election datasets.
pub struct DatasetAnalyzer;

impl DatasetAnalyzer {
    /// Load `path` and analyze it.
    ///
    /// A missing file yields [`CleaningError::InputNotFound`] before anything
    /// else is read.
    pub fn analyze_file(path: impl AsRef<Path>) -> Result<AnalysisReport> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CleaningError::InputNotFound(path.to_path_buf()));
        }

        info!("Loading full data from {}", path.display());
        let df = load_csv(path)?;
        Self::analyze(&df, &path.display().to_string())
    }

    /// Analyze an in-memory frame.
    pub fn analyze(df: &DataFrame, source: &str) -> Result<AnalysisReport> {
        let schema = Self::schema(df);
        let total_memory_bytes = schema.iter().map(|c| c.memory_bytes).sum();

        let year_scope = Self::year_scope(df)?;

        let election_types = if has_column(df, ELECTION_TYPE) {
            Some(Self::value_counts(df.column(ELECTION_TYPE)?.as_materialized_series())?)
        } else {
            None
        };

        let state_count = if has_column(df, STATE_NAME) {
            let states = string_values(df.column(STATE_NAME)?.as_materialized_series())?;
            Some(states.into_iter().flatten().collect::<HashSet<_>>().len())
        } else {
            None
        };

        let mut statistics = Vec::new();
        for col_name in DESCRIBE_COLUMNS {
            if !has_column(df, col_name) {
                continue;
            }
            let values = numeric_values(df.column(col_name)?.as_materialized_series())?;
            match describe_column(col_name, &values) {
                Some(stats) => statistics.push(stats),
                None => debug!("No numeric values in '{}', skipping", col_name),
            }
        }

        Ok(AnalysisReport {
            source: source.to_string(),
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            rows: df.height(),
            columns: df.width(),
            schema,
            total_memory_bytes,
            year_scope,
            election_types,
            state_count,
            statistics,
        })
    }

    fn schema(df: &DataFrame) -> Vec<ColumnSchema> {
        df.get_columns()
            .iter()
            .map(|col| {
                let series = col.as_materialized_series();
                ColumnSchema {
                    name: series.name().to_string(),
                    dtype: series.dtype().to_string(),
                    non_null: series.len() - series.null_count(),
                    memory_bytes: series.estimated_size(),
                }
            })
            .collect()
    }

    /// Sorted distinct non-zero years from the first "Year"-like column.
    fn year_scope(df: &DataFrame) -> Result<Option<YearScope>> {
        let Some(column) = df
            .get_column_names()
            .into_iter()
            .find(|name| name.contains("Year"))
            .map(|name| name.to_string())
        else {
            return Ok(None);
        };

        let values = numeric_values(df.column(&column)?.as_materialized_series())?;
        let years: BTreeSet<i64> = values
            .into_iter()
            .flatten()
            .filter(|y| *y != 0.0)
            .map(|y| y.trunc() as i64)
            .collect();

        Ok(Some(YearScope {
            column,
            years: years.into_iter().collect(),
        }))
    }

    /// Value counts including missing cells, most frequent first.
    fn value_counts(series: &Series) -> Result<Vec<ValueCount>> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in string_values(series)? {
            let key = value.unwrap_or_else(|| MISSING_LABEL.to_string());
            *counts.entry(key).or_insert(0) += 1;
        }

        let mut counts: Vec<ValueCount> = counts
            .into_iter()
            .map(|(value, count)| ValueCount { value, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        Ok(counts)
    }
}
