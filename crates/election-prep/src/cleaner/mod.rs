//! Cleaning pipeline for raw election results.
//!
//! The steps run in a fixed order, each one relying on the previous ones:
//! 1. Keep rows inside the configured year window
//! 2. Fill missing categorical values with defaults
//! 3. Coerce vote/elector/margin counts to integers
//! 4. Derive turnout and vote-share percentages
//! 5. Trim and uppercase text columns
//! 6. Canonicalize Sex (unless disabled)
//! 7. Rewrite historical state names
//! 8. Flag winners
//! 9. Project the output columns

mod converters;
mod sanitizers;

pub use converters::{add_derived_ratios, add_winner_flag, coerce_numeric_columns, filter_year_range};
pub use sanitizers::{
    MISSING_TEXT, canonical_state_name, canonicalize_sex, canonicalize_state_names,
    fill_categorical_nulls, normalize_text, normalize_text_columns,
};

use crate::config::CleanerConfig;
use crate::error::{CleaningError, Result, ResultExt};
use crate::io::{load_csv, write_csv};
use crate::types::{CleaningSummary, OUTPUT_COLUMNS, REQUIRED_COLUMNS};
use crate::utils::{column_names, has_column};
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Fail with [`CleaningError::ColumnNotFound`] for the first required column
/// the frame lacks.
pub fn validate_required_columns(df: &DataFrame) -> Result<()> {
    match REQUIRED_COLUMNS.iter().find(|col| !has_column(df, col)) {
        Some(missing) => Err(CleaningError::ColumnNotFound(missing.to_string())),
        None => Ok(()),
    }
}

/// Select the output columns that exist, in output order.
pub fn project_output_columns(df: &DataFrame) -> Result<DataFrame> {
    let existing: Vec<&str> = OUTPUT_COLUMNS
        .iter()
        .copied()
        .filter(|col| has_column(df, col))
        .collect();
    Ok(df.select(existing)?)
}

/// Cleaner for raw constituency-level results.
pub struct ElectionCleaner {
    config: CleanerConfig,
}

impl ElectionCleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Apply the cleaning steps to an in-memory frame.
    ///
    /// No I/O happens here; see [`run`](Self::run) for the file-to-file job.
    pub fn clean(&self, df: DataFrame) -> Result<(DataFrame, CleaningSummary)> {
        let started = Instant::now();
        let mut summary = CleaningSummary {
            rows_read: df.height(),
            ..Default::default()
        };

        validate_required_columns(&df)?;

        // 1. Year window
        let mut df = filter_year_range(df, self.config.min_year, self.config.max_year)
            .context("Filtering by year")?;
        summary.rows_filtered_out = summary.rows_read - df.height();
        summary.steps.push(format!(
            "Kept {} of {} rows with Year in [{}, {}]",
            df.height(),
            summary.rows_read,
            self.config.min_year,
            self.config.max_year
        ));

        // 2. Categorical defaults
        summary.nulls_filled = fill_categorical_nulls(&mut df)?;
        let total_filled: usize = summary.nulls_filled.values().sum();
        summary
            .steps
            .push(format!("Filled {} missing categorical values", total_filled));

        // 3. Integer counts
        summary.values_coerced = coerce_numeric_columns(&mut df).context("Coercing counts")?;
        let total_coerced: usize = summary.values_coerced.values().sum();
        summary.steps.push(format!(
            "Coerced {} missing or non-numeric counts to 0",
            total_coerced
        ));

        // 4. Ratios
        summary.turnout_clamped = add_derived_ratios(&mut df)?;
        summary.steps.push(format!(
            "Derived turnout and vote share ({} turnout values capped at 100)",
            summary.turnout_clamped
        ));

        // 5. Text
        let normalized = normalize_text_columns(&mut df)?;
        summary.steps.push(format!(
            "Trimmed and uppercased {}",
            normalized.join(", ")
        ));

        // 6. Sex
        if self.config.canonicalize_sex {
            summary.sex_remapped = canonicalize_sex(&mut df)?;
            summary.steps.push(format!(
                "Canonicalized {} Sex values",
                summary.sex_remapped
            ));
        } else {
            debug!("Sex canonicalization disabled");
        }

        // 7. States
        summary.states_renamed = canonicalize_state_names(&mut df)?;
        summary.steps.push(format!(
            "Renamed {} historical state names",
            summary.states_renamed
        ));

        // 8. Winners
        let winners = add_winner_flag(&mut df)?;
        summary.steps.push(format!("Flagged {} winners", winners));

        // 9. Projection
        let df = project_output_columns(&df)?;
        summary.rows_written = df.height();
        summary.columns_written = column_names(&df);
        summary.duration_ms = started.elapsed().as_millis() as u64;

        for step in &summary.steps {
            debug!("  {}", step);
        }

        Ok((df, summary))
    }

    /// Load the configured input, clean it and write the configured output.
    ///
    /// The output file is only created once every step has succeeded.
    pub fn run(&self) -> Result<(DataFrame, CleaningSummary)> {
        let started = Instant::now();
        let input = &self.config.input_path;
        if !input.exists() {
            return Err(CleaningError::InputNotFound(input.clone()));
        }

        info!("Loading raw results from: {}", input.display());
        let raw = load_csv(input)?;
        info!("Dataset loaded successfully: {:?}", raw.shape());

        let (mut cleaned, mut summary) = self.clean(raw)?;

        write_csv(&mut cleaned, &self.config.output_path)?;
        summary.output_path = Some(self.config.output_path.display().to_string());
        summary.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            "Data cleaning complete. Filtered for {}-{}.",
            self.config.min_year, self.config.max_year
        );
        Ok((cleaned, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame() -> DataFrame {
        df!(
            "Year" => &[2014i64, 1985, 2019],
            "State_Name" => &["Orissa", "Bihar", " uttaranchal "],
            "Constituency_Name" => &[Some("Puri"), Some("Patna"), None],
            "Constituency_No" => &[17i64, 30, 5],
            "Party" => &[Some("bjd"), Some("INC"), None],
            "Candidate" => &["Pinaki Misra", "X", "Y"],
            "Sex" => &[Some("M"), Some("F"), Some("nota")],
            "Votes" => &["1000", "5", "abc"],
            "Valid_Votes" => &["2000", "10", "300"],
            "Electors" => &["5000", "20", "0"],
            "Margin" => &[Some("120"), Some("1"), None],
            "Position" => &[1i64, 1, 2],
            "Party_Type_TCPD" => &["State-based Party", "National Party", "Independents"],
        )
        .unwrap()
    }

    #[test]
    fn test_validate_required_columns() {
        let df = raw_frame().drop("Electors").unwrap();
        let err = validate_required_columns(&df).unwrap_err();
        assert!(matches!(err, CleaningError::ColumnNotFound(ref c) if c == "Electors"));
    }

    #[test]
    fn test_clean_drops_out_of_range_years() {
        let cleaner = ElectionCleaner::new(CleanerConfig::default());
        let (df, summary) = cleaner.clean(raw_frame()).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(summary.rows_read, 3);
        assert_eq!(summary.rows_filtered_out, 1);
        assert_eq!(summary.rows_written, 2);
    }

    #[test]
    fn test_clean_output_column_order() {
        let cleaner = ElectionCleaner::new(CleanerConfig::default());
        let (df, summary) = cleaner.clean(raw_frame()).unwrap();

        let expected: Vec<&str> = OUTPUT_COLUMNS
            .iter()
            .copied()
            .filter(|c| *c != "MyNeta_education")
            .collect();
        assert_eq!(column_names(&df), expected);
        assert_eq!(summary.columns_written, expected);
    }

    #[test]
    fn test_clean_without_sex_canonicalization() {
        let config = CleanerConfig::builder().canonicalize_sex(false).build().unwrap();
        let (df, summary) = ElectionCleaner::new(config).clean(raw_frame()).unwrap();

        let sex: Vec<&str> = df
            .column("Sex")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(sex, vec!["M", "NOTA"]);
        assert_eq!(summary.sex_remapped, 0);
    }

    #[test]
    fn test_clean_custom_year_window() {
        let config = CleanerConfig::builder().year_range(1980, 1990).build().unwrap();
        let (df, _) = ElectionCleaner::new(config).clean(raw_frame()).unwrap();
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_project_output_columns_ignores_extras() {
        let df = df!(
            "Sub_Region" => &["East"],
            "Year" => &[2014i64],
            "Is_Winner" => &[true],
        )
        .unwrap();
        let projected = project_output_columns(&df).unwrap();
        assert_eq!(column_names(&projected), vec!["Year", "Is_Winner"]);
    }

    #[test]
    fn test_run_missing_input() {
        let config = CleanerConfig::builder()
            .input_path("definitely/not/here.csv")
            .build()
            .unwrap();
        let err = ElectionCleaner::new(config).run().unwrap_err();
        assert!(err.is_input_missing());
    }
}
