//! Numeric steps of the cleaning pipeline: year filter, count coercion,
//! derived ratios and the winner flag.

use crate::error::Result;
use crate::types::{
    ELECTORS, IS_WINNER, NUMERIC_COLUMNS, POSITION, TURNOUT_PERCENTAGE, VALID_VOTES,
    VOTE_SHARE_PERCENTAGE, VOTES, YEAR,
};
use crate::utils::{is_integer_dtype, numeric_values, round_half_even, safe_percentage};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Upper bound applied to turnout after rounding.
const MAX_TURNOUT: f64 = 100.0;

/// Keep rows whose Year lies in `[min_year, max_year]`.
///
/// Rows with a missing or non-numeric Year are dropped as well. Year is
/// written back as the parsed Int64 value, so text years like `" 1998 "`
/// come out as `1998`.
pub fn filter_year_range(mut df: DataFrame, min_year: i64, max_year: i64) -> Result<DataFrame> {
    let years = numeric_values(df.column(YEAR)?.as_materialized_series())?;
    let (min, max) = (min_year as f64, max_year as f64);

    let mask: BooleanChunked = years
        .iter()
        .map(|&v| v.is_some_and(|y| y >= min && y <= max))
        .collect();

    let parsed: Vec<Option<i64>> = years
        .into_iter()
        .map(|v| v.map(|y| y.trunc() as i64))
        .collect();
    df.with_column(Series::new(YEAR.into(), parsed))?;

    let filtered = df.filter(&mask)?;
    debug!(
        "Year filter [{}, {}] kept {} of {} rows",
        min_year,
        max_year,
        filtered.height(),
        df.height()
    );
    Ok(filtered)
}

/// Read a column as integers, with 0 for anything missing or unparsable.
///
/// Floats truncate toward zero. Returns the values and how many cells
/// had to be defaulted.
pub(crate) fn lenient_integers(series: &Series) -> Result<(Vec<i64>, usize)> {
    let parsed: Vec<Option<i64>> = if is_integer_dtype(series.dtype()) {
        series.cast(&DataType::Int64)?.i64()?.into_iter().collect()
    } else {
        numeric_values(series)?
            .into_iter()
            .map(|v| v.map(|f| f.trunc() as i64))
            .collect()
    };

    let defaulted = parsed.iter().filter(|v| v.is_none()).count();
    Ok((parsed.into_iter().map(|v| v.unwrap_or(0)).collect(), defaulted))
}

/// Coerce Votes, Electors, Valid_Votes and Margin to Int64.
///
/// Returns, per column, how many cells became 0 because they were
/// missing or unparsable.
pub fn coerce_numeric_columns(df: &mut DataFrame) -> Result<BTreeMap<String, usize>> {
    let mut coerced = BTreeMap::new();

    for col_name in NUMERIC_COLUMNS {
        let (values, defaulted) = lenient_integers(df.column(col_name)?.as_materialized_series())?;
        df.with_column(Series::new(col_name.into(), values))?;

        if defaulted > 0 {
            debug!("Coerced {} missing/invalid values in '{}' to 0", defaulted, col_name);
        }
        coerced.insert(col_name.to_string(), defaulted);
    }

    Ok(coerced)
}

/// Add Turnout_Percentage and Vote_Share_Percentage.
///
/// Both are rounded to two decimals and are 0 when the denominator is 0.
/// Turnout is capped at 100; vote share has no cap. Returns the number
/// of turnout values that were capped.
pub fn add_derived_ratios(df: &mut DataFrame) -> Result<usize> {
    let (votes, _) = lenient_integers(df.column(VOTES)?.as_materialized_series())?;
    let (valid_votes, _) = lenient_integers(df.column(VALID_VOTES)?.as_materialized_series())?;
    let (electors, _) = lenient_integers(df.column(ELECTORS)?.as_materialized_series())?;

    let mut clamped = 0;
    let turnout: Vec<f64> = valid_votes
        .iter()
        .zip(&electors)
        .map(|(&valid, &total)| {
            let pct = round_half_even(safe_percentage(valid, total), 2);
            if pct > MAX_TURNOUT {
                clamped += 1;
                MAX_TURNOUT
            } else {
                pct
            }
        })
        .collect();

    let vote_share: Vec<f64> = votes
        .iter()
        .zip(&valid_votes)
        .map(|(&v, &valid)| round_half_even(safe_percentage(v, valid), 2))
        .collect();

    df.with_column(Series::new(TURNOUT_PERCENTAGE.into(), turnout))?;
    df.with_column(Series::new(VOTE_SHARE_PERCENTAGE.into(), vote_share))?;

    if clamped > 0 {
        debug!("Clamped {} turnout values above 100%", clamped);
    }
    Ok(clamped)
}

/// Add Is_Winner, true exactly where Position equals 1.
///
/// Returns the number of winners flagged.
pub fn add_winner_flag(df: &mut DataFrame) -> Result<usize> {
    let positions = numeric_values(df.column(POSITION)?.as_materialized_series())?;
    let winners: Vec<bool> = positions.into_iter().map(|p| p == Some(1.0)).collect();
    let count = winners.iter().filter(|w| **w).count();

    df.with_column(Series::new(IS_WINNER.into(), winners))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_column(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    fn i64_column(df: &DataFrame, name: &str) -> Vec<i64> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    #[test]
    fn test_filter_year_range_bounds_inclusive() {
        let df = df!("Year" => &[1990i64, 1991, 2004, 2019, 2020]).unwrap();
        let filtered = filter_year_range(df, 1991, 2019).unwrap();
        assert_eq!(i64_column(&filtered, "Year"), vec![1991, 2004, 2019]);
    }

    #[test]
    fn test_filter_year_range_drops_missing_and_text_years() {
        let df = df!("Year" => &[Some("2014"), None, Some("n/a"), Some(" 1998 ")]).unwrap();
        let filtered = filter_year_range(df, 1991, 2019).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn test_filter_year_range_writes_parsed_years() {
        let df = df!("Year" => &[Some(" 1998 "), Some("2014"), Some("n/a")]).unwrap();
        let filtered = filter_year_range(df, 1991, 2019).unwrap();

        assert_eq!(filtered.column("Year").unwrap().dtype(), &DataType::Int64);
        assert_eq!(i64_column(&filtered, "Year"), vec![1998, 2014]);
    }

    #[test]
    fn test_lenient_integers() {
        let series = Series::new(
            "Votes".into(),
            &[Some("1000"), Some("12.7"), Some("-3.9"), Some("abc"), None],
        );
        let (values, defaulted) = lenient_integers(&series).unwrap();
        assert_eq!(values, vec![1000, 12, -3, 0, 0]);
        assert_eq!(defaulted, 2);
    }

    #[test]
    fn test_coerce_numeric_columns() {
        let mut df = df!(
            "Votes" => &[Some("10"), Some("oops")],
            "Electors" => &[Some(100i64), None],
            "Valid_Votes" => &[Some(50.0f64), Some(20.0)],
            "Margin" => &[None::<&str>, Some("5")],
        )
        .unwrap();

        let coerced = coerce_numeric_columns(&mut df).unwrap();

        assert_eq!(i64_column(&df, "Votes"), vec![10, 0]);
        assert_eq!(i64_column(&df, "Electors"), vec![100, 0]);
        assert_eq!(i64_column(&df, "Valid_Votes"), vec![50, 20]);
        assert_eq!(i64_column(&df, "Margin"), vec![0, 5]);
        assert_eq!(coerced["Votes"], 1);
        assert_eq!(coerced["Electors"], 1);
        assert_eq!(coerced["Valid_Votes"], 0);
    }

    #[test]
    fn test_coerce_numeric_columns_missing_column() {
        let mut df = df!("Votes" => &[1i64]).unwrap();
        assert!(coerce_numeric_columns(&mut df).is_err());
    }

    #[test]
    fn test_derived_ratios_basic() {
        let mut df = df!(
            "Votes" => &[1000i64, 1],
            "Valid_Votes" => &[2000i64, 3],
            "Electors" => &[5000i64, 3],
        )
        .unwrap();

        add_derived_ratios(&mut df).unwrap();

        assert_eq!(f64_column(&df, "Turnout_Percentage"), vec![40.0, 100.0]);
        assert_eq!(f64_column(&df, "Vote_Share_Percentage"), vec![50.0, 33.33]);
    }

    #[test]
    fn test_derived_ratios_zero_denominators() {
        let mut df = df!(
            "Votes" => &[10i64],
            "Valid_Votes" => &[0i64],
            "Electors" => &[0i64],
        )
        .unwrap();

        add_derived_ratios(&mut df).unwrap();

        assert_eq!(f64_column(&df, "Turnout_Percentage"), vec![0.0]);
        assert_eq!(f64_column(&df, "Vote_Share_Percentage"), vec![0.0]);
    }

    #[test]
    fn test_turnout_clamped_vote_share_not() {
        let mut df = df!(
            "Votes" => &[300i64],
            "Valid_Votes" => &[150i64],
            "Electors" => &[100i64],
        )
        .unwrap();

        let clamped = add_derived_ratios(&mut df).unwrap();

        assert_eq!(clamped, 1);
        assert_eq!(f64_column(&df, "Turnout_Percentage"), vec![100.0]);
        assert_eq!(f64_column(&df, "Vote_Share_Percentage"), vec![200.0]);
    }

    #[test]
    fn test_turnout_has_no_floor() {
        let mut df = df!(
            "Votes" => &[0i64],
            "Valid_Votes" => &[100i64],
            "Electors" => &[-200i64],
        )
        .unwrap();

        add_derived_ratios(&mut df).unwrap();
        assert_eq!(f64_column(&df, "Turnout_Percentage"), vec![-50.0]);
    }

    #[test]
    fn test_add_winner_flag() {
        let mut df = df!("Position" => &[Some("1"), Some("2"), None, Some("1.0")]).unwrap();
        let winners = add_winner_flag(&mut df).unwrap();

        let flags: Vec<bool> = df
            .column("Is_Winner")
            .unwrap()
            .as_materialized_series()
            .bool()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(flags, vec![true, false, false, true]);
        assert_eq!(winners, 2);
    }
}
