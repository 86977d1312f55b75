//! Shared utilities for reading columns leniently.
//!
//! Raw election files mix integers, floats and free text in the same
//! column, so every step that needs a number or a string goes through
//! these helpers instead of trusting the inferred dtype.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    is_numeric_dtype(dtype) && !matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Whether the frame has a column with exactly this name.
#[inline]
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Owned column names in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Try to parse a cell as a finite number.
///
/// Surrounding whitespace is ignored. Thousands separators are not
/// accepted, so `"1,000"` does not parse.
///
/// # Example
///
/// ```rust,ignore
/// use election_prep::utils::parse_numeric_string;
///
/// assert_eq!(parse_numeric_string(" 42 "), Some(42.0));
/// assert_eq!(parse_numeric_string("1e3"), Some(1000.0));
/// assert_eq!(parse_numeric_string("nan"), None);
/// ```
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Series Access Utilities
// =============================================================================

/// Read any column as optional finite floats.
///
/// Strings are parsed with [`parse_numeric_string`], numeric and boolean
/// columns are cast, everything else reads as missing.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    match series.dtype() {
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_numeric_string))
            .collect()),
        dtype if is_numeric_dtype(dtype) || matches!(dtype, DataType::Boolean) => {
            let cast = series.cast(&DataType::Float64)?;
            Ok(cast
                .f64()?
                .into_iter()
                .map(|v| v.filter(|f| f.is_finite()))
                .collect())
        }
        _ => Ok(vec![None; series.len()]),
    }
}

/// Read any column as optional owned strings.
pub fn string_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let as_str = series.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

// =============================================================================
// Numeric Utilities
// =============================================================================

/// Round to `decimals` places, resolving exact ties to the even neighbour.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(round_half_even(0.125, 2), 0.12);
/// assert_eq!(round_half_even(40.0, 2), 40.0);
/// ```
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// `numerator / denominator * 100`, with 0 for a zero denominator.
pub fn safe_percentage(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let pct = numerator as f64 / denominator as f64 * 100.0;
    if pct.is_finite() { pct } else { 0.0 }
}

// =============================================================================
// Tests
// =============================================================================
