//! Replace-load of a cleaned frame into one relational table.
//!
//! A load drops the table, recreates it from the frame's schema and
//! inserts every row. The SQL is rendered here without touching a
//! database, so it can be inspected and tested on its own; running it
//! needs the `postgres` feature, which pulls in diesel.
//!
//! ## Configuration
//!
//! See [`DatabaseConfig::from_env`] for the environment variables read.

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresSink;

use crate::config::DatabaseConfig;
use crate::error::{CleaningError, Result};
use crate::utils::{is_integer_dtype, string_values};
use polars::prelude::*;
use tracing::info;

/// Rows per INSERT statement.
pub const INSERT_BATCH_SIZE: usize = 1_000;

/// Double-quote an identifier, escaping embedded quotes.
///
/// Quoting keeps the mixed-case column names (`Vote_Share_Percentage`)
/// exactly as they appear in the cleaned file.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Pins literal parsing for the load transaction so backslashes in
/// [`quote_text`] output stay literal.
pub const STANDARD_STRINGS_SQL: &str = "SET LOCAL standard_conforming_strings = on";

/// Single-quote a text value, escaping embedded quotes.
///
/// Only quotes are doubled; backslashes pass through unchanged. That is
/// correct only under `standard_conforming_strings = on`, which the load
/// sets with [`STANDARD_STRINGS_SQL`] before inserting.
pub fn quote_text(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Column type used when recreating the table.
pub fn sql_type_for(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::Boolean => "BOOLEAN",
        DataType::Float32 | DataType::Float64 => "DOUBLE PRECISION",
        dtype if is_integer_dtype(dtype) => "BIGINT",
        _ => "TEXT",
    }
}

/// Render every cell of a column as a SQL literal.
pub fn column_literals(series: &Series) -> Result<Vec<String>> {
    let dtype = series.dtype();
    let literals = match dtype {
        DataType::Boolean => series
            .bool()?
            .into_iter()
            .map(|v| match v {
                Some(true) => "TRUE".to_string(),
                Some(false) => "FALSE".to_string(),
                None => "NULL".to_string(),
            })
            .collect(),
        DataType::Float32 | DataType::Float64 => series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| match v {
                Some(f) if f.is_finite() => f.to_string(),
                _ => "NULL".to_string(),
            })
            .collect(),
        dtype if is_integer_dtype(dtype) => series
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map_or_else(|| "NULL".to_string(), |i| i.to_string()))
            .collect(),
        _ => string_values(series)?
            .into_iter()
            .map(|v| v.map_or_else(|| "NULL".to_string(), |s| quote_text(&s)))
            .collect(),
    };
    Ok(literals)
}

pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_identifier(table))
}

/// `CREATE TABLE` mirroring the frame's column names, order and dtypes.
pub fn create_table_sql(table: &str, df: &DataFrame) -> String {
    let columns: Vec<String> = df
        .get_columns()
        .iter()
        .map(|col| {
            format!(
                "{} {}",
                quote_identifier(col.name()),
                sql_type_for(col.dtype())
            )
        })
        .collect();
    format!(
        "CREATE TABLE {} ({})",
        quote_identifier(table),
        columns.join(", ")
    )
}

/// Multi-row `INSERT` statements covering the whole frame.
///
/// An empty frame yields no statements.
pub fn insert_batch_sqls(table: &str, df: &DataFrame, batch_size: usize) -> Result<Vec<String>> {
    if batch_size == 0 {
        return Err(CleaningError::InvalidConfig(
            "insert batch size must be at least 1".to_string(),
        ));
    }

    let column_list: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| quote_identifier(name))
        .collect();
    let prefix = format!(
        "INSERT INTO {} ({}) VALUES ",
        quote_identifier(table),
        column_list.join(", ")
    );

    let literals: Vec<Vec<String>> = df
        .get_columns()
        .iter()
        .map(|col| column_literals(col.as_materialized_series()))
        .collect::<Result<_>>()?;

    let rows: Vec<String> = (0..df.height())
        .map(|row| {
            let cells: Vec<&str> = literals.iter().map(|col| col[row].as_str()).collect();
            format!("({})", cells.join(", "))
        })
        .collect();

    Ok(rows
        .chunks(batch_size)
        .map(|chunk| format!("{}{}", prefix, chunk.join(", ")))
        .collect())
}

/// Replace the configured table with the contents of `df`.
///
/// Returns the number of rows loaded. Connection and query failures are
/// returned as-is; nothing is retried.
#[cfg(feature = "postgres")]
pub fn store_cleaned(df: &DataFrame, config: &DatabaseConfig) -> Result<usize> {
    info!(
        "Storing {} rows into '{}' at {}",
        df.height(),
        config.table,
        config.redacted_url()
    );
    let mut sink = PostgresSink::connect(config)?;
    let rows = sink.replace_table(df)?;
    info!("Data stored in PostgreSQL table '{}'.", config.table);
    Ok(rows)
}

/// Replace the configured table with the contents of `df`.
///
/// This build has no database driver, so it always fails.
#[cfg(not(feature = "postgres"))]
pub fn store_cleaned(df: &DataFrame, config: &DatabaseConfig) -> Result<usize> {
    info!(
        "Requested load of {} rows into '{}' without database support",
        df.height(),
        config.table
    );
    Err(CleaningError::InvalidConfig(
        "database loading requires building with the `postgres` feature".to_string(),
    ))
}
