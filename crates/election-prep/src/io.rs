//! CSV loading and writing.

use crate::error::{CleaningError, Result, ResultExt};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rows sampled for dtype inference on the first attempt.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Load a CSV with a header row.
///
/// The first attempt infers dtypes. Raw result files often switch a
/// numeric column to text deep into the file, which makes the inferred
/// schema fail, so the fallback reads every column as a string and lets
/// the cleaning steps parse values leniently.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CleaningError::InputNotFound(path.to_path_buf()));
    }

    // Strategy 1: inferred schema with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => {
            debug!("Loaded {} with inferred schema", path.display());
            return Ok(df);
        }
        Err(e) => {
            debug!("Inferred-schema loading failed: {}", e);
        }
    }

    // Strategy 2: every column as text
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .context(format!("Reading {}", path.display()))?;

    info!("Loaded {} with all columns as text", path.display());
    Ok(df)
}

/// Write a frame as comma-separated CSV with a header and no index column.
///
/// Any existing file at `path` is overwritten; missing parent directories
/// are created.
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context(format!("Creating {}", parent.display()))?;
    }

    let mut file = File::create(path).context(format!("Creating {}", path.display()))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)?;

    info!("Dataset saved: {}", path.display());
    Ok(())
}
