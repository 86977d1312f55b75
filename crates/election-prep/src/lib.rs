//! Election Results Cleaning Library
//!
//! Batch cleaning and descriptive analysis of constituency-level election
//! results, built on Polars.
//!
//! # Overview
//!
//! - **Cleaning**: year filtering, categorical defaults, lenient integer
//!   coercion, turnout and vote-share ratios, text normalization, Sex and
//!   state-name canonicalization, winner flag, fixed output columns
//! - **Analysis**: schema, scope (years, election types, states) and
//!   descriptive statistics of a cleaned file
//! - **Storage**: optional replace-load into a PostgreSQL table
//!   (`postgres` feature)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use election_prep::{CleanerConfig, DatasetAnalyzer, ElectionCleaner};
//!
//! let config = CleanerConfig::builder()
//!     .input_path("All_States_GE.csv")
//!     .output_path("cleaned_election_data.csv")
//!     .build()?;
//!
//! let (cleaned, summary) = ElectionCleaner::new(config).run()?;
//! println!("{}", summary);
//!
//! let report = DatasetAnalyzer::analyze_file("cleaned_election_data.csv")?;
//! println!("{}", report);
//! ```

pub mod analyzer;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod io;
pub mod reporting;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use analyzer::{AnalysisReport, ColumnSchema, ColumnStatistics, DatasetAnalyzer, ValueCount, YearScope};
pub use cleaner::ElectionCleaner;
pub use config::{CleanerConfig, CleanerConfigBuilder, ConfigValidationError, DatabaseConfig};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use io::{load_csv, write_csv};
pub use reporting::{render_cleaning_summary, render_report};
pub use store::store_cleaned;
pub use types::{CleaningSummary, Sex};
