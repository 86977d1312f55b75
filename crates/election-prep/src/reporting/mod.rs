//! Human-readable rendering of analysis reports and cleaning summaries.
//!
//! Both report types implement [`std::fmt::Display`]; the CLI prints them
//! with `println!` unless `--json` is requested, in which case the
//! serde representation is emitted instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use election_prep::analyzer::DatasetAnalyzer;
//!
//! let report = DatasetAnalyzer::analyze_file("cleaned_election_data.csv")?;
//! println!("{}", report);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

use crate::analyzer::{AnalysisReport, ColumnStatistics};
use crate::types::CleaningSummary;
use std::fmt;

const RULE_WIDTH: usize = 50;

fn rule(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", "-".repeat(RULE_WIDTH))
}

/// Format a byte count the way memory usage is usually read.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.6}", v),
        _ => "NaN".to_string(),
    }
}

fn write_statistics(f: &mut fmt::Formatter<'_>, stats: &[ColumnStatistics]) -> fmt::Result {
    writeln!(
        f,
        "{:<22} {:>10} {:>16} {:>16} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    )?;
    for s in stats {
        writeln!(
            f,
            "{:<22} {:>10} {:>16} {:>16} {:>12} {:>12} {:>12} {:>12} {:>12}",
            s.column,
            s.count,
            format_stat(Some(s.mean)),
            format_stat(s.std),
            format_stat(Some(s.min)),
            format_stat(Some(s.p25)),
            format_stat(Some(s.p50)),
            format_stat(Some(s.p75)),
            format_stat(Some(s.max)),
        )?;
    }
    Ok(())
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Full Data from {} ---", self.source)?;
        writeln!(f, "Total Rows (Candidates/Results): {}", self.rows)?;
        writeln!(f, "Total Columns (Variables): {}", self.columns)?;
        rule(f)?;

        writeln!(f, "A. Column Data Types and Non-Null Counts:")?;
        writeln!(
            f,
            " {:>3}  {:<24} {:>16}  {:<8} {:>12}",
            "#", "Column", "Non-Null Count", "Dtype", "Memory"
        )?;
        for (i, col) in self.schema.iter().enumerate() {
            writeln!(
                f,
                " {:>3}  {:<24} {:>7} non-null  {:<8} {:>12}",
                i,
                col.name,
                col.non_null,
                col.dtype,
                format_bytes(col.memory_bytes)
            )?;
        }
        writeln!(f, "memory usage: {}", format_bytes(self.total_memory_bytes))?;
        rule(f)?;

        writeln!(f, "B. Scope of Election Data:")?;
        if let Some(scope) = &self.year_scope {
            match scope.range() {
                Some((first, last)) => writeln!(
                    f,
                    "  - Unique Years Present: {} ({} to {})",
                    scope.count(),
                    first,
                    last
                )?,
                None => writeln!(f, "  - Unique Years Present: 0 (no numeric values in '{}')", scope.column)?,
            }
        }
        if let Some(types) = &self.election_types {
            writeln!(f, "  - Election Types and Counts:")?;
            for vc in types {
                writeln!(f, "      {:<8} {}", vc.value, vc.count)?;
            }
            writeln!(f, "    (Note: 'AE' is Assembly Election, 'GE' is General Election.)")?;
        }
        if let Some(states) = self.state_count {
            writeln!(f, "  - Number of Unique States/UTs: {}", states)?;
        }
        rule(f)?;

        writeln!(f, "C. Statistical Summary of Key Numerical Metrics:")?;
        if self.statistics.is_empty() {
            writeln!(f, "No key numerical columns found for summary.")?;
        } else {
            write_statistics(f, &self.statistics)?;
        }
        Ok(())
    }
}

impl fmt::Display for CleaningSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f, "CLEANING COMPLETE")?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(
            f,
            "Rows: {} read, {} outside year window, {} written",
            self.rows_read, self.rows_filtered_out, self.rows_written
        )?;
        writeln!(f, "Columns: {}", self.columns_written.join(", "))?;
        if let Some(path) = &self.output_path {
            writeln!(f, "Output: {}", path)?;
        }
        if let Some(stored) = self.rows_stored {
            writeln!(f, "Stored: {} rows", stored)?;
        }
        writeln!(f, "Duration: {}ms", self.duration_ms)?;
        writeln!(f)?;
        writeln!(f, "Steps:")?;
        for step in &self.steps {
            writeln!(f, "  - {}", step)?;
        }
        Ok(())
    }
}

/// Render an analysis report as text.
pub fn render_report(report: &AnalysisReport) -> String {
    report.to_string()
}

/// Render a cleaning summary as text.
pub fn render_cleaning_summary(summary: &CleaningSummary) -> String {
    summary.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{ColumnSchema, ValueCount, YearScope};

    fn sample_report() -> AnalysisReport {
        AnalysisReport {
            source: "cleaned.csv".to_string(),
            generated_at: "2024-01-01 00:00:00".to_string(),
            rows: 2,
            columns: 2,
            schema: vec![
                ColumnSchema {
                    name: "Year".to_string(),
                    dtype: "i64".to_string(),
                    non_null: 2,
                    memory_bytes: 16,
                },
                ColumnSchema {
                    name: "Votes".to_string(),
                    dtype: "i64".to_string(),
                    non_null: 2,
                    memory_bytes: 16,
                },
            ],
            total_memory_bytes: 32,
            year_scope: Some(YearScope {
                column: "Year".to_string(),
                years: vec![2009, 2014],
            }),
            election_types: Some(vec![ValueCount {
                value: "GE".to_string(),
                count: 2,
            }]),
            state_count: Some(1),
            statistics: vec![ColumnStatistics {
                column: "Votes".to_string(),
                count: 2,
                mean: 15.0,
                std: None,
                min: 10.0,
                p25: 12.5,
                p50: 15.0,
                p75: 17.5,
                max: 20.0,
            }],
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_render_report_sections() {
        let text = render_report(&sample_report());

        assert!(text.contains("Total Rows (Candidates/Results): 2"));
        assert!(text.contains("A. Column Data Types"));
        assert!(text.contains("Unique Years Present: 2 (2009 to 2014)"));
        assert!(text.contains("Number of Unique States/UTs: 1"));
        assert!(text.contains("C. Statistical Summary"));
        assert!(text.contains("15.000000"));
        // single-value std renders as NaN
        assert!(text.contains("NaN"));
    }

    #[test]
    fn test_render_report_without_stats() {
        let mut report = sample_report();
        report.statistics.clear();
        report.election_types = None;

        let text = render_report(&report);
        assert!(text.contains("No key numerical columns found for summary."));
        assert!(!text.contains("Election Types"));
    }

    #[test]
    fn test_render_cleaning_summary() {
        let summary = CleaningSummary {
            rows_read: 10,
            rows_filtered_out: 3,
            rows_written: 7,
            columns_written: vec!["Year".to_string(), "Sex".to_string()],
            output_path: Some("out.csv".to_string()),
            steps: vec!["Flagged 2 winners".to_string()],
            ..Default::default()
        };

        let text = render_cleaning_summary(&summary);
        assert!(text.contains("Rows: 10 read, 3 outside year window, 7 written"));
        assert!(text.contains("Columns: Year, Sex"));
        assert!(text.contains("Output: out.csv"));
        assert!(text.contains("  - Flagged 2 winners"));
        assert!(!text.contains("Stored:"));
    }
}
