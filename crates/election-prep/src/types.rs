//! Core types and column tables for the election results dataset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Column names
// ============================================================================

pub const YEAR: &str = "Year";
pub const STATE_NAME: &str = "State_Name";
pub const CONSTITUENCY_NAME: &str = "Constituency_Name";
pub const CONSTITUENCY_NO: &str = "Constituency_No";
pub const PARTY: &str = "Party";
pub const CANDIDATE: &str = "Candidate";
pub const SEX: &str = "Sex";
pub const VOTES: &str = "Votes";
pub const VALID_VOTES: &str = "Valid_Votes";
pub const ELECTORS: &str = "Electors";
pub const TURNOUT_PERCENTAGE: &str = "Turnout_Percentage";
pub const VOTE_SHARE_PERCENTAGE: &str = "Vote_Share_Percentage";
pub const MARGIN: &str = "Margin";
pub const POSITION: &str = "Position";
pub const IS_WINNER: &str = "Is_Winner";
pub const PARTY_TYPE_TCPD: &str = "Party_Type_TCPD";
pub const MYNETA_EDUCATION: &str = "MyNeta_education";
pub const SUB_REGION: &str = "Sub_Region";
pub const CANDIDATE_TYPE: &str = "Candidate_Type";
pub const ELECTION_TYPE: &str = "Election_Type";

/// Columns the cleaner reads unconditionally.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    YEAR,
    SEX,
    PARTY,
    CONSTITUENCY_NAME,
    VOTES,
    ELECTORS,
    VALID_VOTES,
    MARGIN,
    POSITION,
    STATE_NAME,
];

/// Categorical columns and the value substituted for missing cells.
pub const CATEGORICAL_DEFAULTS: [(&str, &str); 4] = [
    (SEX, "UNKNOWN"),
    (PARTY, "INDEPENDENT"),
    (CONSTITUENCY_NAME, "UNKNOWN"),
    (SUB_REGION, "UNKNOWN"),
];

/// Count columns coerced to integers, missing or unparsable values become 0.
pub const NUMERIC_COLUMNS: [&str; 4] = [VOTES, ELECTORS, VALID_VOTES, MARGIN];

/// Free-text columns that get trimmed and uppercased when present.
pub const TEXT_COLUMNS: [&str; 7] = [
    STATE_NAME,
    CONSTITUENCY_NAME,
    PARTY,
    CANDIDATE,
    SEX,
    CANDIDATE_TYPE,
    MYNETA_EDUCATION,
];

/// Output column order of the cleaned file.
pub const OUTPUT_COLUMNS: [&str; 17] = [
    YEAR,
    STATE_NAME,
    CONSTITUENCY_NAME,
    CONSTITUENCY_NO,
    PARTY,
    CANDIDATE,
    SEX,
    VOTES,
    VALID_VOTES,
    ELECTORS,
    TURNOUT_PERCENTAGE,
    VOTE_SHARE_PERCENTAGE,
    MARGIN,
    POSITION,
    IS_WINNER,
    PARTY_TYPE_TCPD,
    MYNETA_EDUCATION,
];

/// Numeric columns summarised by the analyzer.
pub const DESCRIBE_COLUMNS: [&str; 6] = [
    POSITION,
    VOTES,
    VALID_VOTES,
    ELECTORS,
    TURNOUT_PERCENTAGE,
    MARGIN,
];

/// Historical state spellings and their current official names.
pub const STATE_ALIASES: [(&str, &str); 4] = [
    ("ORISSA", "ODISHA"),
    ("PONDICHERRY", "PUDUCHERRY"),
    ("UTTARANCHAL", "UTTARAKHAND"),
    ("CHHATISGARH", "CHHATTISGARH"),
];

// ============================================================================
// Sex
// ============================================================================

/// Canonical candidate sex values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    /// Third gender, recorded as "O" in the source data.
    Other,
    Unknown,
}

impl Sex {
    /// Uppercase label written to the cleaned file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "MALE",
            Sex::Female => "FEMALE",
            Sex::Other => "O",
            Sex::Unknown => "UNKNOWN",
        }
    }

    /// Map an already-uppercased label onto the canonical set.
    ///
    /// Short codes are expanded, anything unrecognised is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "MALE" | "M" => Sex::Male,
            "FEMALE" | "F" => Sex::Female,
            "O" => Sex::Other,
            _ => Sex::Unknown,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Sex::from_label(&s.trim().to_uppercase()))
    }
}

// ============================================================================
// Cleaning summary
// ============================================================================

/// What a cleaning run did, suitable for logging or `--json` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    /// Rows read from the raw input
    pub rows_read: usize,
    /// Rows dropped by the year filter
    pub rows_filtered_out: usize,
    /// Rows in the cleaned output
    pub rows_written: usize,
    /// Columns in the cleaned output, in order
    pub columns_written: Vec<String>,
    /// Missing categorical cells replaced with a default, per column
    pub nulls_filled: BTreeMap<String, usize>,
    /// Numeric cells that could not be parsed and became 0, per column
    pub values_coerced: BTreeMap<String, usize>,
    /// Turnout values clamped down to 100
    pub turnout_clamped: usize,
    /// Sex values changed by canonicalization
    pub sex_remapped: usize,
    /// State names changed by alias canonicalization
    pub states_renamed: usize,
    /// Human-readable log of every step
    pub steps: Vec<String>,
    /// Where the cleaned file was written, if it was
    pub output_path: Option<String>,
    /// Rows loaded into the relational table, if a load ran
    pub rows_stored: Option<usize>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}
