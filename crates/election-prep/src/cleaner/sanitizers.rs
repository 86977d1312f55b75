//! Text steps of the cleaning pipeline: null defaults, case/whitespace
//! normalization and the Sex / state-name remaps.

use crate::error::Result;
use crate::types::{CATEGORICAL_DEFAULTS, SEX, STATE_ALIASES, STATE_NAME, Sex, TEXT_COLUMNS};
use crate::utils::{has_column, string_values};
use once_cell::sync::Lazy;
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// What a missing cell reads as once rendered to text.
pub const MISSING_TEXT: &str = "NAN";

static STATE_ALIAS_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| STATE_ALIASES.into_iter().collect());

/// Replace missing Sex, Party, Constituency_Name and Sub_Region cells with
/// their defaults. Absent columns are skipped.
///
/// Null and empty-string cells both count as missing. Returns, per column,
/// how many cells were filled.
pub fn fill_categorical_nulls(df: &mut DataFrame) -> Result<BTreeMap<String, usize>> {
    let mut filled = BTreeMap::new();

    for (col_name, default) in CATEGORICAL_DEFAULTS {
        if !has_column(df, col_name) {
            debug!("Skipping null fill for absent column '{}'", col_name);
            continue;
        }

        let values = string_values(df.column(col_name)?.as_materialized_series())?;
        let mut count = 0;
        let replaced: Vec<String> = values
            .into_iter()
            .map(|v| match v {
                Some(s) if !s.is_empty() => s,
                _ => {
                    count += 1;
                    default.to_string()
                }
            })
            .collect();

        df.with_column(Series::new(col_name.into(), replaced))?;
        filled.insert(col_name.to_string(), count);
    }

    Ok(filled)
}

/// Trim and uppercase a single cell; missing cells become [`MISSING_TEXT`].
pub fn normalize_text(value: Option<&str>) -> String {
    match value {
        Some(s) => s.trim().to_uppercase(),
        None => MISSING_TEXT.to_string(),
    }
}

/// Trim and uppercase every present text column.
///
/// Returns the names of the columns that were normalized.
pub fn normalize_text_columns(df: &mut DataFrame) -> Result<Vec<String>> {
    let mut normalized = Vec::new();

    for col_name in TEXT_COLUMNS {
        if !has_column(df, col_name) {
            continue;
        }

        let values = string_values(df.column(col_name)?.as_materialized_series())?;
        let cleaned: Vec<String> = values
            .iter()
            .map(|v| normalize_text(v.as_deref()))
            .collect();

        df.with_column(Series::new(col_name.into(), cleaned))?;
        normalized.push(col_name.to_string());
    }

    Ok(normalized)
}

/// Collapse Sex onto MALE, FEMALE, O and UNKNOWN.
///
/// Expects values already uppercased. Returns how many cells changed.
pub fn canonicalize_sex(df: &mut DataFrame) -> Result<usize> {
    let values = string_values(df.column(SEX)?.as_materialized_series())?;
    let mut changed = 0;

    let canonical: Vec<&'static str> = values
        .iter()
        .map(|v| {
            let label = v.as_deref().unwrap_or(MISSING_TEXT);
            let sex = Sex::from_label(label).as_str();
            if sex != label {
                changed += 1;
            }
            sex
        })
        .collect();

    df.with_column(Series::new(SEX.into(), canonical))?;
    Ok(changed)
}

/// Current official name for a historical state spelling, if it has one.
pub fn canonical_state_name(name: &str) -> Option<&'static str> {
    STATE_ALIAS_MAP.get(name).copied()
}

/// Rewrite historical state spellings (ORISSA, PONDICHERRY, ...).
///
/// Matching is exact, so this must run after uppercasing. Returns how
/// many cells changed.
pub fn canonicalize_state_names(df: &mut DataFrame) -> Result<usize> {
    let values = string_values(df.column(STATE_NAME)?.as_materialized_series())?;
    let mut changed = 0;

    let renamed: Vec<Option<String>> = values
        .into_iter()
        .map(|v| {
            v.map(|name| match canonical_state_name(&name) {
                Some(official) => {
                    changed += 1;
                    official.to_string()
                }
                None => name,
            })
        })
        .collect();

    df.with_column(Series::new(STATE_NAME.into(), renamed))?;
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn str_column(df: &DataFrame, name: &str) -> Vec<String> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap_or("<null>").to_string())
            .collect()
    }

    #[test]
    fn test_fill_categorical_nulls() {
        let mut df = df!(
            "Sex" => &[Some("M"), None],
            "Party" => &[None, Some("BJP")],
            "Constituency_Name" => &[Some(""), Some("Puri")],
        )
        .unwrap();

        let filled = fill_categorical_nulls(&mut df).unwrap();

        assert_eq!(str_column(&df, "Sex"), vec!["M", "UNKNOWN"]);
        assert_eq!(str_column(&df, "Party"), vec!["INDEPENDENT", "BJP"]);
        assert_eq!(str_column(&df, "Constituency_Name"), vec!["UNKNOWN", "Puri"]);
        assert_eq!(filled["Sex"], 1);
        assert_eq!(filled["Constituency_Name"], 1);
        // Sub_Region is optional
        assert!(!filled.contains_key("Sub_Region"));
    }

    #[test]
    fn test_fill_sub_region_when_present() {
        let mut df = df!(
            "Sex" => &[Some("F")],
            "Party" => &[Some("INC")],
            "Constituency_Name" => &[Some("X")],
            "Sub_Region" => &[None::<&str>],
        )
        .unwrap();

        fill_categorical_nulls(&mut df).unwrap();
        assert_eq!(str_column(&df, "Sub_Region"), vec!["UNKNOWN"]);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(Some("  orissa ")), "ORISSA");
        assert_eq!(normalize_text(None), "NAN");
    }

    #[test]
    fn test_normalize_text_columns_skips_absent() {
        let mut df = df!(
            "State_Name" => &[Some(" Orissa"), None],
            "Candidate" => &[Some("a. b. rao "), Some("x")],
            "Votes" => &[1i64, 2],
        )
        .unwrap();

        let normalized = normalize_text_columns(&mut df).unwrap();

        assert_eq!(normalized, vec!["State_Name", "Candidate"]);
        assert_eq!(str_column(&df, "State_Name"), vec!["ORISSA", "NAN"]);
        assert_eq!(str_column(&df, "Candidate"), vec!["A. B. RAO", "X"]);
    }

    #[test]
    fn test_canonicalize_sex() {
        let mut df = df!(
            "Sex" => &["M", "F", "O", "NOTA", "NAN", "MALE", "THIRD", "UNKNOWN"]
        )
        .unwrap();

        let changed = canonicalize_sex(&mut df).unwrap();

        assert_eq!(
            str_column(&df, "Sex"),
            vec!["MALE", "FEMALE", "O", "UNKNOWN", "UNKNOWN", "MALE", "UNKNOWN", "UNKNOWN"]
        );
        assert_eq!(changed, 5);
    }

    #[test]
    fn test_canonicalize_state_names() {
        let mut df = df!(
            "State_Name" => &["ORISSA", "PONDICHERRY", "UTTARANCHAL", "CHHATISGARH", "BIHAR"]
        )
        .unwrap();

        let changed = canonicalize_state_names(&mut df).unwrap();

        assert_eq!(
            str_column(&df, "State_Name"),
            vec!["ODISHA", "PUDUCHERRY", "UTTARAKHAND", "CHHATTISGARH", "BIHAR"]
        );
        assert_eq!(changed, 4);
    }

    #[test]
    fn test_state_alias_is_case_sensitive() {
        assert_eq!(canonical_state_name("ORISSA"), Some("ODISHA"));
        assert_eq!(canonical_state_name("Orissa"), None);
    }
}
