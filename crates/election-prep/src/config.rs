//! Configuration types for the cleaner and the relational sink.
//!
//! Every setting has a default. Overrides come through
//! [`CleanerConfigBuilder`], [`CleanerConfig::from_json_file`] and
//! [`DatabaseConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CleaningError, Result, ResultExt};

pub const DEFAULT_INPUT_PATH: &str = "All_States_GE.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "cleaned_election_data.csv";
pub const DEFAULT_MIN_YEAR: i64 = 1991;
pub const DEFAULT_MAX_YEAR: i64 = 2019;
pub const DEFAULT_TABLE: &str = "election_data";

/// Connection parameters for the PostgreSQL sink.
///
/// `Debug` masks the password and the full URL.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Table replaced by each load.
    pub table: String,
    /// Require TLS (`sslmode=require`).
    pub ssl: bool,
    /// Full connection URL; wins over the individual fields when set.
    pub url: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "kadappa".to_string(),
            password: "kadappa".to_string(),
            database: "varahe".to_string(),
            table: DEFAULT_TABLE.to_string(),
            ssl: false,
            url: None,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("table", &self.table)
            .field("ssl", &self.ssl)
            .field("url", &self.url.as_ref().map(|_| "<DATABASE_URL>"))
            .finish()
    }
}

impl DatabaseConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL`: full connection string, overrides everything else
    /// - `DB_HOST` (default: localhost)
    /// - `DB_PORT` (default: 5432)
    /// - `DB_USER`, `DB_PASSWORD`, `DB_NAME`
    /// - `DB_TABLE` (default: election_data)
    /// - `DB_SSL` (`true` to require TLS)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env::var("DB_PORT") {
            Ok(v) => v.parse::<u16>().map_err(|_| {
                CleaningError::InvalidConfig(format!("DB_PORT must be a valid port number, got '{v}'"))
            })?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            host: env::var("DB_HOST").unwrap_or(defaults.host),
            port,
            user: env::var("DB_USER").unwrap_or(defaults.user),
            password: env::var("DB_PASSWORD").unwrap_or(defaults.password),
            database: env::var("DB_NAME").unwrap_or(defaults.database),
            table: env::var("DB_TABLE").unwrap_or(defaults.table),
            ssl: env::var("DB_SSL").map(|v| v == "true").unwrap_or(defaults.ssl),
            url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Connection URL in libpq form.
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let mut url = format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        );
        if self.ssl {
            url.push_str("?sslmode=require");
        }
        url
    }

    /// Same as [`database_url`](Self::database_url) with the password masked, for logs.
    pub fn redacted_url(&self) -> String {
        if self.url.is_some() {
            return "<DATABASE_URL>".to_string();
        }
        format!(
            "postgres://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

/// Configuration for a cleaning run.
///
/// Use [`CleanerConfig::builder()`] for a fluent setup, or
/// [`CleanerConfig::from_json_file`] to load overrides from disk.
///
/// # Example
///
/// ```rust,ignore
/// use election_prep::config::CleanerConfig;
///
/// let config = CleanerConfig::builder()
///     .input_path("data/All_States_GE.csv")
///     .output_path("out/cleaned.csv")
///     .year_range(1996, 2014)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    /// Raw results file.
    /// Default: "All_States_GE.csv"
    pub input_path: PathBuf,

    /// Where the cleaned file is written (overwritten if present).
    /// Default: "cleaned_election_data.csv"
    pub output_path: PathBuf,

    /// First election year kept, inclusive.
    /// Default: 1991
    pub min_year: i64,

    /// Last election year kept, inclusive.
    /// Default: 2019
    pub max_year: i64,

    /// Collapse Sex values onto MALE/FEMALE/O/UNKNOWN.
    /// When disabled, Sex is only trimmed and uppercased.
    /// Default: true
    pub canonicalize_sex: bool,

    /// Relational sink settings, used only when a load is requested.
    pub database: DatabaseConfig,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            min_year: DEFAULT_MIN_YEAR,
            max_year: DEFAULT_MAX_YEAR,
            canonicalize_sex: true,
            database: DatabaseConfig::default(),
        }
    }
}

impl CleanerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleanerConfigBuilder {
        CleanerConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CleaningError::InputNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)
            .context(format!("Reading config {}", path.display()))?;
        let config: CleanerConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| CleaningError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.min_year > self.max_year {
            return Err(ConfigValidationError::InvalidYearRange {
                min: self.min_year,
                max: self.max_year,
            });
        }

        if self.input_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyPath("input_path".to_string()));
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyPath("output_path".to_string()));
        }

        if !is_plain_identifier(&self.database.table) {
            return Err(ConfigValidationError::InvalidTableName(
                self.database.table.clone(),
            ));
        }

        Ok(())
    }
}

/// Table names are interpolated into DDL, so only `[A-Za-z_][A-Za-z0-9_]*` is accepted.
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid year range: {min} > {max}")]
    InvalidYearRange { min: i64, max: i64 },

    #[error("Path for '{0}' must not be empty")]
    EmptyPath(String),

    #[error("Invalid table name '{0}' (letters, digits and underscores only)")]
    InvalidTableName(String),
}

impl From<ConfigValidationError> for CleaningError {
    fn from(e: ConfigValidationError) -> Self {
        CleaningError::InvalidConfig(e.to_string())
    }
}

/// Builder for [`CleanerConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleanerConfigBuilder {
    base: Option<CleanerConfig>,
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    min_year: Option<i64>,
    max_year: Option<i64>,
    canonicalize_sex: Option<bool>,
    database: Option<DatabaseConfig>,
    table: Option<String>,
}

impl CleanerConfigBuilder {
    /// Start from an existing configuration (e.g. one loaded from JSON).
    pub fn base(mut self, config: CleanerConfig) -> Self {
        self.base = Some(config);
        self
    }

    /// Set the raw input file.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the cleaned output file.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the inclusive window of election years to keep.
    pub fn year_range(mut self, min: i64, max: i64) -> Self {
        self.min_year = Some(min);
        self.max_year = Some(max);
        self
    }

    /// Set only the first kept year.
    pub fn min_year(mut self, year: i64) -> Self {
        self.min_year = Some(year);
        self
    }

    /// Set only the last kept year.
    pub fn max_year(mut self, year: i64) -> Self {
        self.max_year = Some(year);
        self
    }

    /// Enable or disable Sex canonicalization.
    pub fn canonicalize_sex(mut self, enable: bool) -> Self {
        self.canonicalize_sex = Some(enable);
        self
    }

    /// Set the relational sink settings.
    pub fn database(mut self, database: DatabaseConfig) -> Self {
        self.database = Some(database);
        self
    }

    /// Override just the target table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleanerConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<CleanerConfig, ConfigValidationError> {
        let base = self.base.unwrap_or_default();
        let mut database = self.database.unwrap_or(base.database);
        if let Some(table) = self.table {
            database.table = table;
        }

        let config = CleanerConfig {
            input_path: self.input_path.unwrap_or(base.input_path),
            output_path: self.output_path.unwrap_or(base.output_path),
            min_year: self.min_year.unwrap_or(base.min_year),
            max_year: self.max_year.unwrap_or(base.max_year),
            canonicalize_sex: self.canonicalize_sex.unwrap_or(base.canonicalize_sex),
            database,
        };

        config.validate()?;
        Ok(config)
    }
}
