// src/config.rs

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::{EtlError, EtlResult};
use crate::extract::ExtractOptions;
use crate::fetch::Location;
use crate::query::{default_queries, OutputFormat};

pub const DEFAULT_SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";
pub const DEFAULT_RATES_LOCATION: &str = "https://cf-courses-data.s3.us.cloud-object-storage.appdomain.cloud/IBMSkillsNetwork-PY0221EN-Coursera/labs/v2/exchange_rate.csv";
pub const DEFAULT_OUTPUT_CSV: &str = "./Largest_banks_data.csv";
pub const DEFAULT_DB_PATH: &str = "Banks.db";
pub const DEFAULT_TABLE_NAME: &str = "Largest_banks";
pub const DEFAULT_LOG_PATH: &str = "code_log.txt";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything a run needs. Every field has a default, so a YAML file only has to
/// name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source_url: String,
    pub rates_location: String,
    pub output_csv: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub log_path: PathBuf,
    pub timeout_secs: u64,
    /// Empty means the three default reports.
    pub queries: Vec<String>,
    pub format: OutputFormat,
    pub extract: ExtractOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            rates_location: DEFAULT_RATES_LOCATION.to_string(),
            output_csv: PathBuf::from(DEFAULT_OUTPUT_CSV),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            queries: Vec::new(),
            format: OutputFormat::default(),
            extract: ExtractOptions::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_file(path: &Path) -> EtlResult<Self> {
        let location = path.display().to_string();
        let text = fs::read_to_string(path)
            .map_err(|e| EtlError::config(&location, format!("reading config: {}", e)))?;
        Self::from_yaml_str(&text, &location)
    }

    pub fn from_yaml_str(text: &str, location: &str) -> EtlResult<Self> {
        serde_yaml::from_str(text).map_err(|e| EtlError::config(location, e.to_string()))
    }

    pub fn validate(&self) -> EtlResult<()> {
        let fail = |reason: String| Err(EtlError::config("configuration", reason));

        if !is_identifier(&self.table_name) {
            return fail(format!(
                "table name {:?} must match [A-Za-z_][A-Za-z0-9_]*",
                self.table_name
            ));
        }
        if self.timeout_secs == 0 {
            return fail("timeout_secs must be greater than zero".into());
        }
        if self.source_url.trim().is_empty() || self.rates_location.trim().is_empty() {
            return fail("source_url and rates_location must be set".into());
        }
        if self.extract.name_cell == self.extract.value_cell {
            return fail("extract.name_cell and extract.value_cell must differ".into());
        }
        Ok(())
    }

    /// Queries to run after loading.
    pub fn queries(&self) -> Vec<String> {
        if self.queries.is_empty() {
            default_queries(&self.table_name)
        } else {
            self.queries.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn source(&self) -> Location {
        Location::parse(&self.source_url)
    }

    pub fn rates(&self) -> Location {
        Location::parse(&self.rates_location)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
