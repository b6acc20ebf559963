//! Run configuration.
//!
//! Everything a run needs is carried by [`LoaderConfig`] and passed into
//! [`crate::pipeline::run`]; nothing is read from process-wide state once the
//! CLI has built it.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::schema::SchemaVariant;
use crate::warehouse::{TableRef, DEFAULT_API_BASE_URL};

pub const DEFAULT_TABLE: &str = "events_raw";
pub const DEFAULT_LOG_TABLE: &str = "batch_data_loader_logs";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where events and the audit row go. Both tables live in the same dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub project: String,
    pub dataset: String,
    pub table: String,
    pub log_table: String,
}

impl Destination {
    /// Destination with the default events and log table names.
    pub fn new(project: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: DEFAULT_TABLE.to_string(),
            log_table: DEFAULT_LOG_TABLE.to_string(),
        }
    }

    pub fn with_tables(mut self, table: impl Into<String>, log_table: impl Into<String>) -> Self {
        self.table = table.into();
        self.log_table = log_table.into();
        self
    }

    pub fn events_table(&self) -> TableRef {
        TableRef::new(&self.project, &self.dataset, &self.table)
    }

    pub fn log_table_ref(&self) -> TableRef {
        TableRef::new(&self.project, &self.dataset, &self.log_table)
    }
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub source_path: PathBuf,
    pub destination: Destination,
    pub variant: SchemaVariant,
    pub delimiter: char,
    /// Service-account key or token file; `None` falls back to
    /// `BIGQUERY_ACCESS_TOKEN`.
    pub credentials_path: Option<PathBuf>,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl LoaderConfig {
    pub fn new(source_path: impl Into<PathBuf>, destination: Destination) -> Self {
        Self {
            source_path: source_path.into(),
            destination,
            variant: SchemaVariant::default(),
            delimiter: ',',
            credentials_path: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.destination;
        for (name, value) in [
            ("project", &d.project),
            ("dataset", &d.dataset),
            ("table", &d.table),
            ("log_table", &d.log_table),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(name));
            }
        }
        delimiter_byte(self.delimiter)?;
        Ok(())
    }

    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        delimiter_byte(self.delimiter)
    }
}

/// The CSV reader splits on a single byte.
pub fn delimiter_byte(delimiter: char) -> Result<u8, ConfigError> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(ConfigError::Delimiter(delimiter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::new("events.csv", Destination::new("p", "d"));
        assert_eq!(config.destination.table, "events_raw");
        assert_eq!(config.destination.log_table, "batch_data_loader_logs");
        assert_eq!(config.variant, SchemaVariant::Standard);
        assert_eq!(config.delimiter_byte().unwrap(), b',');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_table_refs() {
        let dest = Destination::new("p", "d").with_tables("events", "logs");
        assert_eq!(dest.events_table().to_string(), "p.d.events");
        assert_eq!(dest.log_table_ref().to_string(), "p.d.logs");
    }

    #[test]
    fn test_rejects_blank_identifiers() {
        let config = LoaderConfig::new("events.csv", Destination::new("p", " "));
        assert!(matches!(config.validate(), Err(ConfigError::Empty("dataset"))));
    }

    #[test]
    fn test_rejects_non_ascii_delimiter() {
        let mut config = LoaderConfig::new("events.csv", Destination::new("p", "d"));
        config.delimiter = '§';
        assert!(matches!(config.validate(), Err(ConfigError::Delimiter('§'))));
    }
}
