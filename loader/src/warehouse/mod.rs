//! Warehouse access.
//!
//! [`Warehouse`] is the narrow surface the delivery protocol needs: existence
//! checks and a bulk JSON-rows append. [`BigQueryClient`] implements it over
//! the BigQuery REST API.

pub mod bigquery;
pub mod credentials;

#[cfg(test)]
pub(crate) mod memory;
#[cfg(test)]
pub(crate) mod stub;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::WarehouseResult;

pub use bigquery::{BigQueryClient, DEFAULT_API_BASE_URL};
pub use credentials::{AccessToken, Credentials, ServiceAccountKey};

/// Fully qualified table identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(project: impl Into<String>, dataset: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Errors reported by the backend for one inserted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowInsertError {
    /// Position of the row in the request.
    pub index: u64,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Destination store for event rows and audit rows.
///
/// Calls are made one at a time; implementations need not be shareable
/// across threads.
#[allow(async_fn_in_trait)]
pub trait Warehouse {
    async fn dataset_exists(&self, project: &str, dataset: &str) -> WarehouseResult<bool>;

    async fn table_exists(&self, table: &TableRef) -> WarehouseResult<bool>;

    /// Append `rows` in a single request. Returns the per-row errors the
    /// backend reported; an empty list means every row was accepted.
    async fn insert_rows(&self, table: &TableRef, rows: &[Value]) -> WarehouseResult<Vec<RowInsertError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_display() {
        let table = TableRef::new("tom-moretti", "nameless_analytics", "events_raw");
        assert_eq!(table.to_string(), "tom-moretti.nameless_analytics.events_raw");
    }

    #[test]
    fn test_row_error_wire_format() {
        let raw = r#"{"index": 2, "errors": [{"reason": "invalid", "location": "event_data", "debugInfo": "", "message": "no such field"}]}"#;
        let err: RowInsertError = serde_json::from_str(raw).unwrap();
        assert_eq!(err.index, 2);
        assert_eq!(err.errors[0].message.as_deref(), Some("no such field"));

        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["errors"][0]["debugInfo"], "");
    }
}
