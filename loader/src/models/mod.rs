//! Domain models for the batch loader.
//!
//! - [`RawRecord`] - one source line, column name to raw text
//! - [`TypedValue`] - coerced scalar with at most one active branch
//! - [`ConsentValue`] - consent group value (string branch only)
//! - [`NamedValue`] - one decomposed `<group>.<field>` cell
//! - [`EventDocument`] - the row shape inserted into the events table
//! - [`BatchOutcome`] / [`LogRecord`] - delivery result and its audit row

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Provenance tag stamped on every document produced by this loader.
pub const EVENT_ORIGIN: &str = "Batch data loader";

// =============================================================================
// Raw Record
// =============================================================================

/// One source line: column name to raw cell text, in header order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    cells: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.push((column.into(), value.into()));
    }

    /// Exact-key lookup.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// =============================================================================
// Typed Value
// =============================================================================

/// A coerced cell value.
///
/// Serialized as `{"int", "float", "string", "json"}` with every inactive
/// branch set to `null`, which is the record layout of the `value` column in
/// the events table.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypedValue {
    /// Empty cell: every branch null.
    #[default]
    Null,
    Int(i64),
    Float(f64),
    String(String),
    /// Canonical JSON text.
    Json(String),
}

impl TypedValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            TypedValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            TypedValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&str> {
        match self {
            TypedValue::Json(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serializer.serialize_struct("TypedValue", 4)?;
        value.serialize_field("int", &self.as_int())?;
        value.serialize_field("float", &self.as_float())?;
        value.serialize_field("string", &self.as_string())?;
        value.serialize_field("json", &self.as_json())?;
        value.end()
    }
}

/// Consent cells only ever populate the string branch.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConsentValue {
    pub string: Option<String>,
}

// =============================================================================
// Named Value
// =============================================================================

/// One entry of a repeated group: field name plus its coerced value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue<V = TypedValue> {
    pub name: String,
    pub value: V,
}

impl<V> NamedValue<V> {
    pub fn new(name: impl Into<String>, value: V) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

// =============================================================================
// Event Document
// =============================================================================

/// Identifier column that differs between the two table layouts.
///
/// Flattened into the document, so it serializes as a plain
/// `"event_id": ..` or `"user_id": ..` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecordKey {
    #[serde(rename = "event_id")]
    EventId(Option<String>),
    #[serde(rename = "user_id")]
    UserId(Option<String>),
}

/// One row of the events table.
///
/// Created with `job_id = None`; the delivery client stamps the batch job id
/// on every document right before the insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDocument {
    pub event_date: Option<String>,
    pub event_datetime: Option<String>,
    pub event_timestamp: Option<String>,
    /// Milliseconds since epoch at transformation time.
    pub processing_event_timestamp: i64,
    pub event_origin: String,
    pub job_id: Option<String>,
    pub content_length: Option<String>,
    pub client_id: Option<String>,
    #[serde(flatten)]
    pub key: RecordKey,
    pub session_id: Option<String>,
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<Vec<NamedValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_data: Option<Vec<NamedValue>>,
    pub event_data: Vec<NamedValue>,
    pub consent_data: Vec<NamedValue<ConsentValue>>,
}

impl EventDocument {
    /// Tag this document with the batch job id.
    pub fn assign_job_id(&mut self, job_id: &str) {
        self.job_id = Some(job_id.to_string());
    }
}

// =============================================================================
// Outcome & Audit Record
// =============================================================================

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub success: bool,
    pub message: String,
    pub rows_inserted: usize,
    pub execution_time_ms: Option<u64>,
}

impl BatchOutcome {
    pub fn succeeded(message: impl Into<String>, rows_inserted: usize, execution_time_ms: u64) -> Self {
        Self {
            success: true,
            message: message.into(),
            rows_inserted,
            execution_time_ms: Some(execution_time_ms),
        }
    }

    /// A failed attempt never reports inserted rows, even when the backend
    /// accepted some of them.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            rows_inserted: 0,
            execution_time_ms: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogStatus {
    Success,
    Failure,
}

/// One row of the audit log table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `YYYY-MM-DDTHH:MM:SS`
    pub datetime: String,
    /// Milliseconds since epoch.
    pub timestamp: i64,
    pub job_id: String,
    pub status: LogStatus,
    pub message: String,
    /// The audit table names this column `execution_time_micros`; it holds
    /// milliseconds.
    #[serde(rename = "execution_time_micros")]
    pub execution_time_ms: Option<u64>,
    pub rows_inserted: usize,
}

impl LogRecord {
    pub fn from_outcome(job_id: &str, outcome: &BatchOutcome, now: DateTime<Utc>) -> Self {
        Self {
            date: now.format("%Y-%m-%d").to_string(),
            datetime: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
            timestamp: now.timestamp_millis(),
            job_id: job_id.to_string(),
            status: if outcome.success {
                LogStatus::Success
            } else {
                LogStatus::Failure
            },
            message: outcome.message.clone(),
            execution_time_ms: outcome.execution_time_ms,
            rows_inserted: outcome.rows_inserted,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_document(key: RecordKey) -> EventDocument {
        EventDocument {
            event_date: Some("2024-05-01".into()),
            event_datetime: None,
            event_timestamp: Some("1714521600000".into()),
            processing_event_timestamp: 1,
            event_origin: EVENT_ORIGIN.into(),
            job_id: None,
            content_length: None,
            client_id: Some("c1".into()),
            key,
            session_id: Some("s1".into()),
            event_name: Some("page_view".into()),
            user_data: None,
            session_data: None,
            event_data: vec![NamedValue::new("foo", TypedValue::String("bar".into()))],
            consent_data: vec![],
        }
    }

    #[test]
    fn test_typed_value_serializes_all_branches() {
        let value = serde_json::to_value(TypedValue::Int(42)).unwrap();
        assert_eq!(value, json!({"int": 42, "float": null, "string": null, "json": null}));

        let value = serde_json::to_value(TypedValue::Null).unwrap();
        assert_eq!(value, json!({"int": null, "float": null, "string": null, "json": null}));
    }

    #[test]
    fn test_record_key_is_flattened() {
        let doc = sample_document(RecordKey::UserId(Some("u1".into())));
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["user_id"], "u1");
        assert!(value.get("event_id").is_none());
        assert!(value.get("user_data").is_none());
        assert!(value.get("session_data").is_none());
        assert_eq!(value["event_data"][0]["name"], "foo");
        assert!(value["job_id"].is_null());
    }

    #[test]
    fn test_missing_event_id_serializes_as_null() {
        let doc = sample_document(RecordKey::EventId(None));
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.as_object().unwrap().contains_key("event_id"));
        assert!(value["event_id"].is_null());
    }

    #[test]
    fn test_log_record_from_failed_outcome() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let outcome = BatchOutcome::failed("boom");
        let record = LogRecord::from_outcome("abcd", &outcome, now);

        assert_eq!(record.status, LogStatus::Failure);
        assert_eq!(record.date, "2024-05-01");
        assert_eq!(record.datetime, "2024-05-01T09:30:00");
        assert_eq!(record.rows_inserted, 0);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "Failure");
        assert!(value["execution_time_micros"].is_null());
    }
}
