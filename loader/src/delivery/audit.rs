//! Audit log writes.

use crate::error::{LoaderError, LoaderResult};
use crate::logs::{log_info, log_success};
use crate::models::LogRecord;
use crate::warehouse::{TableRef, Warehouse};

/// Append one audit row. Any transport fault or row error is returned as
/// [`LoaderError::LoggingFailed`]; the entry is never dropped silently.
pub async fn write_log<W: Warehouse>(warehouse: &W, log_table: &TableRef, record: &LogRecord) -> LoaderResult<()> {
    log_info(format!("Writing job logs to {}...", log_table));

    let failed = |detail: String| LoaderError::LoggingFailed(format!("Failed to write log to {}: {}", log_table, detail));

    let row = serde_json::to_value(record).map_err(|e| failed(e.to_string()))?;
    let errors = warehouse
        .insert_rows(log_table, std::slice::from_ref(&row))
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !errors.is_empty() {
        let detail = serde_json::to_string(&errors).unwrap_or_else(|_| format!("{:?}", errors));
        return Err(failed(detail));
    }

    log_success(format!("Log successfully written to {}", log_table));
    Ok(())
}
