//! Batch delivery.
//!
//! One attempt per invocation:
//!
//! ```text
//! job id ─▶ dataset? ─▶ table? ─▶ insertAll ─▶ outcome ─▶ audit row
//!              │           │          │
//!              └───────────┴──────────┴──▶ failure outcome ─▶ audit row
//! ```
//!
//! Every branch ends with exactly one audit row. There is no retry and no
//! partial success: a single rejected row fails the whole batch.

pub mod audit;

use chrono::Utc;
use std::time::Instant;

use crate::config::Destination;
use crate::error::{LoaderError, LoaderResult};
use crate::logs::{log_error, log_info, log_success};
use crate::models::{BatchOutcome, EventDocument, LogRecord};
use crate::warehouse::{TableRef, Warehouse};

pub use audit::write_log;

/// Random job identifier: 8 bytes, hex encoded.
pub fn new_job_id() -> String {
    hex::encode(rand::random::<[u8; 8]>())
}

/// Result of a delivery call that reached the audit step.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub job_id: String,
    pub outcome: BatchOutcome,
}

/// Tag `documents` with a fresh job id, insert them into the events table and
/// write the audit row.
///
/// When the delivery fails its error is returned even if the audit write
/// failed as well; the audit failure is only reported on the log channel.
pub async fn deliver<W: Warehouse>(
    warehouse: &W,
    documents: &mut [EventDocument],
    destination: &Destination,
) -> LoaderResult<Delivery> {
    let job_id = new_job_id();
    for document in documents.iter_mut() {
        document.assign_job_id(&job_id);
    }

    let table = destination.events_table();
    log_info(format!("Uploading data to {} (job {})...", table, job_id));

    let result = insert_batch(warehouse, documents, &table).await;
    let outcome = match &result {
        Ok(outcome) => {
            log_success(&outcome.message);
            outcome.clone()
        }
        Err(e) => {
            log_error(e.to_string());
            BatchOutcome::failed(e.to_string())
        }
    };

    let record = LogRecord::from_outcome(&job_id, &outcome, Utc::now());
    let logged = write_log(warehouse, &destination.log_table_ref(), &record).await;

    match (result, logged) {
        (Ok(outcome), Ok(())) => Ok(Delivery { job_id, outcome }),
        (Ok(_), Err(log_err)) => {
            log_error(log_err.to_string());
            Err(log_err)
        }
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(log_err)) => {
            log_error(log_err.to_string());
            Err(e)
        }
    }
}

async fn insert_batch<W: Warehouse>(
    warehouse: &W,
    documents: &[EventDocument],
    table: &TableRef,
) -> LoaderResult<BatchOutcome> {
    let dataset_missing = format!("Dataset {} not found in project {}", table.dataset, table.project);
    match warehouse.dataset_exists(&table.project, &table.dataset).await {
        Ok(true) => {}
        Ok(false) => return Err(LoaderError::DestinationNotFound(format!("{}.", dataset_missing))),
        Err(e) => return Err(LoaderError::DestinationNotFound(format!("{}: {}", dataset_missing, e))),
    }

    let table_missing = format!("Table {} not found in dataset {}", table.table, table.dataset);
    match warehouse.table_exists(table).await {
        Ok(true) => {}
        Ok(false) => return Err(LoaderError::DestinationNotFound(format!("{}.", table_missing))),
        Err(e) => return Err(LoaderError::DestinationNotFound(format!("{}: {}", table_missing, e))),
    }

    let upload_failed = |detail: String| LoaderError::InsertFailed(format!("Error during data upload to {}: {}", table, detail));

    if documents.is_empty() {
        return Err(upload_failed("No rows to insert".to_string()));
    }

    let rows = documents
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| upload_failed(e.to_string()))?;

    let start = Instant::now();
    let errors = warehouse
        .insert_rows(table, &rows)
        .await
        .map_err(|e| upload_failed(e.to_string()))?;

    if !errors.is_empty() {
        let detail = serde_json::to_string_pretty(&errors).unwrap_or_else(|_| format!("{:?}", errors));
        return Err(upload_failed(format!("insert failed with errors: {}", detail)));
    }

    let execution_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(BatchOutcome::succeeded(
        format!("Data successfully uploaded to {}", table),
        documents.len(),
        execution_time_ms,
    ))
}
