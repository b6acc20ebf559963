//! End-to-end run: source file to warehouse.
//!
//! ```text
//! ┌──────────┐    ┌────────────┐    ┌────────────┐    ┌───────────┐
//! │ CSV file │───▶│  Assemble  │───▶│  Deliver   │───▶│ Audit row │
//! │          │    │ (per row)  │    │ (1 insert) │    │           │
//! └──────────┘    └────────────┘    └────────────┘    └───────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use nameless_loader::{run, Destination, LoaderConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = LoaderConfig::new("events.csv", Destination::new("my-project", "analytics"));
//!     let delivery = run(&config).await.unwrap();
//!     println!("{} rows, job {}", delivery.outcome.rows_inserted, delivery.job_id);
//! }
//! ```

use std::time::Duration;

use crate::config::LoaderConfig;
use crate::delivery::{deliver, Delivery};
use crate::error::{LoaderError, LoaderResult};
use crate::logs::log_info;
use crate::transform::{assemble_batch, Batch};
use crate::warehouse::{BigQueryClient, Credentials, Warehouse};

/// Run one batch against BigQuery.
///
/// The source is assembled before credentials are loaded, so a missing or
/// malformed file never reaches the network.
pub async fn run(config: &LoaderConfig) -> LoaderResult<Delivery> {
    config.validate()?;
    let mut batch = prepare(config)?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| LoaderError::Client(e.to_string()))?;
    let token = Credentials::resolve(config.credentials_path.as_deref())?
        .access_token(&http)
        .await?;
    let client = BigQueryClient::new(http, token, &config.api_base_url)
        .map_err(|e| LoaderError::Client(e.to_string()))?;

    send(&client, &mut batch, config).await
}

/// Run one batch against any warehouse.
pub async fn run_with<W: Warehouse>(config: &LoaderConfig, warehouse: &W) -> LoaderResult<Delivery> {
    config.validate()?;
    let mut batch = prepare(config)?;
    send(warehouse, &mut batch, config).await
}

/// Assemble the batch without delivering it.
pub fn prepare(config: &LoaderConfig) -> LoaderResult<Batch> {
    log_info("Prepare payload");
    assemble_batch(
        &config.source_path,
        config.variant.descriptor(),
        config.delimiter_byte()?,
    )
}

async fn send<W: Warehouse>(warehouse: &W, batch: &mut Batch, config: &LoaderConfig) -> LoaderResult<Delivery> {
    log_info("Send to BigQuery");
    deliver(warehouse, &mut batch.documents, &config.destination).await
}
