//! # Nameless Loader - batch event loading into BigQuery
//!
//! Reads a CSV export of analytics events, reshapes every row into the nested
//! event document of the Nameless Analytics `events_raw` table and appends the
//! whole file as one batch, followed by one audit row.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Schema    │────▶│  Transform  │────▶│  Delivery   │
//! │   (UTF-8)   │     │  (header)   │     │ (per row)   │     │ (insertAll) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                                    │
//!                                                             ┌──────▼──────┐
//!                                                             │  Audit log  │
//!                                                             └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nameless_loader::{run, Destination, LoaderConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = LoaderConfig::new("events.csv", Destination::new("my-project", "analytics"));
//!     let delivery = run(&config).await.unwrap();
//!     println!("Inserted {} rows", delivery.outcome.rows_inserted);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Layered error types
//! - [`models`] - Records, typed values, event documents, audit rows
//! - [`schema`] - Table layouts and header validation
//! - [`parser`] - CSV source reader
//! - [`transform`] - Coercion, row transformation, batch assembly
//! - [`warehouse`] - Warehouse trait and BigQuery client
//! - [`delivery`] - Batch delivery and audit logging
//! - [`config`] - Run configuration
//! - [`pipeline`] - End-to-end run
//! - [`logs`] - Progress log channel

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;
pub mod schema;

// Reading & transformation
pub mod parser;
pub mod transform;

// Delivery
pub mod delivery;
pub mod warehouse;

// Orchestration
pub mod pipeline;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{
    ConfigError,
    CredentialsError,
    LoaderError,
    LoaderResult,
    TransformError,
    WarehouseError,
};

// =============================================================================
// Re-exports - Models & Schema
// =============================================================================

pub use models::{
    BatchOutcome,
    ConsentValue,
    EventDocument,
    LogRecord,
    LogStatus,
    NamedValue,
    RawRecord,
    RecordKey,
    TypedValue,
    EVENT_ORIGIN,
};

pub use schema::{Group, SchemaDescriptor, SchemaVariant};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use parser::SourceReader;

pub use transform::{
    assemble_batch,
    assemble_from_reader,
    coerce,
    coerce_consent,
    transform_record,
    Batch,
};

// =============================================================================
// Re-exports - Delivery
// =============================================================================

pub use delivery::{deliver, new_job_id, write_log, Delivery};

pub use warehouse::{AccessToken, BigQueryClient, Credentials, TableRef, Warehouse};

// =============================================================================
// Re-exports - Configuration & Run
// =============================================================================

pub use config::{Destination, LoaderConfig};

pub use pipeline::{prepare, run, run_with};
