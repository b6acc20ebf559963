//! Error types for the batch loader.
//!
//! One enum per layer, converted upward with `From` so `?` works across
//! boundaries:
//!
//! - [`TransformError`] - header validation, CSV decoding and row faults
//! - [`CredentialsError`] - bearer token loading and key exchange
//! - [`WarehouseError`] - HTTP / API faults talking to BigQuery
//! - [`ConfigError`] - invalid run configuration
//! - [`LoaderError`] - top-level kinds surfaced to the CLI

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Transformation Errors
// =============================================================================

/// Faults while turning the source file into event documents.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A header column matches neither a scalar field nor a group of the variant.
    #[error("Unrecognized column '{column}' for the {variant} schema")]
    UnknownColumn { column: String, variant: String },

    /// A required scalar column is absent from the header.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A group column has nothing after its prefix (`event_data.`).
    #[error("Column '{0}' has an empty field name")]
    EmptyFieldName(String),

    /// The same column name appears twice in the header.
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// The file has no header row.
    #[error("No headers found in source file")]
    NoHeaders,

    /// CSV decoding failed on a given line.
    #[error("Line {line}: {message}")]
    Csv { line: u64, message: String },
}

// =============================================================================
// Credential Errors
// =============================================================================

/// Errors while loading the warehouse bearer token.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// No credentials file was given and the environment has no token.
    #[error("Missing credentials: pass --credentials or set BIGQUERY_ACCESS_TOKEN")]
    Missing,

    /// The credentials file could not be read.
    #[error("Cannot read credentials file '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The credentials file holds neither a token nor a service-account key.
    #[error("Invalid credentials file '{0}': no access token or service-account key found")]
    Invalid(PathBuf),

    /// The service-account private key could not sign the token assertion.
    #[error("Cannot sign service-account assertion: {0}")]
    Signing(String),

    /// The token endpoint refused or failed the exchange.
    #[error("Token exchange failed: {0}")]
    Exchange(String),
}

// =============================================================================
// Warehouse Errors
// =============================================================================

/// Faults from the warehouse transport.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// HTTP request could not be sent or its body read.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The API answered with a body we could not decode.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Invalid run configuration, detected before any I/O.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A destination identifier is blank.
    #[error("Configuration value '{0}' must not be empty")]
    Empty(&'static str),

    /// The delimiter is not a single ASCII character.
    #[error("Delimiter must be a single ASCII character, got '{0}'")]
    Delimiter(char),
}

// =============================================================================
// Loader Errors (top-level)
// =============================================================================

/// Every kind is fatal for the invocation; nothing is retried.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Input file missing.
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Input file present but unreadable.
    #[error("Cannot read source file '{}': {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any fault while assembling the batch.
    #[error("Transformation error: {0}")]
    Transformation(#[from] TransformError),

    /// Destination dataset or table is absent.
    #[error("{0}")]
    DestinationNotFound(String),

    /// Backend reported row errors or the insert call itself failed.
    #[error("{0}")]
    InsertFailed(String),

    /// Audit write failed.
    #[error("{0}")]
    LoggingFailed(String),

    /// No bearer token available.
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client could not be constructed.
    #[error("Warehouse client error: {0}")]
    Client(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for warehouse transport operations.
pub type WarehouseResult<T> = Result<T, WarehouseError>;

/// Result type for top-level loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;
