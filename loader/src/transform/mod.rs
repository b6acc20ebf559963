//! Transformation module.
//!
//! - Coerce: raw cell text to typed values
//! - Row: one record to one event document
//! - Batch: a whole source file to an ordered document list

pub mod batch;
pub mod coerce;
pub mod row;

pub use batch::{assemble_batch, assemble_from_reader, Batch};
pub use coerce::{coerce, coerce_consent};
pub use row::{transform_record, transform_record_at};
