//! Batch assembly: source file to ordered event documents.

use std::io::Read;
use std::path::Path;

use super::row::transform_record;
use crate::error::{LoaderError, LoaderResult};
use crate::logs::{log_error, log_info, log_success, log_warning};
use crate::models::EventDocument;
use crate::parser::SourceReader;
use crate::schema::SchemaDescriptor;

/// Documents built from one source file, in file order.
#[derive(Debug, Clone)]
pub struct Batch {
    pub headers: Vec<String>,
    pub documents: Vec<EventDocument>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Read and transform a whole source file.
///
/// The header is validated against `schema` before any row is read. The first
/// failing row aborts the batch; nothing partial is returned.
pub fn assemble_batch(path: &Path, schema: &SchemaDescriptor, delimiter: u8) -> LoaderResult<Batch> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    log_info(format!("Reading data from {}", file_name));
    let reader = match SourceReader::open(path, delimiter) {
        Ok(reader) => reader,
        Err(e) => {
            log_error(e.to_string());
            return Err(e);
        }
    };
    log_success(format!("File {} found.", file_name));

    assemble_from_reader(reader, schema)
}

/// Transform every record of an already opened source.
pub fn assemble_from_reader<R: Read>(
    mut reader: SourceReader<R>,
    schema: &SchemaDescriptor,
) -> LoaderResult<Batch> {
    log_info("Structuring payload...");
    let result = structure(&mut reader, schema);
    match &result {
        Ok(batch) if batch.is_empty() => log_warning("Source file has a header but no data rows."),
        Ok(batch) => log_success(format!(
            "Payload structured successfully: {} rows, {} columns ({} schema).",
            batch.len(),
            batch.headers.len(),
            schema.variant
        )),
        Err(e) => log_error(format!("Error during data preparation: {}", e)),
    }
    result
}

fn structure<R: Read>(reader: &mut SourceReader<R>, schema: &SchemaDescriptor) -> LoaderResult<Batch> {
    schema.validate_header(reader.headers())?;

    let documents = reader
        .records()
        .map(|record| record.map(|r| transform_record(&r, schema)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(LoaderError::from)?;

    Ok(Batch {
        headers: reader.headers().to_vec(),
        documents,
    })
}
