//! Delimited source reader.
//!
//! Wraps a `csv` reader over the source file: the first line is the header,
//! every following non-empty line becomes a [`RawRecord`]. Cells are kept
//! verbatim (no trimming, no unquoting beyond CSV rules).

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::{LoaderError, LoaderResult, TransformError, TransformResult};
use crate::models::RawRecord;

/// Header plus a record cursor over a delimited source.
pub struct SourceReader<R: Read = File> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
}

impl SourceReader<File> {
    /// Open a source file.
    ///
    /// A missing file is reported as [`LoaderError::SourceNotFound`]; the
    /// handle is closed when the reader is dropped.
    pub fn open(path: &Path, delimiter: u8) -> LoaderResult<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoaderError::SourceNotFound(path.to_path_buf()),
            _ => LoaderError::Source {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Ok(Self::from_reader(file, delimiter)?)
    }
}

impl<R: Read> SourceReader<R> {
    /// Read the header line from `reader`.
    pub fn from_reader(reader: R, delimiter: u8) -> TransformResult<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.is_empty() {
            return Err(TransformError::NoHeaders);
        }

        Ok(Self { reader, headers })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Iterate the data records in file order.
    ///
    /// Short rows are padded with empty cells; cells past the last header
    /// column are ignored.
    pub fn records(&mut self) -> impl Iterator<Item = TransformResult<RawRecord>> + '_ {
        let headers = &self.headers;
        self.reader
            .records()
            .map(move |row| row.map(|row| to_raw_record(headers, &row)).map_err(csv_error))
    }
}

fn to_raw_record(headers: &[String], row: &StringRecord) -> RawRecord {
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| (header.as_str(), row.get(i).unwrap_or("")))
        .collect()
}

fn csv_error(e: csv::Error) -> TransformError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    TransformError::Csv {
        line,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn read_all(csv: &str, delimiter: u8) -> (Vec<String>, Vec<RawRecord>) {
        let mut reader = SourceReader::from_reader(csv.as_bytes(), delimiter).unwrap();
        let records = reader.records().collect::<Result<Vec<_>, _>>().unwrap();
        (reader.headers().to_vec(), records)
    }

    #[test]
    fn test_simple_csv() {
        let (headers, rows) = read_all("event_name,event_data.foo\npage_view,bar\nclick,42", b',');

        assert_eq!(headers, vec!["event_name", "event_data.foo"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("event_name"), Some("page_view"));
        assert_eq!(rows[1].get("event_data.foo"), Some("42"));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let (_, rows) = read_all("a;b\n1;2", b';');
        assert_eq!(rows[0].get("b"), Some("2"));
    }

    #[test]
    fn test_quoted_json_cell_kept_verbatim() {
        let csv = "a,b\n\"{\"\"k\"\": [1, 2]}\",x\n";
        let (_, rows) = read_all(csv, b',');
        assert_eq!(rows[0].get("a"), Some(r#"{"k": [1, 2]}"#));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let (_, rows) = read_all("a,b\n1,2\n\n3,4\n", b',');
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_short_rows_padded_extra_cells_ignored() {
        let (_, rows) = read_all("a,b,c\n1\n1,2,3,4", b',');
        assert_eq!(rows[0].get("b"), Some(""));
        assert_eq!(rows[0].get("c"), Some(""));
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn test_empty_source_has_no_headers() {
        let result = SourceReader::from_reader("".as_bytes(), b',');
        assert!(matches!(result, Err(TransformError::NoHeaders)));
    }

    #[test]
    fn test_invalid_utf8_reports_line() {
        let bytes: &[u8] = b"a,b\n1,2\n\xff\xfe,3\n";
        let mut reader = SourceReader::from_reader(bytes, b',').unwrap();
        let results: Vec<_> = reader.records().collect();
        assert!(results[0].is_ok());
        match &results[1] {
            Err(TransformError::Csv { line, .. }) => assert_eq!(*line, 3),
            other => panic!("expected CSV error, got {:?}", other),
        }
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        let err = SourceReader::open(&path, b',').err().unwrap();
        assert!(matches!(err, LoaderError::SourceNotFound(p) if p == path));
    }

    #[test]
    fn test_open_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "event_name\npage_view").unwrap();

        let mut reader = SourceReader::open(&path, b',').unwrap();
        assert_eq!(reader.records().count(), 1);
    }
}
