//! Serializes a row stream into the destination CSV file.
//!
//! The header record is derived from the first row's field names; if the
//! stream yields no rows the destination is left as a valid empty file.
//! Quoting is applied per field by [`crate::domain::record`], so the
//! underlying `csv` writer runs with `QuoteStyle::Never` and only handles
//! record assembly and buffering.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use csv::{QuoteStyle, WriterBuilder};
use log::info;

use crate::domain::errors::{ExportError, Result};
use crate::domain::record::{quote_text, Record};

/// Consumes a row stream and writes one CSV record per row.
pub struct ExportWriter {
    progress_every: usize,
}

impl ExportWriter {
    /// `progress_every` controls the cadence of progress log lines, normally
    /// the configured batch size.
    pub fn new(progress_every: usize) -> Self {
        Self {
            progress_every: progress_every.max(1),
        }
    }

    /// Drains `rows` into `destination`, creating or truncating the file.
    ///
    /// Returns the number of data rows written. The file handle is released
    /// on every exit path; on a mid-stream error the buffered output is
    /// flushed first, so rows written before the failure remain on disk.
    pub fn run<I>(&self, rows: I, destination: &Path) -> Result<u64>
    where
        I: Iterator<Item = Result<Record>>,
    {
        let file = File::create(destination)
            .map_err(|e| ExportError::Write(format!("{}: {}", destination.display(), e)))?;
        let mut wtr = WriterBuilder::new()
            .delimiter(b',')
            .quote_style(QuoteStyle::Never)
            .from_writer(BufWriter::new(file));

        let mut written = 0u64;
        for row in rows {
            let record = match row {
                Ok(r) => r,
                Err(e) => {
                    let _ = wtr.flush();
                    return Err(e);
                }
            };

            if written == 0 {
                let header: Vec<String> = record
                    .field_names()
                    .iter()
                    .map(|name| quote_text(name))
                    .collect();
                wtr.write_record(&header)
                    .map_err(|e| ExportError::Write(e.to_string()))?;
            }

            wtr.write_record(record.csv_fields())
                .map_err(|e| ExportError::Write(e.to_string()))?;
            written += 1;

            if written % self.progress_every as u64 == 0 {
                info!("{} rows written", written);
            }
        }

        wtr.flush()
            .map_err(|e| ExportError::Write(e.to_string()))?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::FieldValue;
    use std::sync::Arc;

    fn columns(names: &[&str]) -> Arc<Vec<String>> {
        Arc::new(names.iter().map(|s| s.to_string()).collect())
    }

    fn record(cols: &Arc<Vec<String>>, values: Vec<FieldValue>) -> Record {
        Record::new(Arc::clone(cols), values)
    }

    #[test]
    fn test_three_rows_batch_of_two() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.csv");
        let cols = columns(&["id", "name"]);
        let rows = vec![
            Ok(record(&cols, vec![FieldValue::Int(1), FieldValue::Text("a".into())])),
            Ok(record(&cols, vec![FieldValue::Int(2), FieldValue::Text("b".into())])),
            Ok(record(&cols, vec![FieldValue::Int(3), FieldValue::Text("c".into())])),
        ];

        let written = ExportWriter::new(2).run(rows.into_iter(), &dest).unwrap();
        assert_eq!(written, 3);

        let contents = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(contents, "\"id\",\"name\"\n1,\"a\"\n2,\"b\"\n3,\"c\"\n");
    }

    #[test]
    fn test_empty_stream_leaves_valid_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.csv");

        let rows: Vec<Result<Record>> = vec![];
        let written = ExportWriter::new(10).run(rows.into_iter(), &dest).unwrap();

        assert_eq!(written, 0);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 0);
    }

    #[test]
    fn test_stream_error_keeps_rows_written_so_far() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.csv");
        let cols = columns(&["id"]);
        let rows = vec![
            Ok(record(&cols, vec![FieldValue::Int(1)])),
            Ok(record(&cols, vec![FieldValue::Int(2)])),
            Err(ExportError::Stream("connection dropped".into())),
        ];

        let result = ExportWriter::new(10).run(rows.into_iter(), &dest);
        assert!(matches!(result, Err(ExportError::Stream(_))));

        let contents = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(contents, "\"id\"\n1\n2\n");
    }

    #[test]
    fn test_numeric_looking_text_round_trips_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.csv");
        let cols = columns(&["code", "count"]);
        let rows = vec![Ok(record(
            &cols,
            vec![FieldValue::Text("0012".into()), FieldValue::Int(12)],
        ))];

        ExportWriter::new(10).run(rows.into_iter(), &dest).unwrap();

        let contents = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(contents, "\"code\",\"count\"\n\"0012\",12\n");

        // Read back: the quoted field is text, the bare field parses as a number.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&dest)
            .unwrap();
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "0012");
        assert_eq!(row[1].parse::<i64>().unwrap(), 12);
    }

    #[test]
    fn test_header_order_matches_first_row() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.csv");
        let cols = columns(&["b", "a", "c"]);
        let rows = vec![Ok(record(
            &cols,
            vec![FieldValue::Null, FieldValue::Int(1), FieldValue::Null],
        ))];

        ExportWriter::new(10).run(rows.into_iter(), &dest).unwrap();

        let contents = std::fs::read_to_string(&dest).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(header, "\"b\",\"a\",\"c\"");
    }
}
