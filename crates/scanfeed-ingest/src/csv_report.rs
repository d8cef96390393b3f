//! CSV reports: a header row, then one record per event.

use csv::{Reader, ReaderBuilder, StringRecord};
use tracing::warn;

use scanfeed_model::Row;

use crate::error::IngestError;

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn csv_error(source: csv::Error) -> IngestError {
    IngestError::Csv { source }
}

fn is_blank(body: &str) -> bool {
    body.trim_matches(|ch: char| ch.is_whitespace() || ch == '\u{feff}')
        .is_empty()
}

/// Lazily decoded CSV records.
///
/// Each row keeps the exact text of its record (without the line
/// terminator) as `raw`.
pub struct CsvRows<'a> {
    body: &'a str,
    reader: Reader<&'a [u8]>,
    headers: Vec<String>,
    pending: Option<Row>,
    done: bool,
}

impl<'a> CsvRows<'a> {
    /// Reads the header and the first record.
    ///
    /// An empty body and a header without data rows are both errors.
    pub fn new(body: &'a str) -> Result<Self, IngestError> {
        if is_blank(body) {
            return Err(IngestError::EmptyReport);
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(body.as_bytes());
        let headers = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(normalize_header)
            .collect();

        let mut rows = Self {
            body,
            reader,
            headers,
            pending: None,
            done: false,
        };
        match rows.read_row()? {
            Some(first) => rows.pending = Some(first),
            None => return Err(IngestError::NoDataRows),
        }
        Ok(rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn read_row(&mut self) -> Result<Option<Row>, IngestError> {
        let mut record = StringRecord::new();
        if !self.reader.read_record(&mut record).map_err(csv_error)? {
            return Ok(None);
        }

        let (start, mut line) = record
            .position()
            .map_or((0, 0), |position| (position.byte(), position.line()));
        let end = self.reader.position().byte();
        let span = usize::try_from(start)
            .ok()
            .zip(usize::try_from(end).ok())
            .and_then(|(start, end)| self.body.get(start..end));
        let raw = match span {
            Some(text) => {
                // the span may start on the previous record's terminator
                let trimmed = text.trim_start_matches(['\r', '\n']);
                let skipped = &text[..text.len() - trimmed.len()];
                line += skipped.matches('\n').count() as u64;
                trimmed.trim_end_matches(['\r', '\n']).to_string()
            }
            None => record.iter().collect::<Vec<_>>().join(","),
        };

        if record.len() != self.headers.len() {
            warn!(
                line,
                expected = self.headers.len(),
                found = record.len(),
                "record field count differs from the header; missing cells are empty, surplus cells dropped"
            );
        }
        // the header defines the column set, short records get empty cells
        let cells = self
            .headers
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let value = record.get(index).unwrap_or_default();
                (column.clone(), value.to_string())
            })
            .collect();
        Ok(Some(Row::new(cells, raw, line)))
    }
}

impl Iterator for CsvRows<'_> {
    type Item = Result<Row, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(row) = self.pending.take() {
            return Some(Ok(row));
        }
        if self.done {
            return None;
        }
        match self.read_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
