//! JSON reports: either one array of objects or one object per line.

use std::iter::Enumerate;
use std::str::Lines;
use std::vec::IntoIter;

use serde_json::value::RawValue;
use serde_json::{Map, Value};

use scanfeed_model::Row;

use crate::error::IngestError;

enum Source<'a> {
    Array(Enumerate<IntoIter<&'a RawValue>>),
    Lines(Enumerate<Lines<'a>>),
}

/// Lazily decoded JSON records.
///
/// For arrays the raw text is the element exactly as written; for JSON
/// Lines it is the line.
pub struct JsonRows<'a> {
    source: Source<'a>,
    done: bool,
}

impl<'a> JsonRows<'a> {
    pub fn new(body: &'a str) -> Result<Self, IngestError> {
        let trimmed = body.trim_start_matches('\u{feff}').trim();
        if trimmed.is_empty() {
            return Err(IngestError::EmptyReport);
        }

        let source = if trimmed.starts_with('[') {
            let elements: Vec<&'a RawValue> = serde_json::from_str(trimmed)
                .map_err(|source| IngestError::Json { line: 1, source })?;
            if elements.is_empty() {
                return Err(IngestError::NoDataRows);
            }
            Source::Array(elements.into_iter().enumerate())
        } else {
            Source::Lines(trimmed.lines().enumerate())
        };
        Ok(Self {
            source,
            done: false,
        })
    }

    fn next_record(&mut self) -> Option<(u64, &'a str)> {
        match &mut self.source {
            Source::Array(elements) => elements
                .next()
                .map(|(index, element)| (index as u64 + 1, element.get())),
            Source::Lines(lines) => lines
                .map(|(index, line)| (index as u64 + 1, line.trim_end_matches('\r')))
                .find(|(_, line)| !line.trim().is_empty()),
        }
    }
}

fn decode(line: u64, raw: &str) -> Result<Row, IngestError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|source| IngestError::Json { line, source })?;
    let Value::Object(object) = value else {
        return Err(IngestError::NotAnObject { line });
    };
    Ok(Row::new(cells(object), raw, line))
}

fn cells(object: Map<String, Value>) -> Vec<(String, String)> {
    object
        .into_iter()
        .map(|(column, value)| (column, render(value)))
        .collect()
}

/// Renders a JSON value the way a CSV cell would carry it.
fn render(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested @ (Value::Array(_) | Value::Object(_)) => nested.to_string(),
    }
}

impl Iterator for JsonRows<'_> {
    type Item = Result<Row, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some((line, raw)) = self.next_record() else {
            self.done = true;
            return None;
        };
        let row = decode(line, raw);
        if row.is_err() {
            self.done = true;
        }
        Some(row)
    }
}
