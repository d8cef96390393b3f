//! Inbound reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// Encoding of a report body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// CSV with a header row.
    Csv,
    /// A JSON array of objects, or one JSON object per line.
    Json,
    /// JSON when the body starts with `[` or `{`, CSV otherwise.
    #[default]
    Auto,
}

/// A report as handed over by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Name of the file the report was delivered as, used for feed detection.
    pub file_name: Option<String>,
    /// Decoded report body.
    pub body: String,
    pub format: ReportFormat,
    /// Fields copied into every event (e.g. `time.observation`, `feed.url`).
    pub metadata: BTreeMap<String, FieldValue>,
}

impl Report {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Resolves [`ReportFormat::Auto`] by sniffing the body.
    pub fn effective_format(&self) -> ReportFormat {
        match self.format {
            ReportFormat::Auto => {
                let head = self.body.trim_start_matches('\u{feff}').trim_start();
                if head.starts_with('[') || head.starts_with('{') {
                    ReportFormat::Json
                } else {
                    ReportFormat::Csv
                }
            }
            explicit => explicit,
        }
    }
}
