use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("report is empty")]
    EmptyReport,

    #[error("report has a header but no data rows")]
    NoDataRows,

    #[error("malformed CSV: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    #[error("malformed JSON on line {line}: {source}")]
    Json {
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON record on line {line} is not an object")]
    NotAnObject { line: u64 },

    #[error("Report's file name {0:?} is not valid.")]
    InvalidFileName(String),
}
