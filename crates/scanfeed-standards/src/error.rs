#![deny(unsafe_code)]

use std::path::PathBuf;

use scanfeed_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema JSON: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid schema entry {report:?}: {message}")]
    InvalidReport { report: String, message: String },

    #[error("feed {feed:?}, {list} rule {index}: {message}")]
    InvalidRule {
        feed: String,
        list: &'static str,
        index: usize,
        message: String,
    },

    #[error("feed {feed:?}, {list} rule {index}: invalid target: {source}")]
    InvalidTarget {
        feed: String,
        list: &'static str,
        index: usize,
        #[source]
        source: ModelError,
    },

    #[error("feed {feed:?}, {list} rule {index}: unknown conversion function {name:?}")]
    UnknownConverter {
        feed: String,
        list: &'static str,
        index: usize,
        name: String,
    },

    #[error(
        "feed {feed:?}, {list} rule {index}: conversion function {name:?} \
         {expected}, check the row-aware flag"
    )]
    ConverterArity {
        feed: String,
        list: &'static str,
        index: usize,
        name: String,
        expected: &'static str,
    },

    #[error("feed {feed:?}: {key:?} is not a known field")]
    UnknownField { feed: String, key: String },

    #[error("feed {feed:?}: constant {key:?} = {value} does not pass field validation")]
    InvalidConstant {
        feed: String,
        key: String,
        value: String,
    },

    #[error("duplicate feed name {0:?}")]
    DuplicateFeedName(String),

    #[error("duplicate file name {0:?}")]
    DuplicateFileName(String),
}

impl SchemaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
