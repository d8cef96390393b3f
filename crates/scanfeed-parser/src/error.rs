use std::path::PathBuf;

use thiserror::Error;

use scanfeed_ingest::IngestError;
use scanfeed_map::MapError;
use scanfeed_standards::SchemaError;

/// The report cannot be matched to a mapping definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectError {
    #[error(
        "No feed name configured and the report has no file name. \
         Ensure that at least one is given."
    )]
    NoFileName,

    #[error("Report's file name {0:?} is not valid.")]
    InvalidFileName(String),

    #[error("Could not get a config for {key:?}, check the documentation.")]
    UnknownReport { file_name: String, key: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config: {source}")]
    Toml {
        path: Option<PathBuf>,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid log level {0:?}")]
    InvalidLogLevel(String),
}

/// Everything that can stop a report or a row.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
