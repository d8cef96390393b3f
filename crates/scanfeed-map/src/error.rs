//! Error types for conversion and row normalization.

use scanfeed_model::WriteOutcome;
use thiserror::Error;

/// A conversion function could not make sense of its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{converter} failed on {value:?}: {reason}")]
pub struct ConvertError {
    pub converter: &'static str,
    pub value: String,
    pub reason: String,
}

impl ConvertError {
    pub fn new(converter: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self {
            converter,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Fatal problems for one row. The row produces no event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error(
        "Required column '{column}' not found in feed '{feed}'. \
         Possible change in data format or misconfiguration."
    )]
    MissingRequiredColumn { feed: String, column: String },

    #[error(
        "Could not convert column '{column}' in feed '{feed}', value: {value:?} \
         via conversion function '{converter}'."
    )]
    Conversion {
        feed: String,
        column: String,
        value: String,
        converter: &'static str,
        #[source]
        source: ConvertError,
    },

    #[error("Required field '{target}' in feed '{feed}' rejected {value:?} from column '{column}': {outcome}")]
    InvalidRequiredValue {
        feed: String,
        column: String,
        target: String,
        value: String,
        outcome: WriteOutcome,
    },
}

impl MapError {
    /// The column the error is about.
    pub fn column(&self) -> &str {
        match self {
            Self::MissingRequiredColumn { column, .. }
            | Self::Conversion { column, .. }
            | Self::InvalidRequiredValue { column, .. } => column,
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
