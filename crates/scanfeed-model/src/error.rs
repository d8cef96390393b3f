use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid datetime: {0:?}")]
    InvalidDateTime(String),
    #[error("invalid target {target:?}: {message}")]
    InvalidTarget { target: String, message: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
