#![deny(unsafe_code)]

//! Conversion functions and the row normalizer.

pub mod convert;
pub mod engine;
pub mod error;

pub use convert::apply;
pub use engine::RowNormalizer;
pub use error::{ConvertError, MapError, Result};
