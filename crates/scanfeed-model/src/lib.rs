#![deny(unsafe_code)]

pub mod datetime;
pub mod error;
pub mod event;
pub mod harmonization;
pub mod mapping;
pub mod report;
pub mod row;
pub mod validate;
pub mod value;

pub use error::{ModelError, Result};
pub use event::{Event, WriteOutcome};
pub use harmonization::FieldType;
pub use mapping::{
    Conversion, FieldRule, MappingDefinition, RowConverter, Target, UrlColumns, ValueConverter,
};
pub use report::{Report, ReportFormat};
pub use row::Row;
pub use value::FieldValue;
