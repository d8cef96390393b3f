//! Report decoding for scan feeds.

pub mod csv_report;
pub mod error;
pub mod filename;
pub mod json_report;
pub mod reader;

pub use csv_report::CsvRows;
pub use error::IngestError;
pub use filename::extract_key;
pub use json_report::JsonRows;
pub use reader::{ReportRows, read_report, read_report_as};
