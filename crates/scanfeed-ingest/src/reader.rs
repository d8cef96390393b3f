use scanfeed_model::{Report, ReportFormat, Row};

use crate::csv_report::CsvRows;
use crate::error::IngestError;
use crate::json_report::JsonRows;

/// Rows of one report, in source order.
pub enum ReportRows<'a> {
    Csv(CsvRows<'a>),
    Json(JsonRows<'a>),
}

impl Iterator for ReportRows<'_> {
    type Item = Result<Row, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Csv(rows) => rows.next(),
            Self::Json(rows) => rows.next(),
        }
    }
}

/// Starts decoding a report body in its effective format.
///
/// Fails up front for empty reports and reports without data rows; later
/// decoding errors are yielded by the iterator.
pub fn read_report(report: &Report) -> Result<ReportRows<'_>, IngestError> {
    read_report_as(report, report.effective_format())
}

/// Like [`read_report`], but with the format given explicitly. `Auto`
/// still sniffs the body.
pub fn read_report_as(report: &Report, format: ReportFormat) -> Result<ReportRows<'_>, IngestError> {
    match format {
        ReportFormat::Json => JsonRows::new(&report.body).map(ReportRows::Json),
        ReportFormat::Csv => CsvRows::new(&report.body).map(ReportRows::Csv),
        ReportFormat::Auto => read_report(report),
    }
}
