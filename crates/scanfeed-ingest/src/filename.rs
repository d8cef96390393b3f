//! File-name key extraction.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::IngestError;

/// Optional `YYYY-MM-DD-` prefix, the key, optional `-qualifier` groups,
/// then `.csv`.
static REPORT_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{4}-\d{2}-\d{2}-)?(\w+)(?:-\w+)*\.csv$")
        .expect("Invalid report file name regex")
});

/// Extracts the registry key from a report file name.
///
/// `2019-01-01-scan_http-country-geo.csv` yields `scan_http`.
pub fn extract_key(file_name: &str) -> Result<&str, IngestError> {
    REPORT_FILE_NAME
        .captures(file_name)
        .and_then(|captures| captures.get(1))
        .map(|key| key.as_str())
        .ok_or_else(|| IngestError::InvalidFileName(file_name.to_string()))
}
