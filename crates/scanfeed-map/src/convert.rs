//! Conversion function library.
//!
//! Every function is pure: it reads the cell (and, for row-aware
//! converters, the rest of the row) and returns either a typed value or
//! `None` for "treat as absent". Unparseable numbers and timestamps are
//! errors, not `None`; callers treat them as fatal for the row.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use scanfeed_model::datetime::sanitize_datetime;
use scanfeed_model::validate::{is_valid_fqdn, parse_ip, parse_network};
use scanfeed_model::{Conversion, FieldValue, Row, RowConverter, UrlColumns, ValueConverter};

use crate::error::ConvertError;

const TRUE_TOKENS: &[&str] = &["y", "yes", "true", "enabled", "1"];
const FALSE_TOKENS: &[&str] = &["n", "no", "false", "disabled", "0"];

/// Applies a rule's conversion to a raw cell.
pub fn apply(
    conversion: &Conversion,
    value: &str,
    row: &Row,
) -> Result<Option<FieldValue>, ConvertError> {
    match conversion {
        Conversion::Value(converter) => apply_value(*converter, value),
        Conversion::Row(converter) => Ok(apply_row(converter, value, row)),
    }
}

/// Applies a one-argument converter.
pub fn apply_value(
    converter: ValueConverter,
    value: &str,
) -> Result<Option<FieldValue>, ConvertError> {
    let name = converter.name();
    let converted: Option<FieldValue> = match converter {
        ValueConverter::AddUtcToTimestamp => Some(add_utc_to_timestamp(value, name)?.into()),
        ValueConverter::ConvertDate => Some(convert_date(value, name)?.into()),
        ValueConverter::ConvertDateUtc => Some(convert_date_utc(value, name)?.into()),
        ValueConverter::ConvertBool => convert_bool(value).map(FieldValue::Boolean),
        ValueConverter::ValidateToNone => validate_to_none(value).map(FieldValue::from),
        ValueConverter::ConvertInt => convert_int(value, name)?.map(FieldValue::Integer),
        ValueConverter::ConvertFloat => convert_float(value, name)?.map(FieldValue::Float),
        ValueConverter::InvalidateZero => invalidate_zero(value, name)?.map(FieldValue::Integer),
        ValueConverter::ValidateIp => validate_ip(value).map(FieldValue::from),
        ValueConverter::ValidateNetwork => validate_network(value).map(FieldValue::from),
        ValueConverter::ValidateFqdn => validate_fqdn(value).map(FieldValue::from),
        ValueConverter::ForceBase64 => force_base64(value).map(FieldValue::Text),
        ValueConverter::SetTorNode => set_tor_node(value).map(FieldValue::Boolean),
        ValueConverter::ScanExchangeTaxonomy => Some(scan_exchange_taxonomy(value).into()),
        ValueConverter::ScanExchangeType => Some(scan_exchange_type(value).into()),
        ValueConverter::ScanExchangeIdentifier => Some(scan_exchange_identifier(value).into()),
    };
    Ok(converted)
}

/// Applies a row-aware converter. Row-aware converters never fail.
pub fn apply_row(converter: &RowConverter, value: &str, row: &Row) -> Option<FieldValue> {
    let converted = match converter {
        RowConverter::HttpHostAndUrl(columns) => convert_http_host_and_url(value, row, columns),
        RowConverter::CategoryOrDetail => category_or_detail(value, row),
    };
    Some(FieldValue::Text(converted))
}

/// Appends a `UTC` marker, then sanitizes.
pub fn add_utc_to_timestamp(value: &str, converter: &'static str) -> Result<String, ConvertError> {
    sanitize(&format!("{value} UTC"), value, converter)
}

pub fn convert_date(value: &str, converter: &'static str) -> Result<String, ConvertError> {
    sanitize(value, value, converter)
}

/// Appends a `+00:00` offset, then sanitizes.
pub fn convert_date_utc(value: &str, converter: &'static str) -> Result<String, ConvertError> {
    sanitize(&format!("{value}+00:00"), value, converter)
}

fn sanitize(candidate: &str, original: &str, converter: &'static str) -> Result<String, ConvertError> {
    sanitize_datetime(candidate)
        .map_err(|err| ConvertError::new(converter, original, err.to_string()))
}

pub fn convert_bool(value: &str) -> Option<bool> {
    let lowered = value.to_lowercase();
    if TRUE_TOKENS.contains(&lowered.as_str()) {
        Some(true)
    } else if FALSE_TOKENS.contains(&lowered.as_str()) {
        Some(false)
    } else {
        None
    }
}

pub fn validate_to_none(value: &str) -> Option<&str> {
    (!(value.is_empty() || value == "0" || value == "unknown")).then_some(value)
}

pub fn convert_int(value: &str, converter: &'static str) -> Result<Option<i64>, ConvertError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_int(value, converter).map(Some)
}

pub fn convert_float(value: &str, converter: &'static str) -> Result<Option<f64>, ConvertError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|err| ConvertError::new(converter, value, err.to_string()))
}

/// Like [`convert_int`], but `0` means "not classified" and yields `None`.
pub fn invalidate_zero(value: &str, converter: &'static str) -> Result<Option<i64>, ConvertError> {
    Ok(convert_int(value, converter)?.filter(|number| *number != 0))
}

fn parse_int(value: &str, converter: &'static str) -> Result<i64, ConvertError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|err| ConvertError::new(converter, value, err.to_string()))
}

/// Accepts a single IP address; `0.0.0.0` and CIDR notation are rejected.
pub fn validate_ip(value: &str) -> Option<&str> {
    if value == "0.0.0.0" || value.contains('/') {
        return None;
    }
    parse_ip(value).map(|_| value)
}

/// Accepts CIDR notation only.
pub fn validate_network(value: &str) -> Option<&str> {
    if !value.contains('/') {
        return None;
    }
    parse_network(value).map(|_| value)
}

pub fn validate_fqdn(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let stripped = trimmed.strip_suffix('.').unwrap_or(trimmed);
    is_valid_fqdn(stripped).then_some(value)
}

/// Passes valid base64 through and encodes everything else.
pub fn force_base64(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    match STANDARD.decode(value) {
        Ok(_) => Some(value.to_string()),
        Err(_) => Some(STANDARD.encode(value.as_bytes())),
    }
}

pub fn set_tor_node(value: &str) -> Option<bool> {
    (!value.is_empty()).then_some(true)
}

pub fn scan_exchange_taxonomy(value: &str) -> &'static str {
    if value.contains("webshell") {
        "intrusions"
    } else {
        "vulnerable"
    }
}

pub fn scan_exchange_type(value: &str) -> &'static str {
    if value.contains("webshell") {
        "system-compromise"
    } else {
        "vulnerable-system"
    }
}

pub fn scan_exchange_identifier(value: &str) -> &'static str {
    if value.contains("webshell") {
        "exchange-server-webshell"
    } else {
        "vulnerable-exchange-server"
    }
}

/// The `category` column if non-empty, else the `detail` column.
pub fn category_or_detail(_value: &str, row: &Row) -> String {
    match row.get("category") {
        Some(category) if !category.is_empty() => category.to_string(),
        _ => row.get("detail").unwrap_or_default().to_string(),
    }
}

/// Rebuilds a URL from split host and path columns.
///
/// The host is the first candidate column that is present and non-empty;
/// the path is the first candidate column that is present. Request noise
/// around the path (a leading `GET `, a trailing ` HTTP/1.1`) is stripped.
/// The scheme comes from the `application` column when it says `http` or
/// `https`. If either part is missing the input is returned unchanged.
pub fn convert_http_host_and_url(value: &str, row: &Row, columns: &UrlColumns) -> String {
    let host = columns
        .host
        .iter()
        .filter_map(|column| row.get(column))
        .find(|candidate| !candidate.is_empty());
    let path = columns.path.iter().find_map(|column| row.get(column));

    let (Some(host), Some(path)) = (host, path) else {
        return value.to_string();
    };
    if path.is_empty() {
        return value.to_string();
    }

    let path = path.find('/').map_or("", |start| &path[start..]);
    let path = path.split(char::is_whitespace).next().unwrap_or_default();

    let scheme = match row.get("application") {
        Some(application @ ("http" | "https")) => application,
        _ => "http",
    };
    format!("{scheme}://{host}{path}")
}
