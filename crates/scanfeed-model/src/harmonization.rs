//! The normalized field catalog.
//!
//! Every concrete event key has a [`FieldType`] which decides how a raw
//! value is sanitized before it is stored. Keys outside the catalog are
//! reported as [`WriteOutcome::UnrecognizedField`]; values a type cannot
//! accept are reported as [`WriteOutcome::ValidationRejected`].

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::datetime::sanitize_datetime;
use crate::event::WriteOutcome;
use crate::validate::{parse_ip, parse_network, sanitize_fqdn, sanitize_url};
use crate::value::FieldValue;

/// Value type of a catalog field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    LowercaseString,
    /// Uppercased; optionally limited to an exact length (country codes).
    UppercaseString(Option<usize>),
    Integer,
    /// Autonomous system number, 1..=4294967295.
    Asn,
    /// TCP/UDP port, 0..=65535.
    Port,
    Float,
    Boolean,
    DateTime,
    IpAddress,
    IpNetwork,
    Fqdn,
    Url,
    ClassificationType,
    ClassificationTaxonomy,
}

/// Incident classification types accepted for `classification.type`.
pub const CLASSIFICATION_TYPES: &[&str] = &[
    "application-compromise",
    "backdoor",
    "blacklist",
    "brute-force",
    "burglary",
    "c2-server",
    "copyright",
    "data-leak",
    "data-loss",
    "ddos",
    "ddos-amplifier",
    "defacement",
    "dga-domain",
    "dos",
    "exploit",
    "harmful-speech",
    "ids-alert",
    "infected-system",
    "information-disclosure",
    "malware",
    "malware-configuration",
    "malware-distribution",
    "masquerade",
    "misconfiguration",
    "other",
    "outage",
    "phishing",
    "potentially-unwanted-accessible",
    "privileged-account-compromise",
    "proxy",
    "sabotage",
    "scanner",
    "sniffing",
    "social-engineering",
    "spam",
    "system-compromise",
    "test",
    "tor",
    "unauthorised-information-access",
    "unauthorised-information-modification",
    "unauthorized-use-of-resources",
    "undetermined",
    "unprivileged-account-compromise",
    "violence",
    "vulnerable-system",
    "weak-crypto",
    // legacy names still emitted by older mapping tables
    "botnet drone",
    "vulnerable service",
    "compromised",
    "unknown",
];

/// Taxonomy buckets accepted for `classification.taxonomy`.
pub const CLASSIFICATION_TAXONOMIES: &[&str] = &[
    "abusive-content",
    "availability",
    "fraud",
    "information-content-security",
    "information-gathering",
    "intrusion-attempts",
    "intrusions",
    "malicious-code",
    "other",
    "test",
    "vulnerable",
];

const ENDPOINT_FIELDS: &[(&str, FieldType)] = &[
    ("abuse_contact", FieldType::LowercaseString),
    ("account", FieldType::String),
    ("allocated", FieldType::DateTime),
    ("as_name", FieldType::String),
    ("asn", FieldType::Asn),
    ("domain_suffix", FieldType::Fqdn),
    ("fqdn", FieldType::Fqdn),
    ("geolocation.cc", FieldType::UppercaseString(Some(2))),
    ("geolocation.city", FieldType::String),
    ("geolocation.country", FieldType::String),
    ("geolocation.latitude", FieldType::Float),
    ("geolocation.longitude", FieldType::Float),
    ("geolocation.region", FieldType::String),
    ("geolocation.state", FieldType::String),
    ("ip", FieldType::IpAddress),
    ("local_hostname", FieldType::String),
    ("local_ip", FieldType::IpAddress),
    ("network", FieldType::IpNetwork),
    ("port", FieldType::Port),
    ("registry", FieldType::UppercaseString(None)),
    ("reverse_dns", FieldType::Fqdn),
    ("tor_node", FieldType::Boolean),
    ("url", FieldType::Url),
    ("urlpath", FieldType::String),
];

const EVENT_FIELDS: &[(&str, FieldType)] = &[
    ("classification.identifier", FieldType::String),
    ("classification.taxonomy", FieldType::ClassificationTaxonomy),
    ("classification.type", FieldType::ClassificationType),
    ("comment", FieldType::String),
    ("event_description.target", FieldType::String),
    ("event_description.text", FieldType::String),
    ("event_description.url", FieldType::Url),
    ("feed.accuracy", FieldType::Float),
    ("feed.code", FieldType::String),
    ("feed.documentation", FieldType::String),
    ("feed.name", FieldType::String),
    ("feed.provider", FieldType::String),
    ("feed.url", FieldType::Url),
    ("malware.hash.md5", FieldType::String),
    ("malware.hash.sha1", FieldType::String),
    ("malware.hash.sha256", FieldType::String),
    ("malware.name", FieldType::LowercaseString),
    ("malware.version", FieldType::String),
    ("os.name", FieldType::String),
    ("os.version", FieldType::String),
    ("product.name", FieldType::String),
    ("product.product", FieldType::String),
    ("product.vendor", FieldType::String),
    ("product.version", FieldType::String),
    ("protocol.application", FieldType::LowercaseString),
    ("protocol.transport", FieldType::LowercaseString),
    ("screenshot_url", FieldType::Url),
    ("severity", FieldType::LowercaseString),
    ("status", FieldType::String),
    ("time.observation", FieldType::DateTime),
    ("time.source", FieldType::DateTime),
    ("tlp", FieldType::UppercaseString(None)),
    ("user_agent", FieldType::String),
];

static CATALOG: LazyLock<BTreeMap<String, FieldType>> = LazyLock::new(|| {
    let mut catalog: BTreeMap<String, FieldType> = EVENT_FIELDS
        .iter()
        .map(|(name, ty)| ((*name).to_string(), *ty))
        .collect();
    for prefix in ["source", "destination"] {
        for (suffix, ty) in ENDPOINT_FIELDS {
            catalog.insert(format!("{prefix}.{suffix}"), *ty);
        }
    }
    catalog
});

/// Looks up the type of a concrete event key.
pub fn field_type(key: &str) -> Option<FieldType> {
    CATALOG.get(key).copied()
}

/// Returns true if `key` names a catalog field.
pub fn is_known_field(key: &str) -> bool {
    CATALOG.contains_key(key)
}

/// Iterates catalog keys in sorted order.
pub fn known_fields() -> impl Iterator<Item = &'static str> {
    CATALOG.keys().map(String::as_str)
}

/// Sanitizes `value` for the field `key`.
pub fn sanitize(key: &str, value: FieldValue) -> Result<FieldValue, WriteOutcome> {
    let ty = field_type(key).ok_or(WriteOutcome::UnrecognizedField)?;
    sanitize_as(ty, value).ok_or(WriteOutcome::ValidationRejected)
}

/// Sanitizes `value` as type `ty`; `None` means the value is not acceptable.
pub fn sanitize_as(ty: FieldType, value: FieldValue) -> Option<FieldValue> {
    match ty {
        FieldType::String => non_empty_text(&value).map(FieldValue::Text),
        FieldType::LowercaseString => {
            non_empty_text(&value).map(|text| FieldValue::Text(text.to_lowercase()))
        }
        FieldType::UppercaseString(length) => {
            let text = non_empty_text(&value)?.to_uppercase();
            match length {
                Some(expected) if text.chars().count() != expected => None,
                _ => Some(FieldValue::Text(text)),
            }
        }
        FieldType::Integer => to_integer(&value).map(FieldValue::Integer),
        FieldType::Asn => to_integer(&value)
            .filter(|asn| (1..=4_294_967_295).contains(asn))
            .map(FieldValue::Integer),
        FieldType::Port => to_integer(&value)
            .filter(|port| (0..=65_535).contains(port))
            .map(FieldValue::Integer),
        FieldType::Float => to_float(&value).map(FieldValue::Float),
        FieldType::Boolean => to_boolean(&value).map(FieldValue::Boolean),
        FieldType::DateTime => {
            let text = non_empty_text(&value)?;
            sanitize_datetime(&text).ok().map(FieldValue::Text)
        }
        FieldType::IpAddress => {
            let text = non_empty_text(&value)?;
            parse_ip(&text).map(|addr| FieldValue::Text(addr.to_string()))
        }
        FieldType::IpNetwork => {
            let text = non_empty_text(&value)?;
            parse_network(&text).map(|_| FieldValue::Text(text))
        }
        FieldType::Fqdn => {
            let text = non_empty_text(&value)?;
            sanitize_fqdn(&text).map(FieldValue::Text)
        }
        FieldType::Url => {
            let text = non_empty_text(&value)?;
            sanitize_url(&text).map(FieldValue::Text)
        }
        FieldType::ClassificationType => {
            let text = non_empty_text(&value)?;
            CLASSIFICATION_TYPES
                .contains(&text.as_str())
                .then_some(FieldValue::Text(text))
        }
        FieldType::ClassificationTaxonomy => {
            let text = non_empty_text(&value)?.to_lowercase();
            CLASSIFICATION_TAXONOMIES
                .contains(&text.as_str())
                .then_some(FieldValue::Text(text))
        }
    }
}

fn non_empty_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

fn to_integer(value: &FieldValue) -> Option<i64> {
    match value {
        FieldValue::Integer(number) => Some(*number),
        FieldValue::Text(text) => text.trim().parse().ok(),
        FieldValue::Boolean(_) | FieldValue::Float(_) => None,
    }
}

fn to_float(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Float(number) => Some(*number),
        FieldValue::Integer(number) => Some(*number as f64),
        FieldValue::Text(text) => text.trim().parse().ok(),
        FieldValue::Boolean(_) => None,
    }
}

fn to_boolean(value: &FieldValue) -> Option<bool> {
    match value {
        FieldValue::Boolean(flag) => Some(*flag),
        FieldValue::Integer(0) => Some(false),
        FieldValue::Integer(1) => Some(true),
        FieldValue::Text(text) => match text.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_fields_exist_for_both_sides() {
        assert_eq!(field_type("source.ip"), Some(FieldType::IpAddress));
        assert_eq!(field_type("destination.port"), Some(FieldType::Port));
        assert!(is_known_field("source.geolocation.cc"));
        assert!(!is_known_field("response_size"));
    }

    #[test]
    fn integers_are_parsed_from_text() {
        assert_eq!(
            sanitize("source.asn", FieldValue::from("5678")),
            Ok(FieldValue::Integer(5678))
        );
        assert_eq!(
            sanitize("source.asn", FieldValue::from("0")),
            Err(WriteOutcome::ValidationRejected)
        );
        assert_eq!(
            sanitize("source.port", FieldValue::from("http")),
            Err(WriteOutcome::ValidationRejected)
        );
    }

    #[test]
    fn unknown_keys_are_unrecognized() {
        assert_eq!(
            sanitize("response_size", FieldValue::Integer(116)),
            Err(WriteOutcome::UnrecognizedField)
        );
    }

    #[test]
    fn country_codes_are_uppercased_and_length_checked() {
        assert_eq!(
            sanitize("source.geolocation.cc", FieldValue::from("is")),
            Ok(FieldValue::from("IS"))
        );
        assert_eq!(
            sanitize("source.geolocation.cc", FieldValue::from("ISL")),
            Err(WriteOutcome::ValidationRejected)
        );
    }

    #[test]
    fn classification_values_are_checked() {
        assert!(sanitize("classification.type", FieldValue::from("blacklist")).is_ok());
        assert!(sanitize("classification.type", FieldValue::from("nonsense")).is_err());
        assert_eq!(
            sanitize("classification.taxonomy", FieldValue::from("Vulnerable")),
            Ok(FieldValue::from("vulnerable"))
        );
    }
}
