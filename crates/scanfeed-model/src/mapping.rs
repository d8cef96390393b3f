//! Mapping definitions: how one feed's columns become event fields.
//!
//! A [`MappingDefinition`] holds three rule sets:
//!
//! - `required_fields`: the source column must exist in every row.
//! - `optional_fields`: the source column may be missing.
//! - `constant_fields`: values implied by the feed itself, written last.
//!
//! Each [`FieldRule`] names a source column, a [`Target`] and an optional
//! [`Conversion`]. Conversions are closed sets of named functions; the
//! implementations live in `scanfeed-map`.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ModelError;
use crate::value::FieldValue;

/// Where a converted value goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A concrete event field such as `source.ip`.
    Field(String),
    /// `extra.`: the extra bag, keyed by the source column name.
    ExtraUsingSourceName,
    /// `extra.<name>`: the extra bag under a fixed name.
    ExtraNamed(String),
    /// `false`: consume the column and drop the value.
    Discard,
}

impl Target {
    /// Parses the textual form used in schema files.
    pub fn parse(target: &str) -> Result<Self, ModelError> {
        if target.is_empty() {
            return Err(ModelError::InvalidTarget {
                target: target.to_string(),
                message: "empty target".to_string(),
            });
        }
        if target == "extra" {
            return Err(ModelError::InvalidTarget {
                target: target.to_string(),
                message: "use \"extra.\" or \"extra.<name>\"".to_string(),
            });
        }
        match target.strip_prefix("extra.") {
            Some("") => Ok(Self::ExtraUsingSourceName),
            Some(name) => Ok(Self::ExtraNamed(name.to_string())),
            None => Ok(Self::Field(target.to_string())),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::ExtraUsingSourceName => f.write_str("extra."),
            Self::ExtraNamed(name) => write!(f, "extra.{name}"),
            Self::Discard => f.write_str("false"),
        }
    }
}

/// One-argument converters: `value -> value'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueConverter {
    AddUtcToTimestamp,
    ConvertDate,
    ConvertDateUtc,
    ConvertBool,
    ValidateToNone,
    ConvertInt,
    ConvertFloat,
    InvalidateZero,
    ValidateIp,
    ValidateNetwork,
    ValidateFqdn,
    ForceBase64,
    SetTorNode,
    ScanExchangeTaxonomy,
    ScanExchangeType,
    ScanExchangeIdentifier,
}

impl ValueConverter {
    pub const ALL: &'static [ValueConverter] = &[
        Self::AddUtcToTimestamp,
        Self::ConvertDate,
        Self::ConvertDateUtc,
        Self::ConvertBool,
        Self::ValidateToNone,
        Self::ConvertInt,
        Self::ConvertFloat,
        Self::InvalidateZero,
        Self::ValidateIp,
        Self::ValidateNetwork,
        Self::ValidateFqdn,
        Self::ForceBase64,
        Self::SetTorNode,
        Self::ScanExchangeTaxonomy,
        Self::ScanExchangeType,
        Self::ScanExchangeIdentifier,
    ];

    /// Name used in schema files.
    pub fn name(self) -> &'static str {
        match self {
            Self::AddUtcToTimestamp => "add_UTC_to_timestamp",
            Self::ConvertDate => "convert_date",
            Self::ConvertDateUtc => "convert_date_utc",
            Self::ConvertBool => "convert_bool",
            Self::ValidateToNone => "validate_to_none",
            Self::ConvertInt => "convert_int",
            Self::ConvertFloat => "convert_float",
            Self::InvalidateZero => "invalidate_zero",
            Self::ValidateIp => "validate_ip",
            Self::ValidateNetwork => "validate_network",
            Self::ValidateFqdn => "validate_fqdn",
            Self::ForceBase64 => "force_base64",
            Self::SetTorNode => "set_tor_node",
            Self::ScanExchangeTaxonomy => "scan_exchange_taxonomy",
            Self::ScanExchangeType => "scan_exchange_type",
            Self::ScanExchangeIdentifier => "scan_exchange_identifier",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }
}

/// Column candidates for the composite URL builder, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlColumns {
    /// Host-bearing columns; the first present, non-empty one wins.
    pub host: Vec<String>,
    /// Path-bearing columns; the first present one wins.
    pub path: Vec<String>,
}

impl Default for UrlColumns {
    fn default() -> Self {
        Self {
            host: ["cc_dns", "http_host", "hostname", "ip"]
                .map(String::from)
                .to_vec(),
            path: ["url", "http_url"].map(String::from).to_vec(),
        }
    }
}

/// Row-aware converters: `(value, row) -> value'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowConverter {
    HttpHostAndUrl(UrlColumns),
    CategoryOrDetail,
}

impl RowConverter {
    pub const NAMES: &'static [&'static str] = &["convert_http_host_and_url", "category_or_detail"];

    pub fn name(&self) -> &'static str {
        match self {
            Self::HttpHostAndUrl(_) => "convert_http_host_and_url",
            Self::CategoryOrDetail => "category_or_detail",
        }
    }

    /// Builds the converter with default settings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "convert_http_host_and_url" => Some(Self::HttpHostAndUrl(UrlColumns::default())),
            "category_or_detail" => Some(Self::CategoryOrDetail),
            _ => None,
        }
    }
}

/// A converter attached to a rule; the variant records its arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    Value(ValueConverter),
    Row(RowConverter),
}

impl Conversion {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Value(converter) => converter.name(),
            Self::Row(converter) => converter.name(),
        }
    }
}

/// A single column-to-target rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub target: Target,
    pub source: String,
    pub conversion: Option<Conversion>,
}

impl FieldRule {
    pub fn new(target: Target, source: impl Into<String>) -> Self {
        Self {
            target,
            source: source.into(),
            conversion: None,
        }
    }

    /// Rule writing `source` to the concrete field `target`.
    pub fn field(target: &str, source: &str) -> Self {
        Self::new(Target::Field(target.to_string()), source)
    }

    /// Rule writing `source` to the extra bag under its own name.
    pub fn extra(source: &str) -> Self {
        Self::new(Target::ExtraUsingSourceName, source)
    }

    /// Rule that consumes `source` and drops it.
    pub fn discard(source: &str) -> Self {
        Self::new(Target::Discard, source)
    }

    #[must_use]
    pub fn with_value(mut self, converter: ValueConverter) -> Self {
        self.conversion = Some(Conversion::Value(converter));
        self
    }

    #[must_use]
    pub fn with_row(mut self, converter: RowConverter) -> Self {
        self.conversion = Some(Conversion::Row(converter));
        self
    }
}

/// The rule set for one feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingDefinition {
    /// Human-facing feed name, e.g. `Open-Chargen`.
    pub feed_name: String,
    /// File-name key, e.g. `scan_chargen`.
    pub file_name: String,
    pub required_fields: Vec<FieldRule>,
    pub optional_fields: Vec<FieldRule>,
    pub constant_fields: BTreeMap<String, FieldValue>,
}

impl MappingDefinition {
    pub fn new(feed_name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            feed_name: feed_name.into(),
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn required(mut self, rule: FieldRule) -> Self {
        self.required_fields.push(rule);
        self
    }

    #[must_use]
    pub fn optional(mut self, rule: FieldRule) -> Self {
        self.optional_fields.push(rule);
        self
    }

    #[must_use]
    pub fn constant(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.constant_fields.insert(key.into(), value.into());
        self
    }

    /// Every source column referenced by a rule.
    pub fn source_columns(&self) -> impl Iterator<Item = &str> {
        self.required_fields
            .iter()
            .chain(&self.optional_fields)
            .map(|rule| rule.source.as_str())
    }
}
