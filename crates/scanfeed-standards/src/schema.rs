#![deny(unsafe_code)]

//! The JSON schema document format.
//!
//! A document is one object. The `_meta` entry carries version
//! information; every other entry describes one report type:
//!
//! ```json
//! {
//!   "_meta": { "date_created": "2023-01-17", "change_log": ["..."] },
//!   "scan_chargen": {
//!     "feed_name": "Open-Chargen",
//!     "file_name": "scan_chargen",
//!     "required_fields": [["time.source", "timestamp", "add_UTC_to_timestamp"]],
//!     "optional_fields": [["extra.", "tag"], [false, "sector"]],
//!     "constant_fields": { "classification.identifier": "open-chargen" }
//!   }
//! }
//! ```
//!
//! A rule is `[target, source]`, `[target, source, converter]` or
//! `[target, source, converter, row_aware]`. The converter is either a
//! name or an object with a `name` and, for the URL builder, candidate
//! `host_columns` and `path_columns`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use scanfeed_model::harmonization;
use scanfeed_model::{
    Conversion, FieldRule, FieldValue, MappingDefinition, RowConverter, Target, ValueConverter,
};

use crate::error::SchemaError;

pub const META_KEY: &str = "_meta";

const REQUIRED: &str = "required";
const OPTIONAL: &str = "optional";

/// Version information carried by a schema document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMeta {
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub change_log: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaDocument {
    pub meta: SchemaMeta,
    pub definitions: Vec<MappingDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReportEntry {
    feed_name: String,
    file_name: String,
    #[serde(default)]
    required_fields: Vec<Vec<Value>>,
    #[serde(default)]
    optional_fields: Vec<Vec<Value>>,
    #[serde(default)]
    constant_fields: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConverterEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        host_columns: Option<Vec<String>>,
        #[serde(default)]
        path_columns: Option<Vec<String>>,
    },
}

/// Parses a document into unvalidated definitions.
///
/// Rule syntax and converter names are checked here; field-level checks
/// happen in [`validate_definition`].
pub fn parse_document(text: &str) -> Result<SchemaDocument, SchemaError> {
    let entries: BTreeMap<String, Value> =
        serde_json::from_str(text).map_err(|source| SchemaError::Json { source })?;

    let mut document = SchemaDocument::default();
    for (report, value) in entries {
        if report == META_KEY {
            document.meta =
                serde_json::from_value(value).map_err(|err| SchemaError::InvalidReport {
                    report: report.clone(),
                    message: err.to_string(),
                })?;
            continue;
        }

        let entry: ReportEntry =
            serde_json::from_value(value).map_err(|err| SchemaError::InvalidReport {
                report: report.clone(),
                message: err.to_string(),
            })?;
        document.definitions.push(build_definition(entry)?);
    }
    Ok(document)
}

fn build_definition(entry: ReportEntry) -> Result<MappingDefinition, SchemaError> {
    let mut definition = MappingDefinition::new(entry.feed_name, entry.file_name);
    for (index, items) in entry.required_fields.iter().enumerate() {
        let rule = parse_rule(&definition.feed_name, REQUIRED, index, items)?;
        definition.required_fields.push(rule);
    }
    for (index, items) in entry.optional_fields.iter().enumerate() {
        let rule = parse_rule(&definition.feed_name, OPTIONAL, index, items)?;
        definition.optional_fields.push(rule);
    }
    definition.constant_fields = entry.constant_fields;
    Ok(definition)
}

fn parse_rule(
    feed: &str,
    list: &'static str,
    index: usize,
    items: &[Value],
) -> Result<FieldRule, SchemaError> {
    let invalid = |message: String| SchemaError::InvalidRule {
        feed: feed.to_string(),
        list,
        index,
        message,
    };

    let (target, source, converter, row_aware) = match items {
        [target, source] => (target, source, None, false),
        [target, source, converter] => (target, source, Some(converter), false),
        [target, source, converter, Value::Bool(flag)] => {
            (target, source, Some(converter), *flag)
        }
        [_, _, _, other] => {
            return Err(invalid(format!(
                "row-aware flag must be a boolean, got {other}"
            )));
        }
        _ => {
            return Err(invalid(format!(
                "expected 2 to 4 elements, got {}",
                items.len()
            )));
        }
    };

    let target = match target {
        Value::String(text) => Target::parse(text).map_err(|source| SchemaError::InvalidTarget {
            feed: feed.to_string(),
            list,
            index,
            source,
        })?,
        Value::Bool(false) => Target::Discard,
        other => {
            return Err(invalid(format!(
                "target must be a field name or false, got {other}"
            )));
        }
    };

    let Value::String(source) = source else {
        return Err(invalid(format!("source column must be a string, got {source}")));
    };

    let conversion = match converter {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_conversion(feed, list, index, value, row_aware)?),
    };

    Ok(FieldRule {
        target,
        source: source.clone(),
        conversion,
    })
}

fn parse_conversion(
    feed: &str,
    list: &'static str,
    index: usize,
    value: &Value,
    row_aware: bool,
) -> Result<Conversion, SchemaError> {
    let invalid = |message: String| SchemaError::InvalidRule {
        feed: feed.to_string(),
        list,
        index,
        message,
    };
    let arity = |name: &str, expected: &'static str| SchemaError::ConverterArity {
        feed: feed.to_string(),
        list,
        index,
        name: name.to_string(),
        expected,
    };
    let unknown = |name: &str| SchemaError::UnknownConverter {
        feed: feed.to_string(),
        list,
        index,
        name: name.to_string(),
    };

    let converter: ConverterEntry =
        serde_json::from_value(value.clone()).map_err(|err| invalid(err.to_string()))?;
    let (name, host_columns, path_columns) = match converter {
        ConverterEntry::Name(name) => (name, None, None),
        ConverterEntry::Detailed {
            name,
            host_columns,
            path_columns,
        } => (name, host_columns, path_columns),
    };
    let has_columns = host_columns.is_some() || path_columns.is_some();
    if [&host_columns, &path_columns]
        .into_iter()
        .flatten()
        .any(Vec::is_empty)
    {
        return Err(invalid("candidate column lists must not be empty".to_string()));
    }

    if !row_aware {
        if has_columns {
            return Err(invalid(format!(
                "candidate columns need the row-aware converter, {name:?} takes only the value"
            )));
        }
        return match ValueConverter::from_name(&name) {
            Some(converter) => Ok(Conversion::Value(converter)),
            None if RowConverter::from_name(&name).is_some() => Err(arity(&name, "needs the row")),
            None => Err(unknown(&name)),
        };
    }

    let Some(mut converter) = RowConverter::from_name(&name) else {
        if ValueConverter::from_name(&name).is_some() {
            return Err(arity(&name, "takes only the value"));
        }
        return Err(unknown(&name));
    };
    match &mut converter {
        RowConverter::HttpHostAndUrl(columns) => {
            if let Some(host) = host_columns {
                columns.host = host;
            }
            if let Some(path) = path_columns {
                columns.path = path;
            }
        }
        RowConverter::CategoryOrDetail if has_columns => {
            return Err(invalid(format!(
                "{name:?} does not take candidate columns"
            )));
        }
        RowConverter::CategoryOrDetail => {}
    }
    Ok(Conversion::Row(converter))
}

/// Checks a definition against the harmonization catalog.
///
/// Required rules must write to known fields or to the extra bag, and
/// constants must name known fields and pass their validation. Constants
/// are replaced by their sanitized form.
pub fn validate_definition(definition: &mut MappingDefinition) -> Result<(), SchemaError> {
    for rule in &definition.required_fields {
        if let Target::Field(key) = &rule.target
            && !harmonization::is_known_field(key)
        {
            return Err(SchemaError::UnknownField {
                feed: definition.feed_name.clone(),
                key: key.clone(),
            });
        }
    }

    let mut sanitized = BTreeMap::new();
    for (key, value) in &definition.constant_fields {
        if !harmonization::is_known_field(key) {
            return Err(SchemaError::UnknownField {
                feed: definition.feed_name.clone(),
                key: key.clone(),
            });
        }
        let clean = harmonization::sanitize(key, value.clone()).map_err(|_| {
            SchemaError::InvalidConstant {
                feed: definition.feed_name.clone(),
                key: key.clone(),
                value: value.to_string(),
            }
        })?;
        sanitized.insert(key.clone(), clean);
    }
    definition.constant_fields = sanitized;
    Ok(())
}
