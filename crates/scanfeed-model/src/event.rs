//! Normalized events.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::harmonization;
use crate::value::FieldValue;

/// Why a value could not be stored under a concrete event key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The key is a catalog field but the value does not fit its type.
    ValidationRejected,
    /// The key is not a catalog field.
    UnrecognizedField,
    /// The key already holds a value; the existing value is kept.
    AlreadyPresent,
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationRejected => f.write_str("value rejected by field validation"),
            Self::UnrecognizedField => f.write_str("not a recognized field"),
            Self::AlreadyPresent => f.write_str("field already set"),
        }
    }
}

/// One normalized record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    fields: BTreeMap<String, FieldValue>,
    extra: BTreeMap<String, FieldValue>,
    raw: String,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitizes and stores `value` under `key`.
    ///
    /// Empty values are ignored and succeed without writing anything.
    pub fn add(&mut self, key: &str, value: impl Into<FieldValue>) -> Result<(), WriteOutcome> {
        let value = value.into();
        if value.is_empty() {
            return Ok(());
        }
        let sanitized = harmonization::sanitize(key, value)?;
        if self.fields.contains_key(key) {
            return Err(WriteOutcome::AlreadyPresent);
        }
        self.fields.insert(key.to_string(), sanitized);
        Ok(())
    }

    /// Stores `value` under `key` without validation, replacing any value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Inserts into the extra bag, returning the entry it replaced.
    pub fn set_extra(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.extra.insert(key.into(), value.into())
    }

    pub fn set_raw(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn get_extra(&self, key: &str) -> Option<&FieldValue> {
        self.extra.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn extra(&self) -> &BTreeMap<String, FieldValue> {
        &self.extra
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra_len = usize::from(!self.extra.is_empty());
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra_len + 1))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        if !self.extra.is_empty() {
            map.serialize_entry("extra", &self.extra)?;
        }
        map.serialize_entry("raw", &self.raw)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sanitizes_and_keeps_first_value() {
        let mut event = Event::new();
        assert_eq!(event.add("source.port", "19"), Ok(()));
        assert_eq!(event.get("source.port"), Some(&FieldValue::Integer(19)));
        assert_eq!(event.add("source.port", "20"), Err(WriteOutcome::AlreadyPresent));
        assert_eq!(event.get("source.port"), Some(&FieldValue::Integer(19)));
    }

    #[test]
    fn empty_values_are_ignored() {
        let mut event = Event::new();
        assert_eq!(event.add("source.ip", ""), Ok(()));
        assert!(!event.contains("source.ip"));
    }

    #[test]
    fn set_overwrites() {
        let mut event = Event::new();
        event.add("classification.identifier", "first").unwrap();
        event.set("classification.identifier", "second");
        assert_eq!(
            event.get("classification.identifier"),
            Some(&FieldValue::from("second"))
        );
    }

    #[test]
    fn set_extra_reports_replaced_entry() {
        let mut event = Event::new();
        assert_eq!(event.set_extra("geo", "AT"), None);
        assert_eq!(event.set_extra("geo", "US"), Some(FieldValue::from("AT")));
        assert_eq!(event.get_extra("geo"), Some(&FieldValue::from("US")));
    }
}
