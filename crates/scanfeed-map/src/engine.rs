//! Row normalizer: one decoded row plus one mapping definition in, one
//! event out.
//!
//! The passes run in a fixed order, which decides who wins when several
//! rules touch the same key:
//!
//! 1. required rules (a missing column is fatal)
//! 2. optional rules (a missing column is a warning)
//! 3. constants (unconditional overwrite)
//! 4. raw line
//! 5. leftover sweep: non-empty columns no rule consumed go to `extra`,
//!    replacing an entry a rule wrote under the same name
//!
//! A value whose target field is already set is kept in `extra` under its
//! source column name.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, error, warn};

use scanfeed_model::{Event, FieldRule, FieldValue, MappingDefinition, Row, Target, WriteOutcome};

use crate::convert;
use crate::error::{MapError, Result};

const FEED_NAME_FIELD: &str = "feed.name";

/// Applies a [`MappingDefinition`] to rows.
///
/// Cheap to clone; the definition is shared.
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    definition: Arc<MappingDefinition>,
    seed: Event,
    overwrite_feed_name: bool,
}

impl RowNormalizer {
    pub fn new(definition: Arc<MappingDefinition>) -> Self {
        Self {
            definition,
            seed: Event::new(),
            overwrite_feed_name: false,
        }
    }

    /// Every event starts as a copy of `seed` (typically the report's
    /// metadata fields).
    #[must_use]
    pub fn with_seed(mut self, seed: Event) -> Self {
        self.seed = seed;
        self
    }

    /// Replace a `feed.name` already carried by the seed.
    #[must_use]
    pub fn overwrite_feed_name(mut self, overwrite: bool) -> Self {
        self.overwrite_feed_name = overwrite;
        self
    }

    pub fn definition(&self) -> &MappingDefinition {
        &self.definition
    }

    pub fn feed_name(&self) -> &str {
        &self.definition.feed_name
    }

    /// Normalizes one row.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] when a required column is absent, a converter
    /// fails, or a required field rejects its value. The row yields no event.
    pub fn normalize(&self, row: &Row) -> Result<Event> {
        let mut event = self.seed.clone();
        if self.overwrite_feed_name || !event.contains(FEED_NAME_FIELD) {
            event.set(FEED_NAME_FIELD, self.feed_name());
        }

        let mut unconsumed: BTreeSet<&str> = row.columns().collect();

        for rule in &self.definition.required_fields {
            let Some(raw_value) = row.get(&rule.source) else {
                error!(
                    feed = self.feed_name(),
                    column = %rule.source,
                    line = row.line(),
                    "required column not found"
                );
                return Err(MapError::MissingRequiredColumn {
                    feed: self.feed_name().to_string(),
                    column: rule.source.clone(),
                });
            };
            unconsumed.remove(rule.source.as_str());

            let Some(value) = self.convert(rule, raw_value, row)? else {
                continue;
            };
            match write(&mut event, rule, value.clone()) {
                Ok(()) => {}
                Err(WriteOutcome::AlreadyPresent) => self.keep_duplicate(&mut event, rule, value),
                Err(outcome) => {
                    return Err(MapError::InvalidRequiredValue {
                        feed: self.feed_name().to_string(),
                        column: rule.source.clone(),
                        target: rule.target.to_string(),
                        value: raw_value.to_string(),
                        outcome,
                    });
                }
            }
        }

        for rule in &self.definition.optional_fields {
            let Some(raw_value) = row.get(&rule.source) else {
                warn!(
                    feed = self.feed_name(),
                    column = %rule.source,
                    "Optional key {} not found in feed {}. Possible change in data format or misconfiguration.",
                    rule.source,
                    self.feed_name()
                );
                continue;
            };
            unconsumed.remove(rule.source.as_str());

            let Some(value) = self.convert(rule, raw_value, row)? else {
                continue;
            };
            match write(&mut event, rule, value.clone()) {
                Ok(()) => {}
                Err(WriteOutcome::ValidationRejected) => {
                    debug!(
                        feed = self.feed_name(),
                        column = %rule.source,
                        target = %rule.target,
                        value = raw_value,
                        "value rejected by field validation, dropped"
                    );
                }
                Err(WriteOutcome::UnrecognizedField) => {
                    event.set_extra(rule.target.to_string(), value);
                }
                Err(WriteOutcome::AlreadyPresent) => self.keep_duplicate(&mut event, rule, value),
            }
        }

        for (key, value) in &self.definition.constant_fields {
            event.set(key.as_str(), value.clone());
        }

        event.set_raw(row.raw());

        for column in unconsumed {
            match row.get(column) {
                Some(value) if !value.is_empty() => {
                    if let Some(replaced) = event.set_extra(column, value) {
                        warn!(
                            feed = self.feed_name(),
                            column,
                            replaced = %replaced,
                            "unmapped column {column:?} replaced the extra entry of the same name"
                        );
                    }
                }
                _ => {}
            }
        }

        Ok(event)
    }

    /// Runs the rule's converter, if any. `None` means "absent".
    fn convert(&self, rule: &FieldRule, raw_value: &str, row: &Row) -> Result<Option<FieldValue>> {
        let Some(conversion) = &rule.conversion else {
            return Ok(Some(FieldValue::from(raw_value)).filter(|value| !value.is_empty()));
        };
        match convert::apply(conversion, raw_value, row) {
            Ok(value) => Ok(value.filter(|value| !value.is_empty())),
            Err(source) => {
                error!(
                    feed = self.feed_name(),
                    column = %rule.source,
                    value = raw_value,
                    converter = conversion.name(),
                    "Could not convert column {:?} in feed {:?}, value: {:?} via conversion function {:?}.",
                    rule.source,
                    self.feed_name(),
                    raw_value,
                    conversion.name()
                );
                Err(MapError::Conversion {
                    feed: self.feed_name().to_string(),
                    column: rule.source.clone(),
                    value: raw_value.to_string(),
                    converter: conversion.name(),
                    source,
                })
            }
        }
    }

    /// The target field is taken; the value moves to `extra` under the
    /// source column so it is not lost.
    fn keep_duplicate(&self, event: &mut Event, rule: &FieldRule, value: FieldValue) {
        warn!(
            feed = self.feed_name(),
            column = %rule.source,
            target = %rule.target,
            "field {} already set, keeping value of column {:?} in extra",
            rule.target,
            rule.source
        );
        event.set_extra(rule.source.as_str(), value);
    }
}

/// Dispatches a converted value to the rule's target.
fn write(
    event: &mut Event,
    rule: &FieldRule,
    value: FieldValue,
) -> std::result::Result<(), WriteOutcome> {
    match &rule.target {
        Target::Field(key) => event.add(key, value),
        Target::ExtraUsingSourceName => {
            event.set_extra(rule.source.as_str(), value);
            Ok(())
        }
        Target::ExtraNamed(name) => {
            event.set_extra(name.as_str(), value);
            Ok(())
        }
        Target::Discard => Ok(()),
    }
}
