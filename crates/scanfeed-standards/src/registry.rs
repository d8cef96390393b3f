#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use sha2::Digest;
use tracing::{debug, info};

use scanfeed_model::MappingDefinition;

use crate::error::SchemaError;
use crate::schema::{SchemaMeta, parse_document, validate_definition};

const BUNDLED_SCHEMA: &str = include_str!("../schema/shadowserver-schema.json");

/// An immutable catalog of mapping definitions.
///
/// Lookups are exact-string. A registry is never edited after it is
/// built; see [`crate::RegistryHandle`] for swapping one in at runtime.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    meta: SchemaMeta,
    definitions: Vec<Arc<MappingDefinition>>,
    by_feed_name: BTreeMap<String, usize>,
    by_file_name: BTreeMap<String, usize>,
    digest: Option<String>,
}

impl MappingRegistry {
    /// Builds a registry from definitions, validating each one.
    pub fn new(definitions: Vec<MappingDefinition>) -> Result<Self, SchemaError> {
        let mut registry = Self::default();
        for mut definition in definitions {
            validate_definition(&mut definition)?;

            let index = registry.definitions.len();
            if registry
                .by_feed_name
                .insert(definition.feed_name.clone(), index)
                .is_some()
            {
                return Err(SchemaError::DuplicateFeedName(definition.feed_name));
            }
            if registry
                .by_file_name
                .insert(definition.file_name.clone(), index)
                .is_some()
            {
                return Err(SchemaError::DuplicateFileName(definition.file_name));
            }
            registry.definitions.push(Arc::new(definition));
        }
        Ok(registry)
    }

    /// Parses and validates a JSON schema document.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let document = parse_document(text)?;
        if let Some(date_created) = &document.meta.date_created {
            info!("Loading schema {date_created:?}.");
        }
        for message in &document.meta.change_log {
            info!("{message}");
        }

        let mut registry = Self::new(document.definitions)?;
        registry.meta = document.meta;
        registry.digest = Some(sha256_hex(text.as_bytes()));
        debug!(
            reports = registry.len(),
            digest = registry.digest.as_deref().unwrap_or_default(),
            "schema loaded"
        );
        Ok(registry)
    }

    /// Reads a schema document from disk.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
        Self::from_json(&text)
    }

    /// The schema shipped with this crate.
    pub fn bundled() -> Result<Self, SchemaError> {
        Self::from_json(BUNDLED_SCHEMA)
    }

    pub fn lookup_by_feedname(&self, feed_name: &str) -> Option<&Arc<MappingDefinition>> {
        self.by_feed_name
            .get(feed_name)
            .map(|index| &self.definitions[*index])
    }

    /// Looks up the definition for a file-name key; returns the feed name
    /// alongside it.
    pub fn lookup_by_filename_key(&self, key: &str) -> Option<(&str, &Arc<MappingDefinition>)> {
        self.by_file_name.get(key).map(|index| {
            let definition = &self.definitions[*index];
            (definition.feed_name.as_str(), definition)
        })
    }

    pub fn meta(&self) -> &SchemaMeta {
        &self.meta
    }

    /// SHA-256 of the source document, if built from one.
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &MappingDefinition> {
        self.definitions.iter().map(Arc::as_ref)
    }

    pub fn feed_names(&self) -> impl Iterator<Item = &str> {
        self.by_feed_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(sha2::Sha256::digest(bytes))
}
