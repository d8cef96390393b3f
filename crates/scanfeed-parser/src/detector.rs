//! Picks the mapping definition for a report.

use std::sync::Arc;

use tracing::{debug, info};

use scanfeed_ingest::extract_key;
use scanfeed_model::MappingDefinition;
use scanfeed_standards::MappingRegistry;

use crate::error::DetectError;

/// Resolves definitions either from a fixed feed name or, per report,
/// from the report's file name.
#[derive(Debug, Clone, Default)]
pub struct FeedDetector {
    fixed_feed: Option<String>,
}

impl FeedDetector {
    pub fn new(fixed_feed: Option<String>) -> Self {
        Self { fixed_feed }
    }

    pub fn fixed_feed(&self) -> Option<&str> {
        self.fixed_feed.as_deref()
    }

    /// Resolves the definition for a report.
    ///
    /// A fixed feed name that the registry does not know falls back to
    /// file-name detection.
    pub fn resolve(
        &self,
        registry: &MappingRegistry,
        file_name: Option<&str>,
    ) -> Result<Arc<MappingDefinition>, DetectError> {
        if let Some(feed_name) = &self.fixed_feed {
            if let Some(definition) = registry.lookup_by_feedname(feed_name) {
                debug!(feed = %feed_name, "using fixed feed name");
                return Ok(Arc::clone(definition));
            }
            info!(
                "Could not determine the feed by the feed name {feed_name:?} given by parameter. \
                 Will determine the feed from the file names."
            );
        }

        let Some(file_name) = file_name else {
            return Err(DetectError::NoFileName);
        };
        let key = extract_key(file_name)
            .map_err(|_| DetectError::InvalidFileName(file_name.to_string()))?;
        debug!("Detected report's file name: {key:?}.");

        registry
            .lookup_by_filename_key(key)
            .map(|(_, definition)| Arc::clone(definition))
            .ok_or_else(|| DetectError::UnknownReport {
                file_name: file_name.to_string(),
                key: key.to_string(),
            })
    }
}
