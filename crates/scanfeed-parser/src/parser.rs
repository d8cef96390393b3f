//! Entry point tying detection, decoding and normalization together.

use std::sync::Arc;

use tracing::{debug, warn};

use scanfeed_ingest::read_report_as;
use scanfeed_map::RowNormalizer;
use scanfeed_model::{Event, Report, ReportFormat};
use scanfeed_standards::{MappingRegistry, RegistryHandle};

use crate::config::ParserConfig;
use crate::detector::FeedDetector;
use crate::driver::ReportEvents;
use crate::error::ParseError;

/// Parses shadowserver-style reports into events.
///
/// The parser holds no per-report state; one instance can be shared by
/// several threads, each parsing its own reports.
#[derive(Debug, Clone)]
pub struct ScanFeedParser {
    config: ParserConfig,
    registry: RegistryHandle,
    detector: FeedDetector,
}

impl ScanFeedParser {
    pub fn new(config: ParserConfig, registry: RegistryHandle) -> Self {
        let detector = FeedDetector::new(config.feed_name.clone());
        Self {
            config,
            registry,
            detector,
        }
    }

    /// Builds a parser from its configuration, loading `schema_file` or
    /// the bundled schema.
    pub fn from_config(config: ParserConfig) -> Result<Self, ParseError> {
        let registry = match &config.schema_file {
            Some(path) => MappingRegistry::load(path)?,
            None => MappingRegistry::bundled()?,
        };
        Ok(Self::new(config, RegistryHandle::new(registry)))
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Handle to the live registry; reloading through it affects reports
    /// parsed afterwards.
    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }

    /// Starts parsing `report`.
    ///
    /// Detection and report-level decoding failures are returned here.
    /// Row failures are yielded by the returned iterator.
    pub fn parse<'r>(&self, report: &'r Report) -> Result<ReportEvents<'r>, ParseError> {
        let registry = self.registry.current();
        let definition = self
            .detector
            .resolve(&registry, report.file_name.as_deref())?;

        let format = match report.format {
            ReportFormat::Auto => self.config.report_format,
            explicit => explicit,
        };
        debug!(
            feed = %definition.feed_name,
            file_name = report.file_name.as_deref().unwrap_or_default(),
            ?format,
            "parsing report"
        );
        let rows = read_report_as(report, format)?;

        let normalizer = RowNormalizer::new(Arc::clone(&definition))
            .with_seed(seed_event(report))
            .overwrite_feed_name(self.config.overwrite_feed_name);
        Ok(ReportEvents::new(rows, normalizer))
    }
}

/// Copies report metadata into the event every row starts from.
fn seed_event(report: &Report) -> Event {
    let mut seed = Event::new();
    for (key, value) in &report.metadata {
        if let Err(outcome) = seed.add(key, value.clone()) {
            warn!(key = %key, "Ignoring report metadata: {outcome}");
        }
    }
    seed
}
