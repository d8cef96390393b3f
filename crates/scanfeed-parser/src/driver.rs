//! Turns one report into a lazy sequence of events.

use serde::Serialize;
use tracing::{error, info};

use scanfeed_ingest::ReportRows;
use scanfeed_map::RowNormalizer;
use scanfeed_model::Event;

use crate::error::ParseError;

/// Counts for one report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseSummary {
    pub feed_name: String,
    pub events: usize,
    pub problems: usize,
}

/// Events of one report, in row order.
///
/// A failing row yields an `Err` and iteration continues with the next
/// row. A decoding error ends the sequence after it is yielded.
pub struct ReportEvents<'a> {
    rows: ReportRows<'a>,
    normalizer: RowNormalizer,
    summary: ParseSummary,
    finished: bool,
}

impl<'a> ReportEvents<'a> {
    pub(crate) fn new(rows: ReportRows<'a>, normalizer: RowNormalizer) -> Self {
        let summary = ParseSummary {
            feed_name: normalizer.feed_name().to_string(),
            ..ParseSummary::default()
        };
        Self {
            rows,
            normalizer,
            summary,
            finished: false,
        }
    }

    pub fn feed_name(&self) -> &str {
        &self.summary.feed_name
    }

    /// Counts so far; final once the iterator is exhausted.
    pub fn summary(&self) -> &ParseSummary {
        &self.summary
    }

    fn finish(&mut self) {
        self.finished = true;
        info!(
            feed = %self.summary.feed_name,
            "Sent {} events and found {} problem(s).",
            self.summary.events,
            self.summary.problems
        );
    }
}

impl Iterator for ReportEvents<'_> {
    type Item = Result<Event, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let Some(row) = self.rows.next() else {
            self.finish();
            return None;
        };

        let result = match row {
            Ok(row) => self.normalizer.normalize(&row).map_err(|err| {
                error!(feed = %self.summary.feed_name, line = row.line(), "{err}");
                ParseError::from(err)
            }),
            Err(err) => {
                error!(feed = %self.summary.feed_name, "{err}");
                Err(ParseError::from(err))
            }
        };
        match &result {
            Ok(_) => self.summary.events += 1,
            Err(_) => self.summary.problems += 1,
        }
        Some(result)
    }
}
