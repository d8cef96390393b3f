//! Parses shadowserver-style scan reports into normalized events.
//!
//! ```no_run
//! use scanfeed_model::Report;
//! use scanfeed_parser::{ParserConfig, ScanFeedParser};
//!
//! let parser = ScanFeedParser::from_config(ParserConfig::default())?;
//! let report = Report::new(std::fs::read_to_string("2019-01-01-scan_chargen-world.csv")?)
//!     .with_file_name("2019-01-01-scan_chargen-world.csv");
//! for event in parser.parse(&report)? {
//!     match event {
//!         Ok(event) => println!("{}", serde_json::to_string(&event)?),
//!         Err(err) => eprintln!("{err}"),
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod detector;
pub mod driver;
pub mod error;
pub mod logging;
pub mod parser;

pub use config::{LogSettings, ParserConfig};
pub use detector::FeedDetector;
pub use driver::{ParseSummary, ReportEvents};
pub use error::{ConfigError, DetectError, ParseError};
pub use logging::{LogConfig, LogFormat, init_logging};
pub use parser::ScanFeedParser;
