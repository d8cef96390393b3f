use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use scanfeed_ingest::IngestError;
use scanfeed_map::MapError;
use scanfeed_model::{Event, FieldValue, Report, ReportFormat};
use scanfeed_parser::{
    DetectError, LogConfig, LogFormat, ParseError, ParseSummary, ParserConfig, ScanFeedParser,
    logging::build_subscriber,
};

const BLOCKLIST_CSV: &str = "timestamp,ip,hostname,tag,source,asn,geo\n\
2019-09-04T07:00:19,198.123.245.134,,Malicious Host AA,Alien Vault,5678,US\n";

const CHARGEN_CSV: &str = "\"timestamp\",\"ip\",\"protocol\",\"port\",\"hostname\",\"tag\",\"asn\",\"geo\",\"region\",\"city\",\"naics\",\"sic\",\"size\",\"sector\"\n\
\"2019-01-01 10:21:46\",\"10.0.0.1\",\"udp\",19,\"host1.example.com\",\"chargen\",1234,\"AT\",\"WIEN\",\"WIEN\",0,0,116,\"Communications\"\n\
\"2019-01-01 10:21:47\",\"10.0.0.2\",\"udp\",\"nineteen\",,\"chargen\",1234,\"AT\",\"WIEN\",\"WIEN\",0,0,116,\n\
\"2019-01-01 10:21:48\",\"10.0.0.3\",\"udp\",19,,\"chargen\",0,\"AT\",\"WIEN\",\"WIEN\",0,0,,\n";

fn parser() -> ScanFeedParser {
    ScanFeedParser::from_config(ParserConfig::default()).expect("bundled schema")
}

fn parse_all(parser: &ScanFeedParser, report: &Report) -> Vec<Result<Event, ParseError>> {
    parser.parse(report).expect("report accepted").collect()
}

fn text(value: &str) -> FieldValue {
    FieldValue::from(value)
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut inner) = self.0.lock() {
            inner.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let config = LogConfig::default()
        .with_format(LogFormat::Compact)
        .with_ansi(false)
        .with_timestamps(false);
    let result = tracing::subscriber::with_default(build_subscriber(&config, logs.clone()), f);
    (result, logs.contents())
}

#[test]
fn blocklist_report_becomes_one_event() {
    let report = Report::new(BLOCKLIST_CSV)
        .with_file_name("2019-09-04-blocklist-world.csv")
        .with_metadata("feed.provider", "Shadowserver");
    let events = parse_all(&parser(), &report);
    assert_eq!(events.len(), 1);
    let event = events.into_iter().next().unwrap().unwrap();

    insta::assert_json_snapshot!(event, @r#"
    {
      "classification.identifier": "blacklisted-ip",
      "classification.taxonomy": "other",
      "classification.type": "blacklist",
      "feed.name": "Blocklist",
      "feed.provider": "Shadowserver",
      "source.asn": 5678,
      "source.geolocation.cc": "US",
      "source.ip": "198.123.245.134",
      "time.source": "2019-09-04T07:00:19+00:00",
      "extra": {
        "source": "Alien Vault",
        "tag": "Malicious Host AA"
      },
      "raw": "2019-09-04T07:00:19,198.123.245.134,,Malicious Host AA,Alien Vault,5678,US"
    }
    "#);
}

#[test]
fn zero_asn_and_null_ip_are_left_out() {
    let body = "timestamp,ip,asn\n2019-09-04T07:00:19,0.0.0.0,0\n";
    let report = Report::new(body).with_file_name("blocklist.csv");
    let event = parse_all(&parser(), &report).remove(0).unwrap();

    assert!(!event.contains("source.asn"));
    assert!(!event.contains("source.ip"));
    assert!(event.get_extra("asn").is_none());
    assert_eq!(event.get("time.source"), Some(&text("2019-09-04T07:00:19+00:00")));
}

#[test]
fn missing_optional_column_only_warns() {
    let body = "timestamp,ip\n2019-09-04T07:00:19,198.123.245.134\n";
    let report = Report::new(body).with_file_name("blocklist.csv");
    let (events, logs) = capture(|| parse_all(&parser(), &report));

    assert_eq!(events.len(), 1);
    assert!(events[0].is_ok());
    assert!(logs.contains("WARN"));
    assert!(logs.contains(
        "Optional key tag not found in feed Blocklist. \
         Possible change in data format or misconfiguration."
    ));
}

#[test]
fn missing_required_column_fails_the_row() {
    let body = "timestamp,tag\n2019-09-04T07:00:19,x\n";
    let report = Report::new(body).with_file_name("blocklist.csv");
    let events = parse_all(&parser(), &report);

    assert_eq!(events.len(), 1);
    match &events[0] {
        Err(ParseError::Map(err @ MapError::MissingRequiredColumn { .. })) => {
            assert_eq!(err.column(), "ip");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn truncated_record_keeps_its_trailing_required_column() {
    let body = "asn,timestamp,ip\n5678,2019-09-04T07:00:19\n";
    let report = Report::new(body).with_file_name("blocklist.csv");
    let event = parse_all(&parser(), &report).remove(0).unwrap();

    assert!(!event.contains("source.ip"));
    assert_eq!(event.get("source.asn"), Some(&FieldValue::Integer(5678)));
    assert_eq!(event.raw(), "5678,2019-09-04T07:00:19");
}

#[test]
fn failing_row_does_not_stop_the_report() {
    let report = Report::new(CHARGEN_CSV).with_file_name("2019-01-01-scan_chargen-world.csv");
    let parser = parser();

    let ((results, summary), logs) = capture(|| {
        let mut events = parser.parse(&report).expect("report accepted");
        let results: Vec<_> = events.by_ref().collect();
        (results, events.summary().clone())
    });

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(ParseError::Map(MapError::Conversion { .. }))
    ));
    assert!(results[2].is_ok());
    assert_eq!(
        summary,
        ParseSummary {
            feed_name: "Open-Chargen".to_string(),
            events: 2,
            problems: 1,
        }
    );
    assert!(logs.contains("Sent 2 events and found 1 problem(s)."));

    let first = results[0].as_ref().unwrap();
    assert_eq!(first.get("source.port"), Some(&FieldValue::Integer(19)));
    assert_eq!(first.get("response_size"), None);
    assert_eq!(first.get_extra("response_size"), Some(&FieldValue::Integer(116)));
    assert_eq!(first.get("protocol.application"), Some(&text("chargen")));
    assert!(first.get_extra("sector").is_none());
    assert!(first.get_extra("naics").is_none());

    let third = results[2].as_ref().unwrap();
    assert!(!third.contains("source.asn"));
    assert_eq!(third.raw(), CHARGEN_CSV.lines().nth(3).unwrap());
}

#[test]
fn report_level_failures_are_returned_up_front() {
    let parser = parser();

    let unnamed = Report::new(BLOCKLIST_CSV);
    assert!(matches!(
        parser.parse(&unnamed),
        Err(ParseError::Detect(DetectError::NoFileName))
    ));

    let unknown = Report::new(BLOCKLIST_CSV).with_file_name("some_string.csv");
    let err = parser.parse(&unknown).err().unwrap();
    assert_eq!(
        err.to_string(),
        "Could not get a config for \"some_string\", check the documentation."
    );

    let empty = Report::new("").with_file_name("blocklist.csv");
    assert!(matches!(
        parser.parse(&empty),
        Err(ParseError::Ingest(IngestError::EmptyReport))
    ));
}

#[test]
fn fixed_feed_name_skips_detection() {
    let parser =
        ScanFeedParser::from_config(ParserConfig::default().with_feed_name("Blocklist")).unwrap();
    let report = Report::new(BLOCKLIST_CSV);
    let events = parse_all(&parser, &report);
    assert_eq!(
        events[0].as_ref().unwrap().get("feed.name"),
        Some(&text("Blocklist"))
    );
}

#[test]
fn report_feed_name_is_kept_unless_overwritten() {
    let report = Report::new(BLOCKLIST_CSV)
        .with_file_name("blocklist.csv")
        .with_metadata("feed.name", "My Blocklist");

    let kept = parse_all(&parser(), &report).remove(0).unwrap();
    assert_eq!(kept.get("feed.name"), Some(&text("My Blocklist")));

    let config = ParserConfig {
        overwrite_feed_name: true,
        ..ParserConfig::default()
    };
    let parser = ScanFeedParser::from_config(config).unwrap();
    let overwritten = parse_all(&parser, &report).remove(0).unwrap();
    assert_eq!(overwritten.get("feed.name"), Some(&text("Blocklist")));
}

#[test]
fn json_reports_are_normalized_like_csv() {
    let body = r#"[
  {"timestamp": "2019-01-01 10:21:46", "ip": "10.0.0.1", "port": 19, "asn": 1234, "sector": null, "extra_field": "kept"}
]"#;
    let report = Report::new(body).with_file_name("scan_chargen.csv");
    let event = parse_all(&parser(), &report).remove(0).unwrap();

    assert_eq!(event.get("source.port"), Some(&FieldValue::Integer(19)));
    assert_eq!(event.get("source.asn"), Some(&FieldValue::Integer(1234)));
    assert_eq!(event.get_extra("extra_field"), Some(&text("kept")));
    assert!(event.raw().starts_with('{'));
    assert!(event.raw().contains("\"extra_field\": \"kept\""));
}

#[test]
fn configured_format_applies_to_undeclared_reports() {
    let body = "{\"timestamp\": \"2019-09-04T07:00:19\", \"ip\": \"198.123.245.134\"}\n";
    let config = ParserConfig {
        report_format: ReportFormat::Json,
        ..ParserConfig::default()
    };
    let parser = ScanFeedParser::from_config(config).unwrap();

    let report = Report::new(body).with_file_name("blocklist.csv");
    let event = parse_all(&parser, &report).remove(0).unwrap();
    assert_eq!(event.get("source.ip"), Some(&text("198.123.245.134")));

    let declared = Report::new(body)
        .with_file_name("blocklist.csv")
        .with_format(ReportFormat::Csv);
    assert!(matches!(
        parser.parse(&declared),
        Err(ParseError::Ingest(IngestError::NoDataRows))
    ));
}

#[test]
fn sinkhole_url_is_rebuilt_from_host_and_request() {
    let body = "timestamp,src_ip,src_port,dst_ip,dst_port,http_host,http_url,http_agent\n\
2021-03-01 00:00:03,192.0.2.7,49152,203.0.113.5,80,evil.example,GET /gate.php HTTP/1.1,curl/7.68\n";
    let report = Report::new(body).with_file_name("2021-03-01-event4_sinkhole_http-asn.csv");
    let event = parse_all(&parser(), &report).remove(0).unwrap();

    assert_eq!(
        event.get("destination.url"),
        Some(&text("http://evil.example/gate.php"))
    );
    assert_eq!(event.get("destination.fqdn"), Some(&text("evil.example")));
    assert_eq!(event.get("user_agent"), Some(&text("curl/7.68")));
}

#[test]
fn config_file_selects_schema_and_feed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = dir.path().join("schema.json");
    fs::write(
        &schema,
        r#"{
  "scan_chargen": {
    "feed_name": "Open-Chargen",
    "file_name": "scan_chargen",
    "required_fields": [["source.ip", "ip", "validate_ip"]]
  }
}"#,
    )
    .expect("write schema");
    let config_path = dir.path().join("parser.toml");
    fs::write(
        &config_path,
        format!(
            "feed_name = \"Open-Chargen\"\nschema_file = {:?}\n\n[logging]\nlevel = \"debug\"\n",
            schema.display().to_string()
        ),
    )
    .expect("write config");

    let config = ParserConfig::load(&config_path).expect("load config");
    let parser = ScanFeedParser::from_config(config).expect("parser");
    assert_eq!(parser.registry().current().len(), 1);

    let report = Report::new("ip,port\n10.0.0.1,19\n");
    let event = parse_all(&parser, &report).remove(0).unwrap();
    assert_eq!(event.get("feed.name"), Some(&text("Open-Chargen")));
    assert_eq!(event.get_extra("port"), Some(&text("19")));
}

#[test]
fn reload_applies_to_later_reports_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = dir.path().join("schema.json");
    let definition = |target: &str| {
        format!(
            r#"{{"scan_chargen": {{"feed_name": "Open-Chargen", "file_name": "scan_chargen",
                "required_fields": [["source.ip", "ip"]],
                "optional_fields": [["{target}", "port", "convert_int"]]}}}}"#
        )
    };
    fs::write(&schema, definition("source.port")).expect("write schema");

    let parser =
        ScanFeedParser::from_config(ParserConfig::default().with_schema_file(&schema)).unwrap();
    let report = Report::new("ip,port\n10.0.0.1,19\n10.0.0.2,20\n").with_file_name("scan_chargen.csv");

    let mut in_flight = parser.parse(&report).unwrap();
    let before = in_flight.next().unwrap().unwrap();
    assert_eq!(before.get("source.port"), Some(&FieldValue::Integer(19)));

    fs::write(&schema, definition("destination.port")).expect("rewrite schema");
    assert!(parser.registry().reload_from(&schema).unwrap());
    assert!(!parser.registry().reload_from(&schema).unwrap());

    let still_old = in_flight.next().unwrap().unwrap();
    assert_eq!(still_old.get("source.port"), Some(&FieldValue::Integer(20)));

    let after = parse_all(&parser, &report).remove(0).unwrap();
    assert!(!after.contains("source.port"));
    assert_eq!(after.get("destination.port"), Some(&FieldValue::Integer(19)));
}
