use std::fs;
use std::path::Path;

use scanfeed_standards::{MappingRegistry, RegistryHandle, SchemaError};

const CHARGEN_V1: &str = r#"{
  "_meta": {"date_created": "2023-01-17", "change_log": ["Added scan_chargen."]},
  "scan_chargen": {
    "feed_name": "Open-Chargen",
    "file_name": "scan_chargen",
    "required_fields": [
      ["time.source", "timestamp", "add_UTC_to_timestamp"],
      ["source.ip", "ip", "validate_ip"]
    ],
    "optional_fields": [["extra.", "tag"], [false, "sector"]],
    "constant_fields": {"classification.identifier": "open-chargen"}
  }
}"#;

const CHARGEN_V2: &str = r#"{
  "_meta": {"date_created": "2023-02-01", "change_log": ["Added scan_ftp."]},
  "scan_chargen": {
    "feed_name": "Open-Chargen",
    "file_name": "scan_chargen",
    "required_fields": [["source.ip", "ip"]]
  },
  "scan_ftp": {
    "feed_name": "Accessible-FTP",
    "file_name": "scan_ftp",
    "required_fields": [["source.ip", "ip"]]
  }
}"#;

fn write_schema(path: &Path, text: &str) {
    fs::write(path, text).expect("write schema");
}

#[test]
fn loads_schema_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("schema.json");
    write_schema(&path, CHARGEN_V1);

    let registry = MappingRegistry::load(&path).expect("load schema");
    assert_eq!(registry.len(), 1);
    let (feed_name, definition) = registry.lookup_by_filename_key("scan_chargen").unwrap();
    assert_eq!(feed_name, "Open-Chargen");
    assert_eq!(definition.required_fields.len(), 2);
    assert_eq!(definition.optional_fields.len(), 2);

    insta::assert_json_snapshot!(registry.meta(), @r#"
    {
      "date_created": "2023-01-17",
      "change_log": [
        "Added scan_chargen."
      ]
    }
    "#);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = MappingRegistry::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SchemaError::Io { .. }));
}

#[test]
fn malformed_documents_are_rejected() {
    assert!(matches!(
        MappingRegistry::from_json("[1, 2]"),
        Err(SchemaError::Json { .. })
    ));
    assert!(matches!(
        MappingRegistry::from_json(r#"{"scan_x": {"feed_name": "X"}}"#),
        Err(SchemaError::InvalidReport { .. })
    ));
    assert!(matches!(
        MappingRegistry::from_json(
            r#"{"scan_x": {"feed_name": "X", "file_name": "scan_x",
                "constant_fields": {"classification.type": "not-a-type"}}}"#
        ),
        Err(SchemaError::InvalidConstant { .. })
    ));
}

#[test]
fn reload_swaps_only_on_change() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("schema.json");
    write_schema(&path, CHARGEN_V1);

    let handle = RegistryHandle::new(MappingRegistry::load(&path).unwrap());
    let before = handle.current();

    assert!(!handle.reload_from(&path).unwrap());
    assert!(std::sync::Arc::ptr_eq(&before, &handle.current()));

    write_schema(&path, CHARGEN_V2);
    assert!(handle.reload_from(&path).unwrap());

    let after = handle.current();
    assert!(after.lookup_by_filename_key("scan_ftp").is_some());
    assert_ne!(before.digest(), after.digest());
    // snapshots taken earlier are untouched
    assert!(before.lookup_by_filename_key("scan_ftp").is_none());
}

#[test]
fn failed_reload_keeps_current_registry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("schema.json");
    write_schema(&path, CHARGEN_V1);
    let handle = RegistryHandle::new(MappingRegistry::load(&path).unwrap());

    write_schema(&path, "{ not json");
    assert!(handle.reload_from(&path).is_err());
    assert!(handle.current().lookup_by_feedname("Open-Chargen").is_some());
}

#[test]
fn bundled_schema_covers_reference_feeds() {
    let registry = MappingRegistry::bundled().unwrap();
    for key in [
        "blocklist",
        "scan_chargen",
        "scan_http",
        "scan_ftp",
        "scan_exchange",
        "event4_sinkhole_http",
        "event4_honeypot_brute_force",
    ] {
        assert!(registry.lookup_by_filename_key(key).is_some(), "{key}");
    }
}
