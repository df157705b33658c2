use std::io::Write;

use relume_core::{ServiceConfig, StoreConfig};

#[test]
fn test_load_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    write!(
        file,
        r#"{{
            "store": {{ "backend": "shared_memory", "name": "rig-a" }},
            "artnet": {{ "target": "192.168.0.14", "universe": 1, "refresh_hz": 30 }},
            "poll_interval_ms": 10
        }}"#
    )
    .expect("Failed to write config");

    let config = ServiceConfig::from_json_file(file.path()).expect("Failed to load config");

    assert_eq!(
        config.store,
        StoreConfig::SharedMemory {
            name: "rig-a".to_string()
        }
    );
    assert_eq!(config.artnet.target, "192.168.0.14");
    assert_eq!(config.artnet.universe, 1);
    assert_eq!(config.artnet.refresh_hz, 30);
    assert_eq!(config.poll_interval_ms, 10);
}

#[test]
fn test_missing_file_is_an_error() {
    let result = ServiceConfig::from_json_file(std::path::Path::new("/nonexistent/relume.json"));
    assert!(result.is_err());
}

#[test]
fn test_malformed_json_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    write!(file, "not json").expect("Failed to write config");

    let result = ServiceConfig::from_json_file(file.path());
    assert!(result.is_err());
}
