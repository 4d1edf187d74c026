//! Configuration tests

use super::*;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_config_serialization() {
    let config = HostConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: HostConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(config.version, parsed.version);
    assert_eq!(parsed.discovery.manifest_key, "pluginHost");
}

#[test]
fn test_config_from_file() {
    let mut config = HostConfig::default();
    config.discovery.local_directory = PathBuf::from("./extensions");
    config.app.insert(
        "blog".to_string(),
        serde_json::json!({ "per_page": 20 }),
    );

    let temp_file = NamedTempFile::new().unwrap();
    config.save_to_file(temp_file.path()).unwrap();

    let loaded = HostConfig::from_file(temp_file.path()).unwrap();
    assert_eq!(loaded.discovery.local_directory, PathBuf::from("./extensions"));
    assert_eq!(loaded.app["blog"]["per_page"], 20);
}

#[test]
fn test_partial_config_uses_defaults() {
    let config: HostConfig = serde_yaml::from_str(
        r#"
version: "1.0"
discovery:
  auto_discover: false
"#,
    )
    .unwrap();

    assert!(!config.discovery.auto_discover);
    assert!(config.discovery.local_plugins);
    assert_eq!(config.discovery.local_directory, PathBuf::from("./plugins"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation() {
    let mut config = HostConfig::default();
    assert!(config.validate().is_ok());

    config.version = "2.0".to_string();
    assert!(config.validate().is_err());

    let mut config = HostConfig::default();
    config.discovery.manifest_key = " ".to_string();
    assert!(config.validate().is_err());

    let mut config = HostConfig::default();
    config.app.insert("blog".to_string(), serde_json::json!(3));
    assert!(config.validate().is_err());
}

#[test]
fn test_load_rejects_empty_file() {
    let temp_file = NamedTempFile::new().unwrap();
    assert!(HostConfig::load(Some(temp_file.path())).is_err());
}
