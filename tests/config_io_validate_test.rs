use soltaro_bridge::config::{Config, DEFAULT_HWID};
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.qendercore.username = "alice".to_string();
    cfg.qendercore.password = "secret".to_string();
    cfg.hubitat.device_id = "31".to_string();
    cfg.state_file = tmp_dir.path().join("state.json");

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.qendercore.username, "alice");
    assert_eq!(loaded.hubitat.device_id, "31");
    assert_eq!(loaded.state_file, cfg.state_file);
    // secrets are never written back
    assert!(loaded.qendercore.password.is_empty());
    assert!(!fs::read_to_string(&path).unwrap().contains("secret"));
}

#[test]
fn partial_yaml_fills_defaults() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        b"qendercore:\n  username: bob\npoll_seconds: 120\n",
    )
    .unwrap();

    let cfg = Config::from_file(tmp.path()).unwrap();
    assert_eq!(cfg.qendercore.username, "bob");
    assert_eq!(cfg.qendercore.hwid, DEFAULT_HWID);
    assert_eq!(cfg.poll_seconds, 120);
    assert_eq!(cfg.logging.level, "INFO");
}

#[test]
fn load_without_file_uses_defaults() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let cfg = Config::load(tmp_dir.path().join("absent.yaml")).unwrap();
    assert!(cfg.poll_seconds > 0);
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();
    cfg.qendercore.username = "alice".into();
    cfg.qendercore.password = "secret".into();
    assert!(cfg.validate().is_ok());

    let mut bad = cfg.clone();
    bad.qendercore.hwid.clear();
    assert!(bad.validate().is_err());

    let mut bad = cfg.clone();
    bad.poll_seconds = 0;
    assert!(bad.validate().is_err());

    let mut bad = cfg;
    bad.qendercore.password.clear();
    assert!(bad.validate().is_err());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("Serialization error"));
}
