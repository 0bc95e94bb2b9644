use std::path::Path;

use havenbrowser::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use havenbrowser::types::settings::BrowserSettings;
use rstest::rstest;

fn temp_config_path() -> String {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json").to_string_lossy().to_string();
    // Leak the tempdir so it doesn't get cleaned up during the test
    std::mem::forget(dir);
    path
}

#[test]
fn test_load_defaults_when_no_file() {
    let path = temp_config_path();
    let mut engine = SettingsEngine::new(Some(path));
    let settings = engine.load().unwrap();
    assert_eq!(settings, BrowserSettings::default());
}

#[test]
fn test_save_and_load_roundtrip() {
    let path = temp_config_path();
    let mut engine = SettingsEngine::new(Some(path.clone()));

    // Load defaults
    engine.load().unwrap();

    // Modify a setting
    engine
        .set_value("general.restore_tabs", serde_json::Value::Bool(false))
        .unwrap();

    // Create a new engine and load from disk
    let mut engine2 = SettingsEngine::new(Some(path));
    let loaded = engine2.load().unwrap();
    assert!(!loaded.general.restore_tabs);
}

#[test]
fn test_get_config_path() {
    let path = "/tmp/test_settings.json".to_string();
    let engine = SettingsEngine::new(Some(path.clone()));
    assert_eq!(engine.get_config_path(), path);
}

#[test]
fn test_default_config_path_uses_platform() {
    let engine = SettingsEngine::new(None);
    let path = engine.get_config_path();
    assert!(path.contains("settings.json"));
    assert!(path.to_lowercase().contains("havenbrowser"));
}

#[test]
fn test_reset_restores_defaults() {
    let path = temp_config_path();
    let mut engine = SettingsEngine::new(Some(path));
    engine.load().unwrap();

    // Change a setting
    engine
        .set_value("supervisor.max_restart_attempts", serde_json::json!(9))
        .unwrap();
    assert_eq!(engine.get_settings().supervisor.max_restart_attempts, 9);

    // Reset
    engine.reset().unwrap();
    assert_eq!(engine.get_settings().supervisor.max_restart_attempts, 5);
    assert_eq!(*engine.get_settings(), BrowserSettings::default());
}

#[test]
fn test_set_value_dot_notation() {
    let path = temp_config_path();
    let mut engine = SettingsEngine::new(Some(path));
    engine.load().unwrap();

    engine
        .set_value("general.start_hidden", serde_json::Value::Bool(true))
        .unwrap();
    assert!(engine.get_settings().general.start_hidden);

    engine
        .set_value("supervisor.restart_delay_ms", serde_json::json!(3500))
        .unwrap();
    assert_eq!(engine.get_settings().supervisor.restart_delay_ms, 3500);

    engine
        .set_value("session.recovery_reload_delay_ms", serde_json::json!(250))
        .unwrap();
    assert_eq!(engine.get_settings().session.recovery_reload_delay_ms, 250);

    engine
        .set_value(
            "general.homepage",
            serde_json::Value::String("https://github.com".to_string()),
        )
        .unwrap();
    assert_eq!(engine.get_settings().general.homepage, "https://github.com");
}

#[test]
fn test_set_value_invalid_key() {
    let path = temp_config_path();
    let mut engine = SettingsEngine::new(Some(path));
    engine.load().unwrap();

    let result = engine.set_value("nonexistent.key", serde_json::Value::Bool(true));
    assert!(result.is_err());
}

#[test]
fn test_set_value_empty_key() {
    let path = temp_config_path();
    let mut engine = SettingsEngine::new(Some(path));
    engine.load().unwrap();

    let result = engine.set_value("", serde_json::Value::Bool(true));
    assert!(result.is_err());
}

#[test]
fn test_set_value_invalid_value_type() {
    let path = temp_config_path();
    let mut engine = SettingsEngine::new(Some(path));
    engine.load().unwrap();

    // Try setting a boolean field to a string — should fail deserialization
    let result = engine.set_value(
        "general.restore_tabs",
        serde_json::Value::String("not_a_bool".to_string()),
    );
    assert!(result.is_err());
}

#[test]
fn test_load_malformed_json() {
    let path = temp_config_path();
    // Write malformed JSON
    if let Some(parent) = Path::new(&path).parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, "{ invalid json }").unwrap();

    let mut engine = SettingsEngine::new(Some(path));
    let result = engine.load();
    assert!(result.is_err());
}

#[rstest]
#[case("general.restore_tabs", serde_json::Value::Bool(true))]
#[case("supervisor.max_restart_attempts", serde_json::json!(5))]
#[case("supervisor.restart_delay_ms", serde_json::json!(2000))]
#[case("supervisor.health_check_interval_ms", serde_json::json!(1000))]
#[case("supervisor.shutdown_grace_ms", serde_json::json!(5000))]
#[case("session.restore_delay_ms", serde_json::json!(1000))]
#[case("session.recovery_reload_delay_ms", serde_json::json!(1000))]
fn test_default_values(#[case] key: &str, #[case] expected: serde_json::Value) {
    let defaults = serde_json::to_value(BrowserSettings::default()).unwrap();
    let mut current = &defaults;
    for part in key.split('.') {
        current = current.get(part).unwrap();
    }
    assert_eq!(*current, expected, "unexpected default for {}", key);
}

#[test]
fn test_default_settings_values() {
    let defaults = BrowserSettings::default();

    // General
    assert!(defaults.general.restore_tabs);
    assert!(!defaults.general.start_hidden);
    assert_eq!(defaults.general.homepage, "");

    // Session
    assert!(defaults.session.snapshot_pretty);
}
