use maze_ngin::config::{AppConfig, MAX_SAMPLES};

#[test]
fn missing_file_is_created_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let config = AppConfig::load_or_default(&path);
    assert_eq!(config, AppConfig::default());
    assert!(path.exists());
    let written: AppConfig = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, config);
}

#[test]
fn saved_settings_are_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut config = AppConfig::default();
    config.vsync = false;
    config.window.fullscreen = true;
    config.window.x = Some(40);
    config.antialiasing.enabled = true;
    config.antialiasing.samples = 8;
    config.maze.seed = Some(99);
    config.save(&path).unwrap();
    assert_eq!(AppConfig::load_or_default(&path), config);
}

#[test]
fn invalid_file_falls_back_without_overwriting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn out_of_range_values_are_clamped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "antialiasing": { "enabled": true, "samples": 64 } }"#).unwrap();
    let config = AppConfig::load_or_default(&path);
    assert_eq!(config.antialiasing.samples, MAX_SAMPLES);
    assert!(config.antialiasing.enabled);
    assert!(config.vsync);
}
