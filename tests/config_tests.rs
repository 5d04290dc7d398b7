// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use vision_camera::Config;
use vision_camera::VideoQuality;

fn temp_config_path() -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("vision-camera-config-{}", uuid::Uuid::new_v4()))
        .join("config.toml")
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(config.auto_save, "Captures should be saved by default");
    assert!(
        config.haptic_feedback,
        "Haptic feedback should be enabled by default"
    );
    assert_eq!(config.quality, VideoQuality::FullHd);
}

#[test]
fn test_config_has_no_baked_in_keys() {
    let config = Config::default();
    assert!(
        config.recognition.api_key.is_none(),
        "Recognition key must come from the config file or environment"
    );
    assert!(config.chat.api_key.is_none());
}

#[test]
fn test_config_save_and_reload() {
    let path = temp_config_path();
    let mut config = Config::default();
    config.auto_save = false;
    config.quality = VideoQuality::Sd;
    config.chat.model = "sonar-pro".to_string();

    config.save_to(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded, config);

    if let Some(dir) = path.parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}

#[test]
fn test_config_rejects_broken_toml() {
    let path = temp_config_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "quality = [not toml").unwrap();

    assert!(Config::from_file(&path).is_err());

    std::fs::remove_dir_all(path.parent().unwrap()).ok();
}

#[test]
fn test_config_unknown_quality_is_rejected() {
    let result: Result<Config, _> = toml::from_str(r#"quality = "4k""#);
    assert!(result.is_err());
}
