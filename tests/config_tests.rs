// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use filtercam::Config;
use filtercam::filters::{FilterMode, Intensity};
use filtercam::pipelines::photo::EncodingQuality;

#[test]
fn test_config_default() {
    // Test that default config can be created
    let config = Config::default();

    // Check sensible defaults
    assert_eq!(config.app_prefix, "FilterCam");
    assert_eq!(config.album, "FilterCam");
    assert_eq!(config.jpeg_quality, EncodingQuality::High);
    assert_eq!(config.default_filter, FilterMode::None);
    assert_eq!(config.default_intensity.value(), 50);
}

#[test]
fn test_initial_filter_follows_config() {
    let config = Config {
        default_filter: FilterMode::Blur,
        default_intensity: Intensity::new(80),
        ..Config::default()
    };
    let initial = config.initial_filter();
    assert_eq!(initial.mode, FilterMode::Blur);
    assert_eq!(initial.intensity.value(), 80);
}

#[test]
fn test_path_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        pictures_dir: Some(dir.path().join("pics")),
        favorites_file: Some(dir.path().join("favs.json")),
        ..Config::default()
    };
    assert_eq!(config.pictures_root(), dir.path().join("pics"));
    assert_eq!(config.favorites_path(), dir.path().join("favs.json"));
}

#[test]
fn test_config_json_uses_lowercase_names() {
    let json = serde_json::to_value(Config::default()).unwrap();
    assert_eq!(json["default_filter"], "none");
    assert_eq!(json["jpeg_quality"], "high");
    assert_eq!(json["default_intensity"], 50);
}
