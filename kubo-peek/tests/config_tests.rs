// ABOUTME: Tests for configuration file loading, validation, and merging
// ABOUTME: Tests TOML parsing, XDG path resolution, precedence, and resolution into settings

use kubo_peek::config::Config;
use log::LevelFilter;
use serial_test::serial;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Should create config dir");
    }
    std::fs::write(&path, content).expect("Should write config file");
    path
}

#[test]
fn test_config_deserialize_complete() {
    let toml_content = r#"
        api_url = "http://192.168.1.20:5001"
        queue_capacity = 250
        abandon_log_level = "info"
    "#;

    let config: Config = toml::from_str(toml_content).expect("Should parse valid TOML");

    assert_eq!(config.api_url, Some("http://192.168.1.20:5001".to_string()));
    assert_eq!(config.queue_capacity, Some(250));
    assert_eq!(config.abandon_log_level, Some("info".to_string()));

    let settings = config.resolve().expect("Should resolve");
    assert_eq!(settings.api_url.as_str(), "http://192.168.1.20:5001/");
    assert_eq!(settings.queue_capacity, 250);
    assert_eq!(settings.abandon_log_level, LevelFilter::Info);
}

#[test]
fn test_config_deserialize_empty() {
    let config: Config = toml::from_str("").expect("Should parse empty TOML");
    assert_eq!(config, Config::default());
}

#[test]
fn test_invalid_log_level_rejected() {
    let result: Result<Config, _> = toml::from_str(r#"abandon_log_level = "loud""#);
    let err = result.unwrap_err().to_string();
    assert!(err.contains("Invalid log level 'loud'"));
}

#[test]
fn test_unknown_keys_rejected() {
    let result: Result<Config, _> = toml::from_str(r#"retries = 3"#);
    assert!(result.is_err());
}

#[test]
fn test_load_from_file_validates() {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let path = write_config(&temp_dir, "bad.toml", "queue_capacity = 0\n");

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("queue_capacity must be at least 1"));
}

#[test]
fn test_load_from_paths_precedence() {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let user = write_config(
        &temp_dir,
        "user.toml",
        r#"
            api_url = "http://10.0.0.1:5001"
            queue_capacity = 10
        "#,
    );
    let project = write_config(&temp_dir, "project.toml", "queue_capacity = 20\n");
    let missing = temp_dir.path().join("missing.toml");

    let config = Config::load_from_paths(&[user, missing, project]).expect("Should load");

    assert_eq!(config.api_url, Some("http://10.0.0.1:5001".to_string()));
    assert_eq!(config.queue_capacity, Some(20));
}

#[test]
fn test_load_from_paths_propagates_parse_errors() {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let broken = write_config(&temp_dir, "broken.toml", "api_url = \n");

    assert!(Config::load_from_paths(&[broken]).is_err());
}

#[test]
#[serial]
fn test_xdg_config_home_is_searched() {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    write_config(
        &temp_dir,
        "kubo-peek/config.toml",
        "abandon_log_level = \"warn\"\n",
    );

    let previous = std::env::var_os("XDG_CONFIG_HOME");
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let paths = Config::get_config_paths();
    let config = Config::load_with(None);

    unsafe {
        match previous {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    assert!(paths.contains(&temp_dir.path().join("kubo-peek").join("config.toml")));
    assert!(paths.last().unwrap().ends_with("kubo-peek.toml"));
    assert_eq!(
        config.expect("Should load").abandon_log_level,
        Some("warn".to_string())
    );
}

#[test]
#[serial]
fn test_explicit_config_overrides_standard_locations() {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let explicit = write_config(&temp_dir, "explicit.toml", "queue_capacity = 3\n");

    let config = Config::load_with(Some(explicit.as_path())).expect("Should load");
    assert_eq!(config.queue_capacity, Some(3));

    let missing = temp_dir.path().join("nope.toml");
    assert!(Config::load_with(Some(missing.as_path())).is_err());
}
