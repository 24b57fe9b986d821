//! Unit tests for configuration resolution
//!
//! Covers priority order (CLI > environment > TOML > compiled defaults),
//! graceful handling of a missing config file (warning plus defaults) and
//! rejection of a malformed one.
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate AQDASH_* variables are marked with #[serial].

use aqdash_common::config::{
    load_toml_config, locate_config_file, CliOverrides, CompiledDefaults, Settings, ENV_BIND_ADDR,
    ENV_CACHE_MAX_AGE_SECS, ENV_CONFIG, ENV_DENYLIST, ENV_FEED_URL, ENV_FETCH_TIMEOUT_SECS,
    ENV_LOG_LEVEL, ENV_REFRESH_INTERVAL_SECS,
};
use aqdash_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

fn clear_env() {
    for name in [
        ENV_CONFIG,
        ENV_FEED_URL,
        ENV_BIND_ADDR,
        ENV_CACHE_MAX_AGE_SECS,
        ENV_FETCH_TIMEOUT_SECS,
        ENV_REFRESH_INTERVAL_SECS,
        ENV_DENYLIST,
        ENV_LOG_LEVEL,
    ] {
        env::remove_var(name);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Should create temp file");
    file.write_all(content.as_bytes()).expect("Should write config");
    file
}

fn cli_with_config(path: PathBuf) -> CliOverrides {
    CliOverrides {
        config_path: Some(path),
        ..Default::default()
    }
}

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::default();

    assert!(defaults.feed_url.ends_with("pollutant_data.json"));
    assert_eq!(defaults.denylist, vec!["MOD-00616", "MOD-00628"]);
    assert_eq!(defaults.cache_max_age_secs, 900);
    assert_eq!(defaults.log_level, "info");
}

#[test]
#[serial]
fn test_settings_from_toml_file() {
    clear_env();
    let file = write_config(
        r#"
feed_url = "https://example.org/feed.json"
denylist = ["MOD-1"]
cache_max_age_secs = 60
fetch_timeout_secs = 5
refresh_interval_secs = 0
bind_addr = "0.0.0.0:8080"

[logging]
level = "debug"
"#,
    );

    let settings = Settings::resolve(&cli_with_config(file.path().to_path_buf())).unwrap();

    assert_eq!(settings.feed_url, "https://example.org/feed.json");
    assert!(settings.denylist.contains("MOD-1"));
    assert!(!settings.denylist.contains("MOD-00616"));
    assert_eq!(settings.cache_max_age, Duration::from_secs(60));
    assert_eq!(settings.fetch_timeout, Duration::from_secs(5));
    assert_eq!(settings.refresh_interval, None);
    assert_eq!(settings.bind_addr, "0.0.0.0:8080");
    assert_eq!(settings.log_level, "debug");
    assert_eq!(settings.config_file.as_deref(), Some(file.path()));
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    let file = write_config("feed_url = \"https://toml.example/feed.json\"\ncache_max_age_secs = 60\n");
    env::set_var(ENV_FEED_URL, "https://env.example/feed.json");
    env::set_var(ENV_DENYLIST, "MOD-7, MOD-8");

    let settings = Settings::resolve(&cli_with_config(file.path().to_path_buf())).unwrap();

    assert_eq!(settings.feed_url, "https://env.example/feed.json");
    assert_eq!(settings.cache_max_age, Duration::from_secs(60));
    assert!(settings.denylist.contains("MOD-7"));
    assert!(settings.denylist.contains("MOD-8"));

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    let file = write_config("");
    env::set_var(ENV_BIND_ADDR, "127.0.0.1:9000");
    env::set_var(ENV_CACHE_MAX_AGE_SECS, "30");

    let cli = CliOverrides {
        config_path: Some(file.path().to_path_buf()),
        bind_addr: Some("127.0.0.1:9100".to_string()),
        cache_max_age_secs: Some(10),
        ..Default::default()
    };
    let settings = Settings::resolve(&cli).unwrap();

    assert_eq!(settings.bind_addr, "127.0.0.1:9100");
    assert_eq!(settings.cache_max_age, Duration::from_secs(10));

    clear_env();
}

#[test]
#[serial]
fn test_invalid_env_number_is_ignored() {
    clear_env();
    let file = write_config("cache_max_age_secs = 120\n");
    env::set_var(ENV_CACHE_MAX_AGE_SECS, "soon");

    let settings = Settings::resolve(&cli_with_config(file.path().to_path_buf())).unwrap();
    assert_eq!(settings.cache_max_age, Duration::from_secs(120));
    assert_eq!(settings.warnings.len(), 1);
    assert!(settings.warnings[0].contains(ENV_CACHE_MAX_AGE_SECS));

    clear_env();
}

#[test]
#[serial]
fn test_env_config_path_is_used() {
    clear_env();
    let file = write_config("bind_addr = \"127.0.0.1:7000\"\n");
    env::set_var(ENV_CONFIG, file.path());

    assert_eq!(locate_config_file(None).as_deref(), Some(file.path()));
    let settings = Settings::resolve(&CliOverrides::default()).unwrap();
    assert_eq!(settings.bind_addr, "127.0.0.1:7000");

    clear_env();
}

#[test]
#[serial]
fn test_defaults_fill_unset_fields() {
    clear_env();
    let file = write_config("");

    let settings = Settings::resolve(&cli_with_config(file.path().to_path_buf())).unwrap();
    let defaults = CompiledDefaults::default();

    assert_eq!(settings.feed_url, defaults.feed_url);
    assert_eq!(settings.bind_addr, defaults.bind_addr);
    assert_eq!(settings.refresh_interval, Some(Duration::from_secs(900)));
    assert!(settings.denylist.contains("MOD-00628"));
}

#[test]
fn test_malformed_config_is_an_error() {
    let file = write_config("cache_max_age_secs = \"fifteen\"\n");
    let result = load_toml_config(file.path());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_missing_explicit_config_falls_back_to_defaults() {
    clear_env();
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let missing = dir.path().join("absent.toml");

    let settings = Settings::resolve(&cli_with_config(missing.clone())).unwrap();
    let defaults = CompiledDefaults::default();

    assert!(settings.config_file.is_none());
    assert_eq!(settings.feed_url, defaults.feed_url);
    assert_eq!(settings.bind_addr, defaults.bind_addr);
    assert_eq!(settings.warnings.len(), 1);
    assert!(settings.warnings[0].contains(&missing.display().to_string()));
}

#[test]
#[serial]
fn test_missing_env_config_falls_back_to_defaults() {
    clear_env();
    let dir = tempfile::tempdir().expect("Should create temp dir");
    env::set_var(ENV_CONFIG, dir.path().join("absent.toml"));

    let settings = Settings::resolve(&CliOverrides::default()).unwrap();
    assert!(settings.config_file.is_none());
    assert_eq!(settings.warnings.len(), 1);

    clear_env();
}

#[test]
#[serial]
fn test_port_overrides_bind_port() {
    clear_env();
    let file = write_config("bind_addr = \"0.0.0.0:8080\"\n");
    env::set_var(ENV_BIND_ADDR, "127.0.0.1:9000");

    let cli = CliOverrides {
        config_path: Some(file.path().to_path_buf()),
        port: Some(9200),
        ..Default::default()
    };
    let settings = Settings::resolve(&cli).unwrap();
    assert_eq!(settings.bind_addr, "127.0.0.1:9200");

    clear_env();
}
