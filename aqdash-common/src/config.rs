//! Configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`AQDASH_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error; a malformed one is. Resolution
//! runs before logging is set up, so problems found along the way are
//! collected in [`Settings::warnings`] for the caller to log.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{Denylist, DEFAULT_DENYLIST};
use crate::{Error, Result};

pub const DEFAULT_FEED_URL: &str =
    "https://raw.githubusercontent.com/iREACH-UBC/CCAS_Dashboard/main/pollutant_data.json";

pub const ENV_CONFIG: &str = "AQDASH_CONFIG";
pub const ENV_FEED_URL: &str = "AQDASH_FEED_URL";
pub const ENV_BIND_ADDR: &str = "AQDASH_BIND_ADDR";
pub const ENV_CACHE_MAX_AGE_SECS: &str = "AQDASH_CACHE_MAX_AGE_SECS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "AQDASH_FETCH_TIMEOUT_SECS";
pub const ENV_REFRESH_INTERVAL_SECS: &str = "AQDASH_REFRESH_INTERVAL_SECS";
pub const ENV_DENYLIST: &str = "AQDASH_DENYLIST";
pub const ENV_LOG_LEVEL: &str = "AQDASH_LOG_LEVEL";

/// Values used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub feed_url: String,
    pub denylist: Vec<String>,
    pub cache_max_age_secs: u64,
    pub fetch_timeout_secs: u64,
    pub refresh_interval_secs: u64,
    pub bind_addr: String,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            cache_max_age_secs: 900,
            fetch_timeout_secs: 30,
            refresh_interval_secs: 900,
            bind_addr: "127.0.0.1:5780".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// On-disk TOML configuration; every field is optional
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    pub feed_url: Option<String>,
    pub denylist: Option<Vec<String>>,
    pub cache_max_age_secs: Option<u64>,
    pub fetch_timeout_secs: Option<u64>,
    pub refresh_interval_secs: Option<u64>,
    pub bind_addr: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub feed_url: Option<String>,
    pub bind_addr: Option<String>,
    /// Replaces the port of whichever bind address wins
    pub port: Option<u16>,
    pub cache_max_age_secs: Option<u64>,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub feed_url: String,
    pub denylist: Denylist,
    pub cache_max_age: Duration,
    pub fetch_timeout: Duration,
    /// `None` disables the scheduled refresh
    pub refresh_interval: Option<Duration>,
    pub bind_addr: String,
    pub log_level: String,
    /// Config file that was loaded, if any
    pub config_file: Option<PathBuf>,
    /// Problems that fell back to a lower-priority source
    pub warnings: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_sources(
            &CliOverrides::default(),
            &TomlConfig::default(),
            None,
            Vec::new(),
        )
    }
}

impl Settings {
    /// Resolve settings from CLI, environment, config file and defaults
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let mut warnings = Vec::new();

        let config_file = match locate_config_file(cli.config_path.as_deref()) {
            Some(path) if !path.exists() => {
                warnings.push(format!(
                    "Config file {} not found; using defaults",
                    path.display()
                ));
                None
            }
            other => other,
        };
        let toml_config = match &config_file {
            Some(path) => load_toml_config(path)?,
            None => TomlConfig::default(),
        };

        Ok(Self::from_sources(cli, &toml_config, config_file, warnings))
    }

    fn from_sources(
        cli: &CliOverrides,
        toml: &TomlConfig,
        config_file: Option<PathBuf>,
        mut warnings: Vec<String>,
    ) -> Self {
        let defaults = CompiledDefaults::default();

        let feed_url = cli
            .feed_url
            .clone()
            .or_else(|| env_string(ENV_FEED_URL))
            .or_else(|| toml.feed_url.clone())
            .unwrap_or(defaults.feed_url);

        let bind_addr = cli
            .bind_addr
            .clone()
            .or_else(|| env_string(ENV_BIND_ADDR))
            .or_else(|| toml.bind_addr.clone())
            .unwrap_or(defaults.bind_addr);
        let bind_addr = match cli.port {
            Some(port) => with_port(&bind_addr, port),
            None => bind_addr,
        };

        let cache_max_age_secs = cli
            .cache_max_age_secs
            .or_else(|| env_u64(ENV_CACHE_MAX_AGE_SECS, &mut warnings))
            .or(toml.cache_max_age_secs)
            .unwrap_or(defaults.cache_max_age_secs);

        let fetch_timeout_secs = env_u64(ENV_FETCH_TIMEOUT_SECS, &mut warnings)
            .or(toml.fetch_timeout_secs)
            .unwrap_or(defaults.fetch_timeout_secs);

        let refresh_interval_secs = env_u64(ENV_REFRESH_INTERVAL_SECS, &mut warnings)
            .or(toml.refresh_interval_secs)
            .unwrap_or(defaults.refresh_interval_secs);

        let denylist = env_string(ENV_DENYLIST)
            .map(|raw| parse_id_list(&raw))
            .or_else(|| toml.denylist.clone())
            .unwrap_or(defaults.denylist);

        let log_level = env_string(ENV_LOG_LEVEL)
            .or_else(|| toml.logging.level.clone())
            .unwrap_or(defaults.log_level);

        Self {
            feed_url,
            denylist: Denylist::new(denylist),
            cache_max_age: Duration::from_secs(cache_max_age_secs),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            refresh_interval: (refresh_interval_secs > 0)
                .then(|| Duration::from_secs(refresh_interval_secs)),
            bind_addr,
            log_level,
            config_file,
            warnings,
        }
    }
}

/// Find the config file: explicit path, then `AQDASH_CONFIG`, then the
/// user config directory, then `/etc/aqdash/config.toml` on Linux
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_string(ENV_CONFIG) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("aqdash").join("config.toml"));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/aqdash/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(name: &str, warnings: &mut Vec<String>) -> Option<u64> {
    let raw = env_string(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warnings.push(format!("Ignoring {}={:?}: not a whole number", name, raw));
            None
        }
    }
}

/// Swap the port of a `host:port` address, keeping the host
fn with_port(addr: &str, port: u16) -> String {
    let host = match addr.rsplit_once(':') {
        Some((host, tail)) if tail.parse::<u16>().is_ok() => host,
        _ => addr,
    };
    format!("{}:{}", host, port)
}

fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
