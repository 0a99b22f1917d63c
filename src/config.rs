//! Configuration loading for makerscope
//!
//! Resolution priority per key: environment variable, then TOML config file,
//! then compiled default. Credentials (`api_id`, `affiliate_id`) have no
//! default and must come from one of the first two tiers.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const ENV_API_ID: &str = "MAKERSCOPE_API_ID";
const ENV_AFFILIATE_ID: &str = "MAKERSCOPE_AFFILIATE_ID";
const ENV_DATABASE_PATH: &str = "MAKERSCOPE_DATABASE_PATH";

const DEFAULT_SITE: &str = "FANZA";
const DEFAULT_SERVICE: &str = "doujin";
const DEFAULT_FLOOR: &str = "digital_doujin";

/// Raw TOML shape; every key optional so partial files load cleanly
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    api_id: Option<String>,
    affiliate_id: Option<String>,
    site: Option<String>,
    service: Option<String>,
    floor: Option<String>,
    database_path: Option<PathBuf>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_id: String,
    pub affiliate_id: String,
    pub site: String,
    pub service: String,
    pub floor: String,
    pub database_path: PathBuf,
}

impl Config {
    /// Load configuration, optionally from an explicit TOML path
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let toml_config = match config_path {
            Some(path) => read_toml(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => read_toml(&path)?,
                _ => TomlConfig::default(),
            },
        };

        let api_id = resolve_credential("api_id", ENV_API_ID, toml_config.api_id)?;
        let affiliate_id =
            resolve_credential("affiliate_id", ENV_AFFILIATE_ID, toml_config.affiliate_id)?;

        let database_path = std::env::var(ENV_DATABASE_PATH)
            .ok()
            .map(PathBuf::from)
            .or(toml_config.database_path)
            .unwrap_or_else(default_database_path);

        Ok(Self {
            api_id,
            affiliate_id,
            site: toml_config.site.unwrap_or_else(|| DEFAULT_SITE.to_string()),
            service: toml_config
                .service
                .unwrap_or_else(|| DEFAULT_SERVICE.to_string()),
            floor: toml_config
                .floor
                .unwrap_or_else(|| DEFAULT_FLOOR.to_string()),
            database_path,
        })
    }
}

fn read_toml(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read config failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config failed ({}): {}", path.display(), e)))
}

/// Resolve a required credential from ENV then TOML, warning when both are set
fn resolve_credential(key: &str, env_var: &str, toml_value: Option<String>) -> Result<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| !v.trim().is_empty());
    let toml_value = toml_value.filter(|v| !v.trim().is_empty());

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment and TOML; using environment (highest priority)",
            key
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", key);
        return Ok(value);
    }
    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", key);
        return Ok(value);
    }

    Err(Error::Config(format!(
        "{key} not configured. Set {env_var} or add `{key}` to the TOML config"
    )))
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("makerscope").join("config.toml"))
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("makerscope"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/makerscope"))
        .join("makerscope.db")
}
