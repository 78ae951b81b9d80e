//! Configuration resolution for buildgate.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/buildgate/settings.json)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables
//! 5. CLI arguments (applied by the binary, highest priority)

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Complete buildgate configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Feature name -> rollout.
    #[serde(default)]
    pub features: HashMap<String, FeatureRollout>,
}

/// HTTP server and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub database_path: Option<PathBuf>,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_path: None,
            log_level: "info".to_string(),
        }
    }
}

/// Queue hand-off settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Prefix of the worker class names written to queue messages.
    pub worker_namespace: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_namespace: "Travis::Sidekiq".to_string(),
        }
    }
}

/// Token verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Lifetime of tokens issued by the `token` subcommand.
    pub access_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: 3600,
        }
    }
}

/// Which repository owners a feature is active for.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FeatureRollout {
    /// Active for every owner.
    pub everyone: bool,
    /// Owner ids the feature is active for.
    pub owners: Vec<i64>,
}

impl FeatureRollout {
    pub fn is_active_for(&self, owner_id: i64) -> bool {
        self.everyone || self.owners.contains(&owner_id)
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_config_path()
        && global_path.exists()
    {
        let global = load_config_file(&global_path)?;
        merge_config(&mut config, global);
    }

    if let Some(path) = explicit {
        let file = load_config_file(path)?;
        merge_config(&mut config, file);
    }

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("settings.json"))
}

/// Default database location when none is configured.
pub fn database_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("buildgate.db"))
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .map(|p| p.join("buildgate"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn merge_config(base: &mut Config, overlay: Config) {
    if overlay.server.database_path.is_some() {
        base.server.database_path = overlay.server.database_path;
    }
    base.server.addr = overlay.server.addr;
    base.server.log_level = overlay.server.log_level;

    base.dispatch = overlay.dispatch;
    base.auth = overlay.auth;

    base.features.extend(overlay.features);
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(val) = std::env::var("BUILDGATE_ADDR")
        && let Ok(addr) = val.parse()
    {
        config.server.addr = addr;
    }
    if let Ok(val) = std::env::var("BUILDGATE_DB_PATH") {
        config.server.database_path = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("BUILDGATE_LOG_LEVEL") {
        config.server.log_level = val;
    }
    if let Ok(val) = std::env::var("BUILDGATE_WORKER_NAMESPACE") {
        config.dispatch.worker_namespace = val;
    }
}
