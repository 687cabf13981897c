//! Service-level settings: defaults, then an optional TOML file, then
//! `BRIDGE_*` environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use monitor_upstream::{RootSearch, expand_home_path};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::startup::AppPaths;

const CONFIG_DIR_NAME: &str = "claude-monitor-bridge";
const CONFIG_FILE_NAME: &str = "config.toml";
const STORAGE_DIR_NAME: &str = ".claude-monitor-bridge";
const DEFAULT_PYTHON: &str = "python3";
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub const ENV_DEBUG: &str = "BRIDGE_DEBUG";
pub const ENV_LOG_LEVEL: &str = "BRIDGE_LOG_LEVEL";
pub const ENV_MONITOR_PATH: &str = "BRIDGE_MONITOR_PATH";
pub const ENV_PYTHON: &str = "BRIDGE_PYTHON";
pub const ENV_CONFIG_STORAGE_PATH: &str = "BRIDGE_CONFIG_STORAGE_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub debug: bool,
    pub log_level: String,
    /// Upstream checkout; searched for when unset.
    pub monitor_path: Option<PathBuf>,
    pub python: PathBuf,
    pub config_storage_path: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            monitor_path: None,
            python: PathBuf::from(DEFAULT_PYTHON),
            config_storage_path: default_storage_dir(),
        }
    }
}

impl BridgeConfig {
    /// Loads from `file` (if it exists) and the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with(file, |key| std::env::var(key).ok())
    }

    pub fn load_with<F>(file: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match file {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path).map_err(|err| {
                    AppError::Message(format!("read config {}: {}", path.display(), err))
                })?;
                Self::from_toml_str(&contents)?
            }
            _ => Self::default(),
        };
        config.apply_env(lookup)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(contents)?;
        if let Some(path) = config.monitor_path.take() {
            config.monitor_path = Some(expand_home_path(&path.to_string_lossy()));
        }
        config.config_storage_path =
            expand_home_path(&config.config_storage_path.to_string_lossy());
        Ok(config)
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(value) = lookup(ENV_DEBUG) {
            self.debug = parse_bool(ENV_DEBUG, &value)?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value.trim().to_string();
        }
        if let Some(value) = lookup(ENV_MONITOR_PATH) {
            self.monitor_path = Some(expand_home_path(value.trim()));
        }
        if let Some(value) = lookup(ENV_PYTHON) {
            self.python = PathBuf::from(value.trim());
        }
        if let Some(value) = lookup(ENV_CONFIG_STORAGE_PATH) {
            self.config_storage_path = expand_home_path(value.trim());
        }
        Ok(())
    }

    fn check(&self) -> Result<()> {
        let level = self.log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(AppError::InvalidInput(format!(
                "log_level must be one of {}, got {}",
                LOG_LEVELS.join(", "),
                self.log_level
            )));
        }
        if self.python.as_os_str().is_empty() {
            return Err(AppError::InvalidInput("python must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn app_paths(&self) -> AppPaths {
        AppPaths::new(self.config_storage_path.clone())
    }

    pub fn root_search(&self) -> RootSearch {
        RootSearch::standard(self.monitor_path.as_deref())
    }
}

/// `<config dir>/claude-monitor-bridge/config.toml`, when a config dir exists.
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn default_storage_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STORAGE_DIR_NAME)
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::InvalidInput(format!(
            "{key} must be a boolean, got {other}"
        ))),
    }
}
