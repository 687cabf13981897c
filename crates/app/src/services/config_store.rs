use std::fs;

use chrono::{SubsecRound, Utc};
use tracing::{debug, info};
use usage_core::{UsageConfig, UsageConfigQuery};

use crate::error::{AppError, Result};
use crate::services::SharedConfig;

/// Persists the user's `UsageConfig` as JSON under the storage dir.
#[derive(Clone)]
pub struct ConfigService {
    config: SharedConfig,
}

impl ConfigService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    /// Stored config, or the defaults when nothing has been saved yet.
    pub fn get(&self) -> Result<UsageConfig> {
        let path = &self.config.paths.usage_config_path;
        if !path.exists() {
            debug!(path = %path.display(), "no stored usage config, using defaults");
            return Ok(UsageConfig::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|err| AppError::Message(format!("read {}: {}", path.display(), err)))?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn put(&self, mut config: UsageConfig) -> Result<UsageConfig> {
        config.validate()?;
        let previous = self.get()?;
        // Stored as whole seconds; stamp the same precision we read back.
        let now = Utc::now().trunc_subsecs(0);
        config.created_at = config.created_at.or(previous.created_at).or(Some(now));
        config.updated_at = Some(now);

        let paths = &self.config.paths;
        fs::create_dir_all(&paths.app_data_dir)?;
        let contents = serde_json::to_string_pretty(&config)?;
        fs::write(&paths.usage_config_path, contents).map_err(|err| {
            AppError::Message(format!(
                "write {}: {}",
                paths.usage_config_path.display(),
                err
            ))
        })?;
        info!(
            plan = config.plan.as_str(),
            view = config.view.as_str(),
            timezone = %config.timezone,
            "usage config updated"
        );
        Ok(config)
    }

    /// Stored config with one request's overrides applied.
    pub fn effective(&self, query: &UsageConfigQuery) -> Result<UsageConfig> {
        let stored = self.get()?;
        if query.is_empty() {
            return Ok(stored);
        }
        let merged = query.apply_to(&stored);
        merged.validate()?;
        Ok(merged)
    }
}
