use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Pro,
    Max5,
    Max20,
    #[default]
    Custom,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pro => "pro",
            Self::Max5 => "max5",
            Self::Max20 => "max20",
            Self::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Realtime,
    Daily,
    Monthly,
    Session,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realtime => "realtime",
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Session => "session",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "24h")]
    H24,
    #[default]
    #[serde(rename = "auto")]
    Auto,
}

impl TimeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::H12 => "12h",
            Self::H24 => "24h",
            Self::Auto => "auto",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    Classic,
    #[default]
    Auto,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Classic => "classic",
            Self::Auto => "auto",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: String,
        max: String,
        value: String,
    },
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

pub const REFRESH_RATE_RANGE: (u32, u32) = (1, 60);
pub const REFRESH_PER_SECOND_RANGE: (f64, f64) = (0.1, 20.0);
pub const MAX_RESET_HOUR: u8 = 23;

/// User-facing monitoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    pub id: Option<i64>,
    pub plan: Plan,
    pub custom_limit_tokens: Option<u64>,
    pub view: View,
    pub timezone: String,
    pub time_format: TimeFormat,
    pub theme: Theme,
    pub refresh_rate: u32,
    pub refresh_per_second: f64,
    pub reset_hour: Option<u8>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            id: None,
            plan: Plan::default(),
            custom_limit_tokens: None,
            view: View::default(),
            timezone: "auto".to_string(),
            time_format: TimeFormat::default(),
            theme: Theme::default(),
            refresh_rate: 10,
            refresh_per_second: 0.75,
            reset_hour: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl UsageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min_rate, max_rate) = REFRESH_RATE_RANGE;
        if !(min_rate..=max_rate).contains(&self.refresh_rate) {
            return Err(ConfigError::OutOfRange {
                field: "refresh_rate",
                min: min_rate.to_string(),
                max: max_rate.to_string(),
                value: self.refresh_rate.to_string(),
            });
        }
        let (min_rps, max_rps) = REFRESH_PER_SECOND_RANGE;
        if !(min_rps..=max_rps).contains(&self.refresh_per_second) {
            return Err(ConfigError::OutOfRange {
                field: "refresh_per_second",
                min: min_rps.to_string(),
                max: max_rps.to_string(),
                value: self.refresh_per_second.to_string(),
            });
        }
        if let Some(hour) = self.reset_hour
            && hour > MAX_RESET_HOUR
        {
            return Err(ConfigError::OutOfRange {
                field: "reset_hour",
                min: "0".to_string(),
                max: MAX_RESET_HOUR.to_string(),
                value: hour.to_string(),
            });
        }
        if self.custom_limit_tokens == Some(0) {
            return Err(ConfigError::NotPositive {
                field: "custom_limit_tokens",
            });
        }
        if self.timezone.trim().is_empty() {
            return Err(ConfigError::Empty { field: "timezone" });
        }
        Ok(())
    }
}

/// Per-request overrides layered on top of the stored config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageConfigQuery {
    pub plan: Option<Plan>,
    pub custom_limit_tokens: Option<u64>,
    pub timezone: Option<String>,
    pub reset_hour: Option<u8>,
    pub view: Option<View>,
}

impl UsageConfigQuery {
    pub fn is_empty(&self) -> bool {
        self.plan.is_none()
            && self.custom_limit_tokens.is_none()
            && self.timezone.is_none()
            && self.reset_hour.is_none()
            && self.view.is_none()
    }

    pub fn apply_to(&self, base: &UsageConfig) -> UsageConfig {
        let mut merged = base.clone();
        if let Some(plan) = self.plan {
            merged.plan = plan;
        }
        if let Some(limit) = self.custom_limit_tokens {
            merged.custom_limit_tokens = Some(limit);
        }
        if let Some(timezone) = self.timezone.as_deref().filter(|value| !value.is_empty()) {
            merged.timezone = timezone.to_string();
        }
        if let Some(hour) = self.reset_hour {
            merged.reset_hour = Some(hour);
        }
        if let Some(view) = self.view {
            merged.view = view;
        }
        merged
    }
}

/// Keyword arguments handed to the upstream settings constructor.
/// Only fields the caller actually set are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<View>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<TimeFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_per_second: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_hour: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_limit_tokens: Option<u64>,
}

impl SettingsParams {
    pub fn from_config(config: Option<&UsageConfig>) -> Self {
        let Some(config) = config else {
            return Self::default();
        };
        Self {
            plan: Some(config.plan),
            view: Some(config.view),
            timezone: Some(config.timezone.clone()),
            time_format: Some(config.time_format),
            theme: Some(config.theme),
            refresh_rate: Some(config.refresh_rate),
            refresh_per_second: Some(config.refresh_per_second),
            reset_hour: config.reset_hour,
            custom_limit_tokens: config.custom_limit_tokens.filter(|limit| *limit > 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(UsageConfig::default().validate(), Ok(()));
    }

    #[test]
    fn reset_hour_out_of_range_is_rejected() {
        let config = UsageConfig {
            reset_hour: Some(25),
            ..UsageConfig::default()
        };
        let err = config.validate().expect_err("invalid");
        assert!(err.to_string().contains("reset_hour"));
    }

    #[test]
    fn refresh_bounds_are_checked() {
        let config = UsageConfig {
            refresh_rate: 0,
            ..UsageConfig::default()
        };
        assert!(config.validate().is_err());

        let config = UsageConfig {
            refresh_per_second: f64::NAN,
            ..UsageConfig::default()
        };
        assert!(config.validate().is_err());

        let config = UsageConfig {
            custom_limit_tokens: Some(0),
            ..UsageConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "custom_limit_tokens"
            })
        );
    }

    #[test]
    fn enums_use_wire_names() {
        let value = serde_json::to_value(UsageConfig {
            plan: Plan::Max20,
            time_format: TimeFormat::H24,
            ..UsageConfig::default()
        })
        .expect("serialize");
        assert_eq!(value["plan"], "max20");
        assert_eq!(value["time_format"], "24h");
        assert_eq!(value["view"], "realtime");

        let parsed: UsageConfig =
            serde_json::from_str(r#"{"plan":"pro","theme":"dark"}"#).expect("parse");
        assert_eq!(parsed.plan, Plan::Pro);
        assert_eq!(parsed.theme, Theme::Dark);
        assert_eq!(parsed.refresh_rate, 10);
    }

    #[test]
    fn settings_params_only_carry_set_fields() {
        let empty = SettingsParams::from_config(None);
        assert!(empty.is_empty());
        assert_eq!(serde_json::to_value(&empty).expect("serialize"), serde_json::json!({}));

        let params = SettingsParams::from_config(Some(&UsageConfig::default()));
        let value = serde_json::to_value(&params).expect("serialize");
        assert_eq!(value["plan"], "custom");
        assert!(value.get("reset_hour").is_none());
        assert!(value.get("custom_limit_tokens").is_none());
    }

    #[test]
    fn query_overrides_merge_onto_base() {
        let base = UsageConfig::default();
        let query = UsageConfigQuery {
            plan: Some(Plan::Pro),
            reset_hour: Some(4),
            ..UsageConfigQuery::default()
        };
        assert!(!query.is_empty());
        let merged = query.apply_to(&base);
        assert_eq!(merged.plan, Plan::Pro);
        assert_eq!(merged.reset_hour, Some(4));
        assert_eq!(merged.view, base.view);
        assert!(UsageConfigQuery::default().is_empty());
    }
}
