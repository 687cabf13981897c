use monitor_upstream::Degradation;
use serde::Serialize;
use usage_core::UsageStats;

/// Usage statistics plus, when the upstream could not be read, the reason.
#[derive(Debug, Serialize)]
pub struct UsageStatsResponse {
    #[serde(flatten)]
    pub stats: UsageStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degradation: Option<Degradation>,
}

#[derive(Serialize)]
pub struct BridgeSettingsResponse {
    pub debug: bool,
    pub log_level: String,
    pub python: String,
    pub monitor_path: Option<String>,
    pub monitor_root: Option<String>,
    pub app_data_dir: String,
    pub usage_config_path: String,
}
