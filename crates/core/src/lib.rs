mod config;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

pub use config::{
    ConfigError, MAX_RESET_HOUR, Plan, REFRESH_PER_SECOND_RANGE, REFRESH_RATE_RANGE,
    SettingsParams, Theme, TimeFormat, UsageConfig, UsageConfigQuery, View,
};

/// Version of the serialized output schema.
pub const SCHEMA_VERSION: u32 = 1;

/// Identifier used for sessions the upstream did not describe.
pub const UNKNOWN_SESSION_ID: &str = "unknown";

/// Token counters for one session block. The total is always derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
}

impl TokenCounts {
    pub fn new(
        input_tokens: u64,
        output_tokens: u64,
        cache_creation_tokens: u64,
        cache_read_tokens: u64,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cache_creation_tokens,
            cache_read_tokens,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.cache_creation_tokens)
            .saturating_add(self.cache_read_tokens)
    }
}

impl Serialize for TokenCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TokenCounts", 5)?;
        state.serialize_field("input_tokens", &self.input_tokens)?;
        state.serialize_field("output_tokens", &self.output_tokens)?;
        state.serialize_field("cache_creation_tokens", &self.cache_creation_tokens)?;
        state.serialize_field("cache_read_tokens", &self.cache_read_tokens)?;
        state.serialize_field("total_tokens", &self.total_tokens())?;
        state.end()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BurnRate {
    pub tokens_per_minute: f64,
    pub cost_per_hour: f64,
}

/// Snapshot of one upstream usage window (typically five hours).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBlock {
    pub id: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub end_time: DateTime<Utc>,
    pub is_active: bool,
    pub token_counts: TokenCounts,
    pub cost_usd: f64,
    pub burn_rate: Option<BurnRate>,
    pub models: Vec<String>,
    pub sent_messages_count: u64,
    pub per_model_stats: Map<String, Value>,
}

impl SessionBlock {
    /// Schema-valid stand-in for a session the upstream did not (or could not) describe.
    pub fn placeholder(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            start_time: now,
            end_time: now,
            is_active: false,
            token_counts: TokenCounts::default(),
            cost_usd: 0.0,
            burn_rate: None,
            models: Vec::new(),
            sent_messages_count: 0,
            per_model_stats: Map::new(),
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.token_counts.total_tokens()
    }

    pub fn total_cost(&self) -> f64 {
        self.cost_usd
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsagePredictions {
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub tokens_run_out: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub limit_resets_at: Option<DateTime<Utc>>,
}

/// Percentages of the plan limits. Upstream values are passed through unclamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub cost_percentage: f64,
    pub token_percentage: f64,
    pub message_percentage: f64,
    pub time_to_reset_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub schema_version: u32,
    pub current_session: Option<SessionBlock>,
    pub recent_sessions: Vec<SessionBlock>,
    pub predictions: UsagePredictions,
    pub burn_rate: BurnRate,
    pub totals: UsageTotals,
}

impl UsageStats {
    /// The zero-valued result returned whenever the upstream cannot be read.
    pub fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            current_session: None,
            recent_sessions: Vec::new(),
            predictions: UsagePredictions::default(),
            burn_rate: BurnRate::default(),
            totals: UsageTotals::default(),
        }
    }
}

impl Default for UsageStats {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn token_total_is_sum_of_parts() {
        let counts = TokenCounts::new(10, 5, 3, 2);
        assert_eq!(counts.total_tokens(), 20);
        assert_eq!(TokenCounts::default().total_tokens(), 0);
    }

    #[test]
    fn token_counts_serialize_total() {
        let value = serde_json::to_value(TokenCounts::new(1, 2, 3, 4)).expect("serialize");
        assert_eq!(value["total_tokens"], 10);

        let back: TokenCounts = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, TokenCounts::new(1, 2, 3, 4));
    }

    #[test]
    fn session_timestamps_serialize_as_epoch_seconds() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let block = SessionBlock::placeholder(UNKNOWN_SESSION_ID, now);
        let value = serde_json::to_value(&block).expect("serialize");
        assert_eq!(value["start_time"], 1_704_110_400);
        assert_eq!(value["end_time"], 1_704_110_400);
        assert!(value["burn_rate"].is_null());
        assert_eq!(value["token_counts"]["total_tokens"], 0);
    }

    #[test]
    fn empty_stats_are_zero_valued() {
        let stats = UsageStats::empty();
        assert_eq!(stats.schema_version, SCHEMA_VERSION);
        assert!(stats.current_session.is_none());
        assert!(stats.recent_sessions.is_empty());
        assert_eq!(stats.burn_rate.tokens_per_minute, 0.0);
        assert_eq!(stats.totals, UsageTotals::default());
        assert!(stats.predictions.tokens_run_out.is_none());

        let value = serde_json::to_value(&stats).expect("serialize");
        assert!(value["predictions"]["limit_resets_at"].is_null());
    }
}
