use chrono::{DateTime, Utc};
use monitor_reader::{
    convert_burn_rate, convert_predictions, convert_session_at, convert_totals, extract,
    resolve_single,
};
use monitor_upstream::{Degradation, Outcome, SettingsHandle, SymbolKind};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use usage_core::{SessionBlock, SettingsParams, UsageConfig, UsageStats};

use crate::services::SharedMonitor;

const STATS_SYMBOLS: &[&str] = &["Settings", "DataManager", "MonitoringOrchestrator"];
const HISTORY_SYMBOLS: &[&str] = &["Settings", "DataManager"];

/// Fields re-read from a settings object that offers no serializer.
const SETTINGS_FALLBACK_FIELDS: &[(&str, &str)] = &[
    ("plan", "plan"),
    ("view", "view"),
    ("timezone", "timezone"),
    ("theme", "theme"),
    ("refresh_rate", "refresh_rate"),
    ("custom_limit_tokens", "custom_limit_tokens"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConfigValidation {
    fn accepted(settings: Map<String, Value>) -> Self {
        Self {
            valid: true,
            settings: Some(settings),
            error: None,
        }
    }

    fn rejected(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            settings: None,
            error: Some(error.into()),
        }
    }
}

/// Statistics assembler. Every operation returns a usable value; failures
/// only show up as the recorded degradation.
#[derive(Clone)]
pub struct StatsService {
    monitor: SharedMonitor,
}

impl StatsService {
    pub(super) fn new(monitor: SharedMonitor) -> Self {
        Self { monitor }
    }

    pub fn get_statistics(&self, config: Option<&UsageConfig>) -> Outcome<UsageStats> {
        if !self.monitor.binding.is_available() {
            warn!("upstream monitor not available, returning empty statistics");
            return Outcome::degraded(UsageStats::empty(), Degradation::Unavailable);
        }
        match self.assemble(config, Utc::now()) {
            Ok(stats) => Outcome::live(stats),
            Err(reason) => {
                warn!(error = %reason, "failed to assemble usage statistics");
                Outcome::degraded(UsageStats::empty(), reason)
            }
        }
    }

    pub fn get_session_history(&self, hours_back: u32) -> Outcome<Vec<SessionBlock>> {
        if !self.monitor.binding.is_available() {
            warn!("upstream monitor not available, returning empty history");
            return Outcome::degraded(Vec::new(), Degradation::Unavailable);
        }
        match self.history(hours_back, Utc::now()) {
            Ok(sessions) => Outcome::live(sessions),
            Err(reason) => {
                warn!(hours_back, error = %reason, "failed to read session history");
                Outcome::degraded(Vec::new(), reason)
            }
        }
    }

    pub fn validate_configuration(&self, config: &UsageConfig) -> ConfigValidation {
        if let Err(err) = config.validate() {
            debug!(error = %err, "usage config rejected locally");
            return ConfigValidation::rejected(err.to_string());
        }
        if !self.monitor.binding.is_available() {
            return ConfigValidation::rejected(Degradation::Unavailable.to_string());
        }
        let params = SettingsParams::from_config(Some(config));
        let settings = self
            .require(&["Settings"])
            .and_then(|()| self.monitor.backend.create_settings(&params));
        match settings {
            Ok(settings) => ConfigValidation::accepted(settings_view(settings.as_ref())),
            Err(reason) => {
                info!(error = %reason, "upstream rejected usage config");
                ConfigValidation::rejected(reason.to_string())
            }
        }
    }

    fn require(&self, names: &[&str]) -> Result<(), Degradation> {
        for name in names {
            if self
                .monitor
                .binding
                .get_symbol(SymbolKind::Class, name)
                .is_none()
            {
                return Err(Degradation::MissingSymbol {
                    name: (*name).to_string(),
                });
            }
        }
        Ok(())
    }

    fn assemble(
        &self,
        config: Option<&UsageConfig>,
        now: DateTime<Utc>,
    ) -> Result<UsageStats, Degradation> {
        self.require(STATS_SYMBOLS)?;
        let backend = &self.monitor.backend;
        let params = SettingsParams::from_config(config);
        let settings = backend.create_settings(&params)?;
        let source = backend.create_data_source(settings.as_ref())?;
        let mut orchestrator = backend.create_orchestrator(source, settings.as_ref())?;
        orchestrator.update()?;
        let data = orchestrator.current_data()?;

        let current_session = match resolve_single(Some(&data), "current_session", Value::Null) {
            Value::Null => None,
            raw => Some(convert_session_at(Some(&raw), now)),
        };
        let recent_sessions = convert_sessions(
            resolve_single(Some(&data), "recent_sessions", Value::Null),
            now,
        );
        let predictions = resolve_single(Some(&data), "predictions", Value::Null);
        let totals = resolve_single(Some(&data), "totals", Value::Null);

        let stats = UsageStats {
            current_session,
            recent_sessions,
            predictions: convert_predictions(Some(&predictions)),
            burn_rate: convert_burn_rate(Some(&data)).unwrap_or_default(),
            totals: convert_totals(Some(&totals)),
            ..UsageStats::empty()
        };
        debug!(
            recent_sessions = stats.recent_sessions.len(),
            has_current = stats.current_session.is_some(),
            "assembled usage statistics"
        );
        Ok(stats)
    }

    fn history(&self, hours_back: u32, now: DateTime<Utc>) -> Result<Vec<SessionBlock>, Degradation> {
        self.require(HISTORY_SYMBOLS)?;
        let backend = &self.monitor.backend;
        let settings = backend.create_settings(&SettingsParams::default())?;
        let source = backend.create_data_source(settings.as_ref())?;
        let sessions = source.recent_sessions(hours_back)?;
        Ok(sessions
            .iter()
            .map(|raw| convert_session_at(Some(raw), now))
            .collect())
    }
}

fn convert_sessions(raw: Value, now: DateTime<Utc>) -> Vec<SessionBlock> {
    match raw {
        Value::Array(items) => items
            .iter()
            .map(|item| convert_session_at(Some(item), now))
            .collect(),
        Value::Null => Vec::new(),
        other => {
            debug!(found = %other, "recent_sessions is not a list");
            Vec::new()
        }
    }
}

/// First serializer the settings object supports, else the known fields.
fn settings_view(settings: &dyn SettingsHandle) -> Map<String, Value> {
    if let Some(view) = settings.model_dump() {
        return view;
    }
    if let Some(view) = settings.dict() {
        return view;
    }
    extract(settings, SETTINGS_FALLBACK_FIELDS)
        .into_map()
        .into_iter()
        .map(|(field, value)| (field.to_string(), value))
        .collect()
}
