#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use bridge_app::{AppState, BridgeConfig};
use monitor_reader::{AttrResult, Attributes};
use monitor_upstream::{
    DataSource, Degradation, ImportError, ModuleImporter, MonitorBackend, Orchestrator,
    RootSearch, SettingsHandle, SourceBinding, Stage,
};
use serde_json::{Map, Value, json};
use tempfile::TempDir;
use usage_core::SettingsParams;

/// Importer that reports every module with the classes the bridge needs.
pub struct FullImporter;

impl ModuleImporter for FullImporter {
    fn import(&self, _root: &Path, module: &str) -> Result<Value, ImportError> {
        let symbols = match module {
            "claude_monitor.core.settings" => json!({"Settings": "class"}),
            "claude_monitor.core.models" => json!({
                "SessionBlock": "class",
                "TokenCounts": "class",
                "BurnRate": "class",
                "UsageEntry": "class",
                "normalize_model_name": "function"
            }),
            "claude_monitor.monitoring.data_manager" => json!({"DataManager": "class"}),
            "claude_monitor.monitoring.orchestrator" => json!({"MonitoringOrchestrator": "class"}),
            _ => json!({}),
        };
        Ok(json!({
            "__file__": format!("/monitor/src/{}.py", module.replace('.', "/")),
            "__version__": "3.1.0",
            "symbols": symbols
        }))
    }
}

pub fn bound(dir: &Path) -> Arc<SourceBinding> {
    let root = dir.join("Claude-Code-Usage-Monitor");
    fs::create_dir_all(root.join("src").join("claude_monitor")).expect("create root");
    Arc::new(SourceBinding::bind(&RootSearch::new(vec![root]), &FullImporter))
}

#[derive(Clone, Default)]
pub struct FakeSettings {
    pub params: SettingsParams,
    pub fields: Map<String, Value>,
    pub model_dump: Option<Map<String, Value>>,
    pub dict: Option<Map<String, Value>>,
}

impl Attributes for FakeSettings {
    fn attr(&self, name: &str) -> AttrResult {
        Ok(self.fields.get(name).cloned())
    }
}

impl SettingsHandle for FakeSettings {
    fn params(&self) -> &SettingsParams {
        &self.params
    }

    fn model_dump(&self) -> Option<Map<String, Value>> {
        self.model_dump.clone()
    }

    fn dict(&self) -> Option<Map<String, Value>> {
        self.dict.clone()
    }
}

/// Serves canned upstream data; `fail_at` makes one stage of the chain fail.
#[derive(Clone, Default)]
pub struct FakeBackend {
    pub current: Value,
    pub history: Vec<Value>,
    pub fail_at: Option<Stage>,
    pub fail_update: bool,
    pub model_dump: Option<Map<String, Value>>,
    pub dict: Option<Map<String, Value>>,
}

impl FakeBackend {
    pub fn with_current(current: Value) -> Self {
        Self {
            current,
            ..Self::default()
        }
    }

    fn check(&self, stage: Stage) -> Result<(), Degradation> {
        if self.fail_at == Some(stage) {
            return Err(Degradation::Construction {
                stage,
                message: format!("{stage} exploded"),
            });
        }
        Ok(())
    }
}

struct FakeSource {
    history: Vec<Value>,
}

impl DataSource for FakeSource {
    fn recent_sessions(&self, _hours_back: u32) -> Result<Vec<Value>, Degradation> {
        Ok(self.history.clone())
    }
}

struct FakeOrchestrator {
    current: Value,
    fail_update: bool,
    updated: bool,
}

impl Orchestrator for FakeOrchestrator {
    fn update(&mut self) -> Result<(), Degradation> {
        if self.fail_update {
            return Err(Degradation::upstream("update failed"));
        }
        self.updated = true;
        Ok(())
    }

    fn current_data(&self) -> Result<Value, Degradation> {
        if !self.updated {
            return Err(Degradation::upstream("not updated"));
        }
        Ok(self.current.clone())
    }
}

impl MonitorBackend for FakeBackend {
    fn create_settings(
        &self,
        params: &SettingsParams,
    ) -> Result<Box<dyn SettingsHandle>, Degradation> {
        self.check(Stage::Settings)?;
        let fields = match serde_json::to_value(params) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Ok(Box::new(FakeSettings {
            params: params.clone(),
            fields,
            model_dump: self.model_dump.clone(),
            dict: self.dict.clone(),
        }))
    }

    fn create_data_source(
        &self,
        _settings: &dyn SettingsHandle,
    ) -> Result<Box<dyn DataSource>, Degradation> {
        self.check(Stage::DataSource)?;
        Ok(Box::new(FakeSource {
            history: self.history.clone(),
        }))
    }

    fn create_orchestrator(
        &self,
        _source: Box<dyn DataSource>,
        _settings: &dyn SettingsHandle,
    ) -> Result<Box<dyn Orchestrator>, Degradation> {
        self.check(Stage::Orchestrator)?;
        Ok(Box::new(FakeOrchestrator {
            current: self.current.clone(),
            fail_update: self.fail_update,
            updated: false,
        }))
    }
}

pub fn bridge_config(dir: &Path) -> BridgeConfig {
    BridgeConfig {
        config_storage_path: dir.join("storage"),
        ..BridgeConfig::default()
    }
}

pub fn app_with(backend: FakeBackend) -> (TempDir, AppState) {
    let dir = tempfile::tempdir().expect("temp dir");
    let binding = bound(dir.path());
    let state = AppState::new(bridge_config(dir.path()), binding, Arc::new(backend));
    (dir, state)
}

pub fn unavailable_app() -> (TempDir, AppState) {
    let dir = tempfile::tempdir().expect("temp dir");
    let binding = Arc::new(SourceBinding::unavailable("not installed"));
    let state = AppState::new(
        bridge_config(dir.path()),
        binding,
        Arc::new(FakeBackend::default()),
    );
    (dir, state)
}

pub fn sample_current_data() -> Value {
    json!({
        "current_session": {
            "id": "block-7",
            "start_time": "2024-01-01T10:00:00Z",
            "end_time": "2024-01-01T15:00:00Z",
            "is_active": true,
            "token_counts": {
                "input_tokens": 1200,
                "output_tokens": 300,
                "cache_creation_tokens": 50,
                "cache_read_tokens": 450
            },
            "cost_usd": 1.25,
            "burn_rate": {"tokens_per_minute": 42.5, "cost_per_hour": 0.9},
            "models": ["claude-sonnet-4", "claude-opus-4"],
            "sent_messages_count": 12,
            "per_model_stats": {"claude-sonnet-4": {"input_tokens": 1000}}
        },
        "recent_sessions": [
            {"id": "block-6", "start_time": 1704088800, "end_time": 1704106800,
             "token_counts": {"input_tokens": 10, "output_tokens": 5}},
            {"id": "block-5", "cost_usd": "not a number"}
        ],
        "burn_rate": {"tokens_per_minute": 42.5, "cost_per_hour": 0.9},
        "predictions": {"tokens_run_out": "2024-01-01T14:30:00Z", "limit_resets_at": null},
        "totals": {
            "cost_percentage": 12.5,
            "token_percentage": 104.0,
            "message_percentage": 30.0,
            "time_to_reset_percentage": 55.5
        }
    })
}
