//! Upstream integration that runs every call in a short-lived interpreter.
//!
//! The upstream package parses argv and reads environment flags at import
//! time, so nothing here touches this process's own state: each call spawns
//! `python -c <probe> <command> <src>` with a fixed argv, writes a JSON
//! payload to stdin and reads one JSON envelope back from stdout.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use monitor_reader::{AttrResult, Attributes};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};
use usage_core::SettingsParams;

use crate::backend::{
    DataSource, ModuleImporter, MonitorBackend, Orchestrator, SettingsHandle,
};
use crate::discovery::source_dir;
use crate::error::{Degradation, ImportError, Stage};

const PROBE_SCRIPT: &str = include_str!("../assets/monitor_probe.py");
const DISABLE_CLI_ENV: &str = "CLAUDE_MONITOR_DISABLE_CLI";

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProcessBackend {
    python: PathBuf,
    root: Option<PathBuf>,
}

impl ProcessBackend {
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            root: None,
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn python(&self) -> &Path {
        &self.python
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn run(&self, command: &str, payload: &Value) -> Result<Value, Degradation> {
        let Some(root) = self.root.as_deref() else {
            return Err(Degradation::Unavailable);
        };
        run_probe(&self.python, root, command, payload)
    }
}

fn run_probe(
    python: &Path,
    root: &Path,
    command: &str,
    payload: &Value,
) -> Result<Value, Degradation> {
    let body = serde_json::to_vec(payload)
        .map_err(|err| Degradation::protocol(format!("failed to encode payload: {err}")))?;
    debug!(command, root = %root.display(), "running upstream probe");
    let mut child = Command::new(python)
        .arg("-c")
        .arg(PROBE_SCRIPT)
        .arg(command)
        .arg(source_dir(root))
        .env(DISABLE_CLI_ENV, "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| {
            Degradation::upstream(format!("failed to spawn {}: {err}", python.display()))
        })?;

    if let Some(mut stdin) = child.stdin.take()
        && let Err(err) = stdin.write_all(&body)
    {
        drop(stdin);
        // The child must be reaped even when it stopped reading early.
        let _ = child.kill();
        if let Err(wait_err) = child.wait() {
            warn!(command, error = %wait_err, "failed to reap upstream probe");
        }
        return Err(Degradation::upstream(format!(
            "failed to write probe input: {err}"
        )));
    }

    let output = child
        .wait_with_output()
        .map_err(|err| Degradation::upstream(format!("probe did not finish: {err}")))?;
    if !output.stderr.is_empty() {
        debug!(
            command,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "upstream probe stderr"
        );
    }
    if output.stdout.is_empty() && !output.status.success() {
        return Err(Degradation::upstream(format!(
            "probe exited with {}",
            output.status
        )));
    }
    decode_envelope(&output.stdout)
}

fn decode_envelope(stdout: &[u8]) -> Result<Value, Degradation> {
    let envelope: Envelope = serde_json::from_slice(stdout)
        .map_err(|err| Degradation::protocol(format!("invalid probe output: {err}")))?;
    if envelope.ok {
        return Ok(envelope.data);
    }
    let message = envelope
        .error
        .unwrap_or_else(|| "upstream call failed".to_string());
    match envelope.stage.as_deref().and_then(Stage::from_probe) {
        Some(stage) => Err(Degradation::Construction { stage, message }),
        None => Err(Degradation::Upstream { message }),
    }
}

fn settings_payload(params: &SettingsParams) -> Result<Value, Degradation> {
    let kwargs = serde_json::to_value(params)
        .map_err(|err| Degradation::protocol(format!("failed to encode settings: {err}")))?;
    Ok(json!({ "kwargs": kwargs }))
}

impl ModuleImporter for ProcessBackend {
    fn import(&self, root: &Path, module: &str) -> Result<Value, ImportError> {
        match run_probe(&self.python, root, "import", &json!({ "module": module })) {
            Ok(report) => Ok(report),
            Err(Degradation::Upstream { message }) => Err(ImportError::Failed {
                module: module.to_string(),
                message,
            }),
            Err(other) => Err(ImportError::Probe(other.to_string())),
        }
    }
}

/// Settings as the upstream constructed them, with its serialized views.
#[derive(Debug, Clone)]
struct ProcessSettings {
    params: SettingsParams,
    fields: Map<String, Value>,
    model_dump: Option<Map<String, Value>>,
    dict: Option<Map<String, Value>>,
}

impl ProcessSettings {
    fn from_views(params: SettingsParams, views: Value) -> Result<Self, Degradation> {
        let Value::Object(mut views) = views else {
            return Err(Degradation::protocol("settings probe did not return an object"));
        };
        let take_map = |value: Option<Value>| match value {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        };
        let fields = take_map(views.remove("fields")).unwrap_or_default();
        Ok(Self {
            params,
            fields,
            model_dump: take_map(views.remove("model_dump")),
            dict: take_map(views.remove("dict")),
        })
    }
}

impl Attributes for ProcessSettings {
    fn attr(&self, name: &str) -> AttrResult {
        Ok(self.fields.get(name).cloned())
    }
}

impl SettingsHandle for ProcessSettings {
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

struct ProcessDataSource {
    backend: ProcessBackend,
    params: SettingsParams,
}

impl DataSource for ProcessDataSource {
    fn recent_sessions(&self, hours_back: u32) -> Result<Vec<Value>, Degradation> {
        let mut payload = settings_payload(&self.params)?;
        payload["hours_back"] = json!(hours_back);
        match self.backend.run("history", &payload)? {
            Value::Array(sessions) => Ok(sessions),
            Value::Null => Ok(Vec::new()),
            other => Err(Degradation::protocol(format!(
                "expected a session list, got {}",
                kind_of(&other)
            ))),
        }
    }
}

struct ProcessOrchestrator {
    backend: ProcessBackend,
    params: SettingsParams,
    current: Option<Value>,
}

impl Orchestrator for ProcessOrchestrator {
    fn update(&mut self) -> Result<(), Degradation> {
        let payload = settings_payload(&self.params)?;
        let data = self.backend.run("stats", &payload)?;
        self.current = Some(data);
        Ok(())
    }

    fn current_data(&self) -> Result<Value, Degradation> {
        self.current
            .clone()
            .ok_or_else(|| Degradation::upstream("orchestrator has not been updated"))
    }
}

impl MonitorBackend for ProcessBackend {
    fn create_settings(
        &self,
        params: &SettingsParams,
    ) -> Result<Box<dyn SettingsHandle>, Degradation> {
        let views = self.run("settings", &settings_payload(params)?)?;
        let settings = ProcessSettings::from_views(params.clone(), views)?;
        Ok(Box::new(settings))
    }

    fn create_data_source(
        &self,
        settings: &dyn SettingsHandle,
    ) -> Result<Box<dyn DataSource>, Degradation> {
        Ok(Box::new(ProcessDataSource {
            backend: self.clone(),
            params: settings.params().clone(),
        }))
    }

    fn create_orchestrator(
        &self,
        _source: Box<dyn DataSource>,
        settings: &dyn SettingsHandle,
    ) -> Result<Box<dyn Orchestrator>, Degradation> {
        if self.root.is_none() {
            warn!("orchestrator requested without an upstream root");
            return Err(Degradation::Unavailable);
        }
        Ok(Box::new(ProcessOrchestrator {
            backend: self.clone(),
            params: settings.params().clone(),
            current: None,
        }))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
