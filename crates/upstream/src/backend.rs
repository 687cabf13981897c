//! Capability traits the statistics assembler needs from an upstream integration.

use std::path::Path;

use monitor_reader::Attributes;
use serde_json::{Map, Value};
use usage_core::SettingsParams;

use crate::error::{Degradation, ImportError};

/// Imports one upstream module and reports what it exports.
///
/// The report is a JSON object with `__file__`, `__version__` and a `symbols`
/// map of exported name to kind (`"class"`, `"function"`, `"value"`).
pub trait ModuleImporter: Send + Sync {
    fn import(&self, root: &Path, module: &str) -> Result<Value, ImportError>;
}

/// A constructed upstream settings object.
pub trait SettingsHandle: Attributes + Send {
    fn params(&self) -> &SettingsParams;

    /// Full serialized view, when the settings type supports `model_dump()`.
    fn model_dump(&self) -> Option<Map<String, Value>> {
        None
    }

    /// Legacy serialized view, when the settings type supports `dict()`.
    fn dict(&self) -> Option<Map<String, Value>> {
        None
    }
}

pub trait DataSource: Send {
    fn recent_sessions(&self, hours_back: u32) -> Result<Vec<Value>, Degradation>;
}

pub trait Orchestrator: Send {
    /// Runs one refresh cycle.
    fn update(&mut self) -> Result<(), Degradation>;

    /// Aggregate state produced by the last refresh.
    fn current_data(&self) -> Result<Value, Degradation>;
}

pub trait MonitorBackend: Send + Sync {
    fn create_settings(
        &self,
        params: &SettingsParams,
    ) -> Result<Box<dyn SettingsHandle>, Degradation>;

    fn create_data_source(
        &self,
        settings: &dyn SettingsHandle,
    ) -> Result<Box<dyn DataSource>, Degradation>;

    fn create_orchestrator(
        &self,
        source: Box<dyn DataSource>,
        settings: &dyn SettingsHandle,
    ) -> Result<Box<dyn Orchestrator>, Degradation>;
}
