use std::sync::Arc;

use monitor_upstream::{MonitorBackend, ProcessBackend, SourceBinding};
use tracing::info;

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::services::AppServices;
use crate::startup::{AppPaths, ensure_app_data_dir};

/// Paths and settings needed to run the bridge.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub paths: AppPaths,
    pub bridge: BridgeConfig,
}

/// Application state shared by whatever frontend hosts the bridge.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        bridge: BridgeConfig,
        binding: Arc<SourceBinding>,
        backend: Arc<dyn MonitorBackend>,
    ) -> Self {
        let config = AppConfig {
            paths: bridge.app_paths(),
            bridge,
        };
        let services = AppServices::new(&config, binding, backend);
        Self { config, services }
    }

    /// Binds the process-wide registry (once) and talks to the upstream
    /// through a child interpreter.
    pub fn from_bridge_config(bridge: BridgeConfig) -> Self {
        let importer = ProcessBackend::new(bridge.python.clone());
        let search = bridge.root_search();
        let binding = SourceBinding::global(|| SourceBinding::bind(&search, &importer));
        let backend = match binding.root() {
            Some(root) => importer.with_root(root),
            None => importer,
        };
        Self::new(bridge, binding, Arc::new(backend))
    }

    pub fn initialize(&self) -> Result<()> {
        ensure_app_data_dir(&self.config.paths)?;
        info!(
            data_dir = %self.config.paths.app_data_dir.display(),
            available = self.services.monitor.is_available(),
            "usage bridge initialized"
        );
        Ok(())
    }
}
