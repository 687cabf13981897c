mod config_store;
mod monitor;
mod stats;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use monitor_upstream::{MonitorBackend, SourceBinding};

use crate::app::AppConfig;

pub use config_store::ConfigService;
pub use monitor::{HealthReport, HealthStatus, MonitorInfo, MonitorService, ServiceDescriptor};
pub use stats::{ConfigValidation, StatsService};

type SharedConfig = Arc<AppConfig>;
type SharedMonitor = Arc<MonitorContext>;

/// The bound upstream plus the backend used to talk to it.
pub(crate) struct MonitorContext {
    pub(crate) binding: Arc<SourceBinding>,
    pub(crate) backend: Arc<dyn MonitorBackend>,
    pub(crate) started_at: DateTime<Utc>,
}

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub stats: StatsService,
    pub config: ConfigService,
    pub monitor: MonitorService,
}

impl AppServices {
    pub fn new(
        config: &AppConfig,
        binding: Arc<SourceBinding>,
        backend: Arc<dyn MonitorBackend>,
    ) -> Self {
        let shared = Arc::new(config.clone());
        let monitor = Arc::new(MonitorContext {
            binding,
            backend,
            started_at: Utc::now(),
        });
        Self {
            stats: StatsService::new(monitor.clone()),
            config: ConfigService::new(shared),
            monitor: MonitorService::new(monitor),
        }
    }
}
