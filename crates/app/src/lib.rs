pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod services;
pub mod startup;

pub use app::{AppConfig, AppState};
pub use config::BridgeConfig;
pub use error::{ApiError, AppError, Result};
pub use services::{
    AppServices, ConfigService, ConfigValidation, HealthReport, HealthStatus, MonitorInfo,
    MonitorService, ServiceDescriptor, StatsService,
};
pub use startup::{AppPaths, ensure_app_data_dir};
