use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::services::SharedMonitor;

pub const SERVICE_NAME: &str = "Claude Usage Monitor Bridge";

/// What the binding pass found, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorInfo {
    pub available: bool,
    pub root: Option<String>,
    pub modules_loaded: Vec<String>,
    pub classes_available: Vec<String>,
    pub functions_available: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub module_paths: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub available: bool,
    pub uptime_seconds: f64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDescriptor {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub available: bool,
}

#[derive(Clone)]
pub struct MonitorService {
    monitor: SharedMonitor,
}

impl MonitorService {
    pub(super) fn new(monitor: SharedMonitor) -> Self {
        Self { monitor }
    }

    pub fn is_available(&self) -> bool {
        self.monitor.binding.is_available()
    }

    pub fn info(&self) -> MonitorInfo {
        let binding = &self.monitor.binding;
        let available = binding.is_available();
        let (version, module_paths) = if available {
            let version = binding
                .module("models")
                .map(|module| module.version.clone().unwrap_or_else(|| "unknown".to_string()));
            let module_paths = binding
                .modules()
                .map(|module| {
                    let file = module.file.clone().unwrap_or_else(|| "unknown".to_string());
                    (module.name.clone(), file)
                })
                .collect();
            (version, module_paths)
        } else {
            (None, BTreeMap::new())
        };
        MonitorInfo {
            available,
            root: binding.root().map(|root| root.display().to_string()),
            modules_loaded: binding.module_names(),
            classes_available: binding.class_names(),
            functions_available: binding.function_names(),
            version,
            module_paths,
        }
    }

    pub fn health(&self) -> HealthReport {
        self.health_at(Utc::now())
    }

    pub fn health_at(&self, now: DateTime<Utc>) -> HealthReport {
        let available = self.is_available();
        let uptime = now.signed_duration_since(self.monitor.started_at);
        HealthReport {
            status: if available {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            available,
            uptime_seconds: (uptime.num_milliseconds().max(0) as f64) / 1000.0,
            timestamp: now,
        }
    }

    pub fn descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor {
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            status: "running",
            available: self.is_available(),
        }
    }
}
