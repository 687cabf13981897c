use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which link of the settings → data source → orchestrator chain failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Settings,
    DataSource,
    Orchestrator,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Settings => "settings",
            Self::DataSource => "data_source",
            Self::Orchestrator => "orchestrator",
        }
    }

    pub(crate) fn from_probe(stage: &str) -> Option<Self> {
        match stage {
            "settings" => Some(Self::Settings),
            "data_manager" | "data_source" => Some(Self::DataSource),
            "orchestrator" => Some(Self::Orchestrator),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an operation returned a degraded value instead of live data.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    #[error("upstream monitor not available")]
    Unavailable,
    #[error("upstream symbol `{name}` is not bound")]
    MissingSymbol { name: String },
    #[error("failed to construct {stage}: {message}")]
    Construction { stage: Stage, message: String },
    #[error("upstream call failed: {message}")]
    Upstream { message: String },
    #[error("unexpected upstream response: {message}")]
    Protocol { message: String },
}

impl Degradation {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("module {module} failed to import: {message}")]
    Failed { module: String, message: String },
    #[error("could not run upstream probe: {0}")]
    Probe(String),
}

/// A value that is always usable, plus the reason it was degraded, if it was.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degradation: Option<Degradation>,
}

impl<T> Outcome<T> {
    pub fn live(value: T) -> Self {
        Self {
            value,
            degradation: None,
        }
    }

    pub fn degraded(value: T, reason: Degradation) -> Self {
        Self {
            value,
            degradation: Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degradation.is_some()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
