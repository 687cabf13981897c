/// An upstream module the binding layer tries to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleSpec {
    pub name: &'static str,
    pub path: &'static str,
}

/// A class or function looked up on an already imported module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolSpec {
    pub name: &'static str,
    pub module: &'static str,
    pub attribute: &'static str,
}

// No CLI entry modules: importing those parses argv.
pub const UPSTREAM_MODULES: &[ModuleSpec] = &[
    ModuleSpec {
        name: "settings",
        path: "claude_monitor.core.settings",
    },
    ModuleSpec {
        name: "models",
        path: "claude_monitor.core.models",
    },
    ModuleSpec {
        name: "data_manager",
        path: "claude_monitor.monitoring.data_manager",
    },
    ModuleSpec {
        name: "orchestrator",
        path: "claude_monitor.monitoring.orchestrator",
    },
    ModuleSpec {
        name: "calculations",
        path: "claude_monitor.core.calculations",
    },
    ModuleSpec {
        name: "plans",
        path: "claude_monitor.core.plans",
    },
    ModuleSpec {
        name: "pricing",
        path: "claude_monitor.core.pricing",
    },
];

pub const UPSTREAM_CLASSES: &[SymbolSpec] = &[
    SymbolSpec {
        name: "Settings",
        module: "settings",
        attribute: "Settings",
    },
    SymbolSpec {
        name: "DataManager",
        module: "data_manager",
        attribute: "DataManager",
    },
    SymbolSpec {
        name: "MonitoringOrchestrator",
        module: "orchestrator",
        attribute: "MonitoringOrchestrator",
    },
    SymbolSpec {
        name: "SessionBlock",
        module: "models",
        attribute: "SessionBlock",
    },
    SymbolSpec {
        name: "UsageEntry",
        module: "models",
        attribute: "UsageEntry",
    },
    SymbolSpec {
        name: "TokenCounts",
        module: "models",
        attribute: "TokenCounts",
    },
    SymbolSpec {
        name: "BurnRate",
        module: "models",
        attribute: "BurnRate",
    },
];

pub const UPSTREAM_FUNCTIONS: &[SymbolSpec] = &[SymbolSpec {
    name: "normalize_model_name",
    module: "models",
    attribute: "normalize_model_name",
}];
