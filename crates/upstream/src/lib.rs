mod backend;
mod binding;
mod discovery;
mod error;
mod modules;
mod process;

pub use backend::{DataSource, ModuleImporter, MonitorBackend, Orchestrator, SettingsHandle};
pub use binding::{BindingStatus, BoundModule, SourceBinding, Symbol, SymbolKind};
pub use discovery::{MONITOR_DIR_NAME, RootSearch, expand_home_path, is_monitor_root, source_dir};
pub use error::{Degradation, ImportError, Outcome, Stage};
pub use modules::{
    ModuleSpec, SymbolSpec, UPSTREAM_CLASSES, UPSTREAM_FUNCTIONS, UPSTREAM_MODULES,
};
pub use process::ProcessBackend;
