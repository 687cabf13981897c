use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use monitor_reader::{resolve, resolve_single, resolve_str};
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::backend::ModuleImporter;
use crate::discovery::RootSearch;
use crate::modules::{SymbolSpec, UPSTREAM_CLASSES, UPSTREAM_FUNCTIONS, UPSTREAM_MODULES};

static GLOBAL: OnceCell<Arc<SourceBinding>> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Class,
    Function,
}

impl SymbolKind {
    fn report_kind(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Function => "function",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    pub module: String,
    pub attribute: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundModule {
    pub name: String,
    pub path: String,
    pub file: Option<String>,
    pub version: Option<String>,
    #[serde(skip)]
    report: Value,
}

impl BoundModule {
    fn from_report(name: &str, path: &str, report: Value) -> Self {
        let file = resolve_single(Some(&report), "__file__", Value::Null)
            .as_str()
            .map(str::to_string);
        let version = match resolve_single(Some(&report), "__version__", Value::Null) {
            Value::String(text) => Some(text),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        };
        Self {
            name: name.to_string(),
            path: path.to_string(),
            file,
            version,
            report,
        }
    }

    /// Kind the module reported for an exported name (`"class"`, `"function"`...).
    pub fn symbol_kind(&self, attribute: &str) -> Option<String> {
        let kind = resolve_str(Some(&self.report), &format!("symbols.{attribute}"), "");
        (!kind.is_empty()).then_some(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BindingStatus {
    Bound,
    Degraded { reason: String },
}

/// Write-once registry of what the upstream library exposed at startup.
#[derive(Debug, Clone)]
pub struct SourceBinding {
    root: Option<PathBuf>,
    modules: BTreeMap<String, BoundModule>,
    classes: BTreeMap<String, Symbol>,
    functions: BTreeMap<String, Symbol>,
    status: BindingStatus,
}

impl SourceBinding {
    /// Registry with nothing bound; every operation reports unavailable.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            root: None,
            modules: BTreeMap::new(),
            classes: BTreeMap::new(),
            functions: BTreeMap::new(),
            status: BindingStatus::Degraded {
                reason: reason.into(),
            },
        }
    }

    /// Locates the upstream root and imports each known module independently.
    pub fn bind(search: &RootSearch, importer: &dyn ModuleImporter) -> Self {
        let Some(root) = search.find() else {
            error!(
                candidates = ?search.candidates(),
                "upstream monitor not found at any known location"
            );
            return Self::unavailable("upstream monitor root not found");
        };

        let mut modules = BTreeMap::new();
        for spec in UPSTREAM_MODULES {
            match importer.import(&root, spec.path) {
                Ok(report) => {
                    debug!(module = spec.path, "loaded upstream module");
                    modules.insert(
                        spec.name.to_string(),
                        BoundModule::from_report(spec.name, spec.path, report),
                    );
                }
                Err(err) => {
                    warn!(module = spec.path, error = %err, "failed to load upstream module");
                }
            }
        }

        let classes = extract_symbols(&modules, UPSTREAM_CLASSES, SymbolKind::Class);
        let functions = extract_symbols(&modules, UPSTREAM_FUNCTIONS, SymbolKind::Function);

        let status = if modules.is_empty() {
            error!(root = %root.display(), "failed to load any upstream module");
            BindingStatus::Degraded {
                reason: "no upstream module could be loaded".to_string(),
            }
        } else {
            info!(
                root = %root.display(),
                modules = ?modules.keys().collect::<Vec<_>>(),
                classes = ?classes.keys().collect::<Vec<_>>(),
                "upstream monitor bound"
            );
            BindingStatus::Bound
        };

        Self {
            root: Some(root),
            modules,
            classes,
            functions,
            status,
        }
    }

    /// Process-wide registry; the first caller's `init` runs, later calls reuse it.
    pub fn global<F>(init: F) -> Arc<SourceBinding>
    where
        F: FnOnce() -> SourceBinding,
    {
        GLOBAL.get_or_init(|| Arc::new(init())).clone()
    }

    pub fn try_global() -> Option<Arc<SourceBinding>> {
        GLOBAL.get().cloned()
    }

    pub fn is_available(&self) -> bool {
        !self.modules.is_empty()
    }

    pub fn status(&self) -> &BindingStatus {
        &self.status
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn get_symbol(&self, kind: SymbolKind, name: &str) -> Option<&Symbol> {
        match kind {
            SymbolKind::Class => self.classes.get(name),
            SymbolKind::Function => self.functions.get(name),
        }
    }

    pub fn module(&self, name: &str) -> Option<&BoundModule> {
        self.modules.get(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &BoundModule> {
        self.modules.values()
    }

    pub fn module_names(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }

    pub fn function_names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }
}

fn extract_symbols(
    modules: &BTreeMap<String, BoundModule>,
    specs: &[SymbolSpec],
    kind: SymbolKind,
) -> BTreeMap<String, Symbol> {
    let mut symbols = BTreeMap::new();
    for spec in specs {
        let Some(module) = modules.get(spec.module) else {
            continue;
        };
        let reported = resolve(
            Some(&module.report),
            &format!("symbols.{}", spec.attribute),
            Value::Null,
        );
        if reported.as_str() == Some(kind.report_kind()) {
            debug!(symbol = spec.name, module = %module.path, "extracted upstream symbol");
            symbols.insert(
                spec.name.to_string(),
                Symbol {
                    kind,
                    name: spec.name.to_string(),
                    module: module.path.clone(),
                    attribute: spec.attribute.to_string(),
                },
            );
        } else {
            warn!(
                symbol = spec.name,
                module = %module.path,
                found = %reported,
                "failed to extract upstream symbol"
            );
        }
    }
    symbols
}
