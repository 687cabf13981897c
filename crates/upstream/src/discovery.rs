use std::path::{Path, PathBuf};

pub const MONITOR_DIR_NAME: &str = "Claude-Code-Usage-Monitor";

const WELL_KNOWN_ROOTS: &[&str] = &["/opt/claude-monitor", "/usr/local/claude-monitor"];

/// Ordered list of places the upstream checkout may live.
#[derive(Debug, Clone, Default)]
pub struct RootSearch {
    candidates: Vec<PathBuf>,
}

impl RootSearch {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Explicit path first, then `./Claude-Code-Usage-Monitor`, then
    /// `~/Claude-Code-Usage-Monitor` and the system-wide locations.
    pub fn standard(explicit: Option<&Path>) -> Self {
        let mut candidates = Vec::new();
        if let Some(path) = explicit {
            candidates.push(path.to_path_buf());
        }
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(MONITOR_DIR_NAME));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(MONITOR_DIR_NAME));
        }
        candidates.extend(WELL_KNOWN_ROOTS.iter().map(PathBuf::from));
        Self { candidates }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn find(&self) -> Option<PathBuf> {
        self.candidates
            .iter()
            .find(|candidate| is_monitor_root(candidate))
            .cloned()
    }
}

pub fn is_monitor_root(path: &Path) -> bool {
    source_dir(path).join("claude_monitor").is_dir()
}

pub fn source_dir(root: &Path) -> PathBuf {
    root.join("src")
}

pub fn expand_home_path(path: &str) -> PathBuf {
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
