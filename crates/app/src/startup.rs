use std::path::PathBuf;

use crate::Result;

const USAGE_CONFIG_FILE_NAME: &str = "usage-config.json";

#[derive(Clone, Debug)]
pub struct AppPaths {
    pub app_data_dir: PathBuf,
    pub usage_config_path: PathBuf,
}

impl AppPaths {
    pub fn new(app_data_dir: PathBuf) -> Self {
        let usage_config_path = app_data_dir.join(USAGE_CONFIG_FILE_NAME);
        Self {
            app_data_dir,
            usage_config_path,
        }
    }
}

pub fn ensure_app_data_dir(paths: &AppPaths) -> Result<()> {
    std::fs::create_dir_all(&paths.app_data_dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_nested_data_dir() {
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = AppPaths::new(dir.path().join("a").join("b"));
        ensure_app_data_dir(&paths).expect("create");
        assert!(paths.app_data_dir.is_dir());
        assert_eq!(
            paths.usage_config_path,
            dir.path().join("a").join("b").join("usage-config.json")
        );
        ensure_app_data_dir(&paths).expect("idempotent");
    }
}
