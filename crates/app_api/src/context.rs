use std::path::PathBuf;

use bridge_app::AppState;

#[derive(Clone)]
pub struct AppContext {
    pub app_state: AppState,
    pub app_data_dir: PathBuf,
}

impl AppContext {
    pub fn new(app_state: AppState) -> Self {
        let app_data_dir = app_state.config.paths.app_data_dir.clone();
        Self {
            app_state,
            app_data_dir,
        }
    }
}
