use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const STORE_FILE_NAME: &str = "vector_store.db";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub store_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let data_dir = discover_data_dir(&project_root);
        Self::with_data_dir(project_root, data_dir)
    }

    pub fn with_data_dir(project_root: PathBuf, data_dir: PathBuf) -> Self {
        let log_dir = data_dir.join("logs");
        let store_path = data_dir.join(STORE_FILE_NAME);

        for dir in [&data_dir, &log_dir] {
            if let Err(err) = fs::create_dir_all(dir) {
                tracing::warn!("Failed to create {}: {}", dir.display(), err);
            }
        }

        AppPaths {
            project_root,
            data_dir,
            log_dir,
            store_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("PLAN_CHAT_ROOT") {
        return PathBuf::from(root);
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn discover_data_dir(project_root: &Path) -> PathBuf {
    if let Ok(dir) = env::var("PLAN_CHAT_DATA_DIR") {
        return PathBuf::from(dir);
    }

    project_root.join("data")
}
