use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use super::paths::AppPaths;
use super::settings::AppConfig;
use super::validation::validate_config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("PLAN_CHAT_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let data_config = self.paths.data_dir.join("config.yml");
        if data_config.exists() {
            return data_config;
        }

        self.paths.project_root.join("config.yml")
    }

    /// Loads `config.yml` (if any), applies environment overrides and validates.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let mut config = load_yaml_file(&self.config_path())?;
        apply_env_overrides(&mut config);
        validate_config(&config)?;
        Ok(config)
    }
}

fn load_yaml_file(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if contents.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    serde_yaml::from_str::<AppConfig>(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Some(port) = env::var("PORT").ok().and_then(|val| val.parse::<u16>().ok()) {
        config.server.port = port;
    }
}
