use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ExporterError, Result};

pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";
pub const DEFAULT_CLIENT_VERSION: &str = "1.39";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const CONFIG_FILE_NAME: &str = ".docker-exporter.yaml";

// ======================================================
// FILE CONFIG
// ======================================================

/// Contents of `~/.docker-exporter.yaml`. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct FileConfig {
    pub docker_host: Option<String>,
    pub client_version: Option<String>,
    pub log_level: Option<String>,
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Loads the config file.
///
/// An explicit path must exist. The default location is optional: when
/// there is no file there, an empty config is returned.
pub fn load_file(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(FileConfig::default()),
        },
    };

    parse_file(&path)
}

fn parse_file(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path).map_err(|source| ExporterError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    serde_yaml::from_str(&content).map_err(|source| ExporterError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

// ======================================================
// RESOLVED SETTINGS
// ======================================================

/// Values given on the command line or through the environment; clap
/// already applies flag-over-env precedence when filling these in.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub docker_host: Option<String>,
    pub client_version: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub docker_host: String,
    pub client_version: String,
    pub log_level: String,
}

impl Settings {
    /// Flag or env, then file, then built-in default.
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Self {
        Settings {
            docker_host: overrides
                .docker_host
                .or(file.docker_host)
                .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string()),
            client_version: overrides
                .client_version
                .or(file.client_version)
                .unwrap_or_else(|| DEFAULT_CLIENT_VERSION.to_string()),
            log_level: overrides
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}
