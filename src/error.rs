use std::path::PathBuf;

use thiserror::Error;

// ======================================================
// ERROR TYPE
// ======================================================

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid client version '{0}', expected MAJOR.MINOR (e.g. 1.39)")]
    InvalidClientVersion(String),

    #[error("could not create Docker client for {host}: {source}")]
    Connect {
        host: String,
        source: bollard::errors::Error,
    },

    #[error("Docker request failed: {0}")]
    Engine(#[from] bollard::errors::Error),

    #[error("no image matches '{0}'")]
    ImageNotFound(String),

    #[error("failed to serialize JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize compose output: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to write {} output file(s): {}", .0.len(), describe_failures(.0))]
    Write(Vec<WriteFailure>),
}

/// A single file that could not be written during output dispatch.
#[derive(Debug)]
pub struct WriteFailure {
    pub path: PathBuf,
    pub source: std::io::Error,
}

fn describe_failures(failures: &[WriteFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.path.display(), f.source))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T, E = ExporterError> = std::result::Result<T, E>;
