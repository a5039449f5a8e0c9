//! Error types shared by the scheduler, the config loader and the hue bridge client.

use std::path::PathBuf;

/// Invalid or missing configuration. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("path to config file could not be determined, which means your operating system is not supported")]
    NoConfigDir,

    #[error("config file could not be read from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file at {path} could not be parsed")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { field, reason: reason.into() }
    }
}

/// Output could not be computed for the current clock time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    #[error("scene mode needs at least 2 scenes, got {0}")]
    NotEnoughScenes(usize),
}

/// Failure to apply output to a single light. Never aborts a tick.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("sending request failed")]
    Request(#[from] reqwest::Error),

    #[error("bridge responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("bridge reported error {kind}: {description}")]
    Bridge { kind: u64, description: String },

    #[error("unexpected response from bridge: {0}")]
    UnexpectedResponse(String),
}
