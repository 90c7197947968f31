//! Error types for MonClient

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonClientError>;

#[derive(Debug, Error)]
pub enum MonClientError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unable to create cluster handle: {0}")]
    Library(String),

    #[error("Unable to read ceph config {}: {message}", display_config_path(.path))]
    ConfigFile {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("Unable to set option {name}: {message}")]
    InvalidOption { name: String, message: String },

    #[error("Unable to write temporary keyring: {0}")]
    TempKeyring(#[source] std::io::Error),

    #[error("Unable to connect to the cluster: {0}")]
    Connect(String),

    #[error("Not connected to any monitor")]
    NotConnected,

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Timed out after {timeout:?} and {attempts} attempts waiting for the cluster{}", display_last_error(.last_error))]
    Timeout {
        timeout: Duration,
        attempts: u32,
        last_error: Option<String>,
    },
}

fn display_config_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "from the default location".to_string(),
    }
}

fn display_last_error(last_error: &Option<String>) -> String {
    match last_error {
        Some(e) => format!(" (last error: {})", e),
        None => String::new(),
    }
}

impl From<cephconfig::ConfigError> for MonClientError {
    fn from(e: cephconfig::ConfigError) -> Self {
        MonClientError::InvalidConfig(e.to_string())
    }
}

impl From<MonClientError> for auth::AuthError {
    fn from(e: MonClientError) -> Self {
        auth::AuthError::Transport(e.to_string())
    }
}
