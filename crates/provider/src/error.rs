//! Error types for provider operations
//!
//! Errors keep the message of the layer below and only add the operation
//! that failed.

use auth::AuthError;
use monclient::MonClientError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid provider configuration: {0}")]
    Config(#[source] MonClientError),

    #[error("Invalid {resource} configuration: {message}")]
    InvalidInput {
        resource: &'static str,
        message: String,
    },

    #[error("Unable to connect to Ceph: {0}")]
    Connect(#[source] MonClientError),

    #[error("Error on {command}: {source}")]
    Command {
        command: &'static str,
        #[source]
        source: AuthError,
    },

    #[error("Entity {0} does not exist")]
    EntityNotFound(String),

    #[error("Changing {attribute} of {resource} requires replacing it")]
    RequiresReplacement {
        resource: &'static str,
        attribute: &'static str,
    },

    #[error("{resource} does not support {operation}")]
    Unsupported {
        resource: &'static str,
        operation: &'static str,
    },

    #[error("Error waiting for Ceph to be online: {0}")]
    WaitOnline(#[source] MonClientError),
}

impl ProviderError {
    pub(crate) fn command(command: &'static str) -> impl FnOnce(AuthError) -> Self {
        move |source| ProviderError::Command { command, source }
    }
}
