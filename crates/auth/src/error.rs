//! Error types for auth commands

use thiserror::Error;

/// Errors raised while building, sending or decoding `auth` commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid entity name: {0}")]
    InvalidEntity(String),

    #[error("Invalid caps: {0}")]
    InvalidCaps(String),

    #[error("Invalid key format: {0}")]
    InvalidKey(String),

    #[error("Invalid keyring: {0}")]
    InvalidKeyring(String),

    #[error("Unable to encode {prefix} command: {message}")]
    Encode { prefix: String, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{prefix} failed with code {code}: {message}")]
    CommandFailed {
        prefix: String,
        code: i32,
        message: String,
    },

    #[error("Entity {0} not found")]
    NotFound(String),

    #[error("Unable to decode {prefix} response: {message}")]
    Decode { prefix: String, message: String },

    #[error("{prefix} for {entity} returned {count} records, expected exactly one")]
    UnexpectedRecordCount {
        prefix: String,
        entity: String,
        count: usize,
    },

    #[error("{prefix} for {expected} returned a record for {actual}")]
    EntityMismatch {
        prefix: String,
        expected: String,
        actual: String,
    },
}

impl AuthError {
    /// Whether the cluster reported that the entity does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, AuthError::NotFound(_))
    }
}

/// Result type for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;
