// Central Error Type for the Request Manager
//
// Only input and registry errors live here. Per-request transport and decode
// failures never surface as `Err`; they are folded into `RequestResult`.

use thiserror::Error;

/// Manager-level error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("key value pairs must not be empty")]
    EmptyInput,

    #[error("No requests to execute")]
    NoRequests,

    #[error("Invalid requests value")]
    InvalidRequests,

    #[error("url {index} must be a non-empty string")]
    InvalidRequestUrl { index: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using ManagerError
pub type Result<T> = std::result::Result<T, ManagerError>;

impl From<serde_json::Error> for ManagerError {
    fn from(err: serde_json::Error) -> Self {
        ManagerError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ManagerError {
    fn from(err: std::io::Error) -> Self {
        ManagerError::Internal(err.to_string())
    }
}
