//! Error taxonomy shared by every operation.
//!
//! Each [`OpsError`] maps onto exactly one [`ErrorKind`], which is what the
//! CLI reports alongside the message.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OpsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Permission,
    Transport,
    RemoteApi,
    Resolution,
    UnsupportedOperation,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Permission => "PermissionError",
            ErrorKind::Transport => "TransportError",
            ErrorKind::RemoteApi => "RemoteAPIError",
            ErrorKind::Resolution => "ResolutionError",
            ErrorKind::UnsupportedOperation => "UnsupportedOperationError",
            ErrorKind::Io => "IoError",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum OpsError {
    /// A required parameter is missing, empty or malformed.
    #[error("invalid parameter `{param}`: {message}")]
    Validation { param: String, message: String },

    #[error("permission denied: {0}")]
    Permission(String),

    /// A local git invocation failed. `output` holds what the process printed.
    #[error("{command} failed: {output}")]
    Transport { command: String, output: String },

    /// Non-2xx answer from the hosting service; `message` is passed through verbatim.
    #[error("{}", remote_api_display(.status, .message))]
    RemoteApi { status: Option<u16>, message: String },

    #[error("cannot resolve default branch: {0}")]
    Resolution(String),

    #[error("unsupported operation `{operation}` (supported: {})", .known.join(", "))]
    UnsupportedOperation {
        operation: String,
        known: Vec<&'static str>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn remote_api_display(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("remote API error ({}): {}", code, message),
        None => format!("remote API error: {}", message),
    }
}

impl OpsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpsError::Validation { .. } => ErrorKind::Validation,
            OpsError::Permission(_) => ErrorKind::Permission,
            OpsError::Transport { .. } => ErrorKind::Transport,
            OpsError::RemoteApi { .. } => ErrorKind::RemoteApi,
            OpsError::Resolution(_) => ErrorKind::Resolution,
            OpsError::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            OpsError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn validation(param: impl Into<String>, message: impl Into<String>) -> Self {
        OpsError::Validation {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn missing(param: &str) -> Self {
        OpsError::validation(param, "missing required parameter")
    }

    pub fn transport(command: impl Into<String>, output: impl Into<String>) -> Self {
        OpsError::Transport {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Status code of a remote API failure, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            OpsError::RemoteApi { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OpsError {
    fn from(e: reqwest::Error) -> Self {
        OpsError::RemoteApi {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl From<git2::Error> for OpsError {
    fn from(e: git2::Error) -> Self {
        OpsError::transport("libgit2", e.message())
    }
}

/// Serializable `{ kind, message }` view of an error.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&OpsError> for ErrorReport {
    fn from(e: &OpsError) -> Self {
        ErrorReport {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}
