//! Error types for the convertdesk library.
//!
//! Failures are grouped by *where* they happen, because each group is
//! recovered differently:
//!
//! * [`ValidationError`]: caught locally before any request is built.
//!   Never reaches the network.
//!
//! * [`TransportError`]: the HTTP exchange itself failed (timeout, refused
//!   connection, missing endpoint). Reported immediately; there is no
//!   automatic retry.
//!
//! * [`crate::outcome::ErrorResult`]: the server answered, and the answer
//!   was an error. Carried by [`ConvertDeskError::Server`] once it leaves the
//!   emitter.
//!
//! None of these is fatal to a tool session: after any of them the session is
//! back in a state where the user can submit again.

use crate::outcome::ErrorResult;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error of a submission or library call.
#[derive(Debug, Error)]
pub enum ConvertDeskError {
    /// A staged file or tool parameter was rejected before sending.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server produced an error response (or one that could not be decoded).
    #[error("{0}")]
    Server(ErrorResult),

    /// A local input file does not exist.
    #[error("File not found: '{}'\nCheck the path exists and is readable.", .path.display())]
    FileNotFound { path: PathBuf },

    /// The process may not read a local input file.
    #[error("Permission denied reading '{}'\nTry: chmod +r {:?}", .path.display(), .path)]
    PermissionDenied { path: PathBuf },

    /// An artifact could not be written to the download directory.
    #[error("Failed to save '{}': {source}", .path.display())]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No tool with this id exists in the tool table.
    #[error("Unknown tool '{id}'\nRun `convertdesk tools` to list the available tools.")]
    UnknownTool { id: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A local rejection: the request is never built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Extension does not match the tool's accepted format.
    #[error("Invalid file format. Expected {expected} file but received .{actual}")]
    FormatMismatch { expected: String, actual: String },

    /// File is larger than the tool allows.
    #[error("File size {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    /// Declared MIME type is not one the tool handles.
    #[error("Invalid file type '{mime}'")]
    InvalidType { mime: String },

    /// Submit was requested with nothing staged.
    #[error("Please select at least one file")]
    EmptySelection,

    /// Split range does not follow the `1,3,4-5,6-9` grammar.
    #[error("Invalid page range '{input}': {reason}. Use format like: 1,3,4-5,6-9")]
    InvalidPageRange { input: String, reason: String },

    /// Split page is not a non-negative integer.
    #[error("Invalid page number '{input}'. Enter 0 to split into individual pages")]
    InvalidPageNumber { input: String },
}

impl ValidationError {
    /// Short kebab-case tag, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::FormatMismatch { .. } => "format-mismatch",
            ValidationError::TooLarge { .. } => "too-large",
            ValidationError::InvalidType { .. } => "invalid-type",
            ValidationError::EmptySelection => "empty-selection",
            ValidationError::InvalidPageRange { .. } => "invalid-page-range",
            ValidationError::InvalidPageNumber { .. } => "invalid-page-number",
        }
    }
}

/// The HTTP exchange failed before a classifiable response existed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No complete response within the tool's timeout.
    #[error("Request timed out after {secs}s. The file might be too large or the server is busy.")]
    Timeout { secs: u64 },

    /// Nothing is listening at the endpoint.
    #[error("Unable to connect to '{endpoint}'. Please make sure the backend server is running.")]
    ConnectionRefused { endpoint: String },

    /// The server does not know this endpoint.
    #[error("Server endpoint not found: '{endpoint}'")]
    NotFound { endpoint: String },

    /// Non-success status with no structured error body.
    #[error("Server returned HTTP {status}")]
    Http { status: u16 },

    /// A staged file could not be read while assembling the upload.
    #[error("Failed to read '{}' for upload: {reason}", .path.display())]
    Upload { path: PathBuf, reason: String },

    /// Any other client-side request failure.
    #[error("Request failed: {reason}")]
    Request { reason: String },
}

impl TransportError {
    /// Short kebab-case tag, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout { .. } => "timeout",
            TransportError::ConnectionRefused { .. } => "connection-refused",
            TransportError::NotFound { .. } => "not-found",
            TransportError::Http { .. } => "other-http-error",
            TransportError::Upload { .. } => "upload",
            TransportError::Request { .. } => "request",
        }
    }
}
