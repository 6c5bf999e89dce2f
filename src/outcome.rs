//! The result of reconciling one HTTP exchange.
//!
//! Exactly one [`ConversionOutcome`] is produced per response that reaches
//! the classifier. Saved-file bookkeeping ([`SavedArtifact`]) lives here too
//! since it is what a completed outcome turns into.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What actually happened, recovered from status, content-type and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// One artifact, the raw response body.
    SingleBinary { bytes: Vec<u8>, suggested_name: String },
    /// Several artifacts decoded from a JSON batch envelope, in server order.
    BatchBinary { items: Vec<BatchItem> },
    /// The server reported an error, or its answer could not be decoded.
    ErrorResult(ErrorResult),
}

impl ConversionOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ConversionOutcome::ErrorResult(_))
    }

    /// Number of files a successful outcome will produce.
    pub fn artifact_count(&self) -> usize {
        match self {
            ConversionOutcome::SingleBinary { .. } => 1,
            ConversionOutcome::BatchBinary { items } => items.len(),
            ConversionOutcome::ErrorResult(_) => 0,
        }
    }
}

/// One decoded entry of a batch envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Where an error result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    /// JSON error body from the server.
    #[serde(rename = "server-error")]
    ServerReported,
    /// Body was unreadable or a success envelope was malformed.
    #[serde(rename = "decode-error")]
    Decode,
    /// Non-success status with a non-JSON body.
    #[serde(rename = "http-error")]
    Http,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCode::ServerReported => "server-error",
            ErrorCode::Decode => "decode-error",
            ErrorCode::Http => "http-error",
        })
    }
}

/// A user-displayable error derived from a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResult {
    pub code: ErrorCode,
    /// HTTP status, when the response carried one worth reporting.
    pub status: Option<u16>,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for ErrorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A file written by an [`crate::pipeline::emit::ArtifactSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedArtifact {
    /// Name the artifact was offered under.
    pub name: String,
    /// Where it actually landed (may differ from `name` on collisions).
    pub path: PathBuf,
    pub size: u64,
}
