//! Response classification: turn one buffered response into exactly one
//! [`ConversionOutcome`].
//!
//! The client always asks for a binary body, yet the same endpoint can answer
//! with three different envelopes depending on the operation and on whether
//! it succeeded. The declared `Content-Type` is the only signal available
//! before the body is looked at:
//!
//! | content-type | status | outcome |
//! |--------------|--------|---------|
//! | JSON         | error  | body re-read as JSON → `ErrorResult` (`details`, then `error`) |
//! | JSON         | 2xx    | batch envelope → `BatchBinary`; `{text}` → `SingleBinary` text |
//! | other        | 2xx    | raw body → `SingleBinary` |
//! | other        | error  | `ErrorResult` with the tool's fallback message |
//!
//! Anything that fails to decode is downgraded to an `ErrorResult` carrying
//! the tool's fallback message; no parse error escapes to the caller.

use crate::outcome::{BatchItem, ConversionOutcome, ErrorCode, ErrorResult};
use crate::pipeline::transport::RawResponse;
use crate::tools::{stem, ToolDescriptor};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use tracing::{debug, warn};

/// Whether a declared content-type denotes JSON.
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("application/json")
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchEntry {
    file_name: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuccessBody {
    Batch { files: Vec<BatchEntry> },
    Text { text: String },
}

/// Classify `response` for `tool`. `original_name` is the first uploaded
/// file's name, used to derive the suggested name of a single artifact.
pub fn classify(
    response: &RawResponse,
    tool: &ToolDescriptor,
    original_name: &str,
) -> ConversionOutcome {
    let json = response
        .content_type
        .as_deref()
        .is_some_and(is_json_content_type);

    match (json, response.is_success()) {
        (true, false) => ConversionOutcome::ErrorResult(classify_error(response, tool)),
        (true, true) => classify_json_success(response, tool, original_name),
        (false, true) => {
            let suggested_name = tool.output_name(original_name);
            debug!(
                "{}: single artifact '{}' ({} bytes)",
                tool.id,
                suggested_name,
                response.body.len()
            );
            ConversionOutcome::SingleBinary {
                bytes: response.body.clone(),
                suggested_name,
            }
        }
        (false, false) => ConversionOutcome::ErrorResult(ErrorResult {
            code: ErrorCode::Http,
            status: Some(response.status),
            message: tool.fallback_error.to_string(),
            detail: None,
        }),
    }
}

fn classify_error(response: &RawResponse, tool: &ToolDescriptor) -> ErrorResult {
    let text = String::from_utf8_lossy(&response.body);
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody { error, details }) => {
            let (message, detail) = match (details, error) {
                (Some(d), Some(e)) => (d, Some(e)),
                (Some(d), None) => (d, None),
                (None, Some(e)) => (e, None),
                (None, None) => (tool.fallback_error.to_string(), None),
            };
            debug!("{}: server error {}: {}", tool.id, response.status, message);
            ErrorResult {
                code: ErrorCode::ServerReported,
                status: Some(response.status),
                message,
                detail,
            }
        }
        Err(e) => {
            warn!("{}: error body labelled JSON is not JSON: {}", tool.id, e);
            decode_error(response.status, tool, e.to_string())
        }
    }
}

fn classify_json_success(
    response: &RawResponse,
    tool: &ToolDescriptor,
    original_name: &str,
) -> ConversionOutcome {
    let body = match serde_json::from_slice::<SuccessBody>(&response.body) {
        Ok(body) => body,
        Err(e) => {
            warn!("{}: unrecognised JSON success body: {}", tool.id, e);
            return ConversionOutcome::ErrorResult(decode_error(
                response.status,
                tool,
                e.to_string(),
            ));
        }
    };

    match body {
        SuccessBody::Batch { files } => {
            let mut items = Vec::with_capacity(files.len());
            for entry in files {
                match STANDARD.decode(entry.data.as_bytes()) {
                    Ok(bytes) => items.push(BatchItem {
                        name: entry.file_name,
                        bytes,
                    }),
                    Err(e) => {
                        warn!("{}: entry '{}' is not valid base64: {}", tool.id, entry.file_name, e);
                        return ConversionOutcome::ErrorResult(decode_error(
                            response.status,
                            tool,
                            format!("entry '{}': {}", entry.file_name, e),
                        ));
                    }
                }
            }
            debug!("{}: batch of {} artifact(s)", tool.id, items.len());
            ConversionOutcome::BatchBinary { items }
        }
        SuccessBody::Text { text } => ConversionOutcome::SingleBinary {
            bytes: text.into_bytes(),
            suggested_name: format!("{}.txt", stem(original_name)),
        },
    }
}

fn decode_error(status: u16, tool: &ToolDescriptor, detail: String) -> ErrorResult {
    ErrorResult {
        code: ErrorCode::Decode,
        status: Some(status),
        message: tool.fallback_error.to_string(),
        detail: Some(detail),
    }
}
