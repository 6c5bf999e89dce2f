//! HTTP exchange with the processing service.
//!
//! Every response body is read as opaque bytes. Whether those bytes are the
//! artifact, a JSON batch envelope or a JSON error is unknowable until the
//! exchange has finished, so shape decisions are left to
//! [`crate::pipeline::classify`].
//!
//! There is no retry. A timeout or refused connection is reported as soon as
//! it happens and the user decides whether to submit again.

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::pipeline::classify::is_json_content_type;
use crate::pipeline::request::{FormField, MultipartBody};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Declared `Content-Type`, verbatim.
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a multipart body and returns the buffered response.
///
/// Implemented by [`HttpTransport`]; tests substitute their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        body: MultipartBody,
        url: &str,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Request {
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Read staged files and assemble the wire form.
    async fn into_form(body: &MultipartBody) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for field in &body.fields {
            form = match field {
                FormField::Text { name, value } => form.text(name.clone(), value.clone()),
                FormField::File {
                    name,
                    path,
                    file_name,
                    mime,
                } => {
                    let bytes =
                        tokio::fs::read(path)
                            .await
                            .map_err(|e| TransportError::Upload {
                                path: path.clone(),
                                reason: e.to_string(),
                            })?;
                    debug!("Attaching '{}' ({} bytes) as '{}'", file_name, bytes.len(), name);
                    let part = Part::bytes(bytes)
                        .file_name(file_name.clone())
                        .mime_str(mime)
                        .map_err(|e| TransportError::Upload {
                            path: path.clone(),
                            reason: format!("invalid MIME type '{mime}': {e}"),
                        })?;
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        body: MultipartBody,
        url: &str,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let form = Self::into_form(&body).await?;
        let secs = timeout.as_secs();

        let mut request = self.client.post(url).multipart(form).timeout(timeout);
        for (k, v) in &body.headers {
            request = request.header(k.as_str(), v.as_str());
        }

        info!("POST {} ({} file part(s), timeout {}s)", url, body.file_count(), secs);
        let response = request
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, url, secs))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if status == StatusCode::NOT_FOUND {
            warn!("{} answered 404", url);
            return Err(TransportError::NotFound {
                endpoint: url.to_string(),
            });
        }
        let json = content_type.as_deref().is_some_and(is_json_content_type);
        if !status.is_success() && !json {
            warn!("{} answered HTTP {} without a JSON body", url, status.as_u16());
            return Err(TransportError::Http {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, url, secs))?
            .to_vec();

        debug!(
            "{} answered HTTP {} ({:?}, {} bytes)",
            url,
            status.as_u16(),
            content_type,
            body.len()
        );

        Ok(RawResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error, url: &str, secs: u64) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout { secs }
    } else if e.is_connect() {
        TransportError::ConnectionRefused {
            endpoint: url.to_string(),
        }
    } else {
        TransportError::Request {
            reason: e.to_string(),
        }
    }
}
