//! One tool instance: its staged files, its state, and the submit flow.
//!
//! ```text
//! stage ──▶ build ──▶ send ──▶ classify ──▶ emit
//!  (validate)  (pure)   (HTTP)   (sniff)     (save)
//! ```
//!
//! At most one request is in flight per session. A `submit` that arrives
//! while another is pending returns [`SubmitStatus::Busy`] immediately: no
//! request is issued and the selection is not touched. This is a guard, not
//! a queue.

use crate::config::ClientConfig;
use crate::error::ConvertDeskError;
use crate::outcome::SavedArtifact;
use crate::pipeline::classify::classify;
use crate::pipeline::emit::{emit, ArtifactSink, DirectorySink};
use crate::pipeline::request::{build, ConversionRequest};
use crate::pipeline::transport::{HttpTransport, Transport};
use crate::pipeline::validate::{FileHandle, StageReport, UploadSelection};
use crate::tools::{find_tool, ToolDescriptor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// What the UI should show for this tool right now.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToolState {
    #[default]
    Idle,
    Pending,
    Completed { artifacts: Vec<SavedArtifact> },
    Failed { message: String },
}

/// Result of a [`ToolSession::submit`] call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStatus {
    /// Another submit was already pending; nothing happened.
    Busy,
    /// Artifacts saved, in emission order.
    Completed(Vec<SavedArtifact>),
}

/// A session bound to one tool.
pub struct ToolSession {
    tool: &'static ToolDescriptor,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn ArtifactSink>,
    selection: Mutex<UploadSelection>,
    state: Mutex<ToolState>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag however the submit ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ToolSession {
    /// Open a session for `tool_id` using HTTP and the configured download directory.
    pub fn new(tool_id: &str, config: ClientConfig) -> Result<Self, ConvertDeskError> {
        let tool = find_tool(tool_id)?;
        let transport = Arc::new(HttpTransport::new(&config)?);
        let sink = Arc::new(DirectorySink::new(config.download_dir.clone()));
        Ok(Self::with_parts(tool, config, transport, sink))
    }

    /// Open a session with explicit transport and sink.
    pub fn with_parts(
        tool: &'static ToolDescriptor,
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            tool,
            config,
            transport,
            sink,
            selection: Mutex::new(UploadSelection::new()),
            state: Mutex::new(ToolState::Idle),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn tool(&self) -> &'static ToolDescriptor {
        self.tool
    }

    /// Snapshot of the staged files.
    pub fn selection(&self) -> UploadSelection {
        lock(&self.selection).clone()
    }

    pub fn state(&self) -> ToolState {
        lock(&self.state).clone()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Validate and stage files.
    pub fn stage(&self, files: Vec<FileHandle>) -> StageReport {
        lock(&self.selection).stage(files, self.tool)
    }

    pub fn remove(&self, index: usize) -> Option<FileHandle> {
        lock(&self.selection).remove(index)
    }

    pub fn clear(&self) {
        lock(&self.selection).clear();
    }

    /// Submit the staged files with tool-specific `params`.
    ///
    /// On success the artifacts are saved and, for tools that clear on
    /// success, the selection is emptied. On any failure the selection is
    /// left as it was so the user can submit again.
    pub async fn submit(
        &self,
        params: Vec<(String, String)>,
    ) -> Result<SubmitStatus, ConvertDeskError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("{}: submit ignored, request already pending", self.tool.id);
            return Ok(SubmitStatus::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);
        *lock(&self.state) = ToolState::Pending;

        let result = self.run(params).await;
        let callback = self.config.progress_callback.as_ref();

        match result {
            Ok(artifacts) => {
                if self.tool.clear_on_success {
                    lock(&self.selection).clear();
                }
                info!("{}: {} artifact(s) saved", self.tool.id, artifacts.len());
                if let Some(cb) = callback {
                    cb.on_submit_complete(artifacts.len());
                }
                *lock(&self.state) = ToolState::Completed {
                    artifacts: artifacts.clone(),
                };
                Ok(SubmitStatus::Completed(artifacts))
            }
            Err(e) => {
                let message = e.to_string();
                warn!("{}: submit failed: {}", self.tool.id, message);
                if let Some(cb) = callback {
                    cb.on_submit_error(&message);
                }
                *lock(&self.state) = ToolState::Failed { message };
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        params: Vec<(String, String)>,
    ) -> Result<Vec<SavedArtifact>, ConvertDeskError> {
        let request = ConversionRequest::new(&lock(&self.selection)).with_params(params);
        let body = build(&request, self.tool)?;

        let callback = self.config.progress_callback.as_ref();
        if let Some(cb) = callback {
            cb.on_submit_start(self.tool.id, body.file_count());
        }

        let url = self.config.endpoint_url(self.tool.endpoint);
        let timeout = self.config.timeout_for(self.tool.timeout);
        let response = self.transport.send(body, &url, timeout).await?;

        if let Some(cb) = callback {
            cb.on_response(response.status, response.content_type.as_deref());
        }

        let outcome = classify(&response, self.tool, request.primary_name());
        emit(outcome, self.sink.as_ref(), callback.map(|cb| &**cb)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn unknown_tool_is_rejected() {
        let result = ToolSession::new("nope", ClientConfig::default());
        assert!(matches!(result, Err(ConvertDeskError::UnknownTool { .. })));
    }

    #[tokio::test]
    async fn empty_selection_fails_locally_and_resets_pending() {
        let session = ToolSession::new("pdf-split", ClientConfig::default()).unwrap();
        let err = session.submit(vec![]).await.unwrap_err();

        assert!(matches!(
            err,
            ConvertDeskError::Validation(ValidationError::EmptySelection)
        ));
        assert!(!session.is_pending());
        assert!(matches!(session.state(), ToolState::Failed { .. }));
    }

    #[test]
    fn in_flight_guard_resets_flag() {
        let flag = AtomicBool::new(true);
        {
            let _g = InFlightGuard(&flag);
        }
        assert!(!flag.load(Ordering::SeqCst));
    }
}
