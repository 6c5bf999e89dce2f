//! # convertdesk
//!
//! Client for a remote document and media processing service.
//!
//! Every tool (image format conversion, PDF merge and split, archive
//! creation, background removal, text extraction, video transcoding) follows
//! the same shape: stage local files, send them as one multipart request,
//! and save whatever comes back.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Validate  extension, size, MIME against the tool descriptor
//!  ├─ 2. Build     multipart layout: file parts, fixed params, tool params
//!  ├─ 3. Send      one POST, per-class timeout, whole body buffered
//!  ├─ 4. Classify  binary / JSON batch / JSON error by Content-Type
//!  └─ 5. Emit      one or many artifacts saved, or an error for display
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use convertdesk::{ClientConfig, FileHandle, SplitOptions, ToolSession, PageRangeSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://localhost:5000")
//!         .download_dir("out")
//!         .build()?;
//!     let session = ToolSession::new("pdf-split", config)?;
//!
//!     session.stage(vec![FileHandle::from_path("book.pdf").await?]);
//!     let params = SplitOptions::Range(PageRangeSpec::parse("1-3,7")?).to_params();
//!     let status = session.submit(params).await?;
//!     println!("{status:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `convertdesk` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! convertdesk = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod tools;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ConvertDeskError, TransportError, ValidationError};
pub use outcome::{BatchItem, ConversionOutcome, ErrorCode, ErrorResult, SavedArtifact};
pub use pipeline::classify::classify;
pub use pipeline::emit::{emit, ArtifactSink, DirectorySink};
pub use pipeline::pages::{PageRangeSpec, PageToken, SplitOptions, SplitPage};
pub use pipeline::request::{
    build, ConversionRequest, FormField, MultipartBody, VideoBitrate, VideoFps, VideoQuality,
    VideoSettings,
};
pub use pipeline::transport::{HttpTransport, RawResponse, Transport};
pub use pipeline::validate::{validate, FileHandle, StageReport, UploadSelection};
pub use progress::{NoopProgressCallback, ProgressCallback, SubmissionProgressCallback};
pub use session::{SubmitStatus, ToolSession, ToolState};
pub use tools::{find_tool, Format, TimeoutClass, ToolDescriptor, TOOLS};
