//! Client configuration.
//!
//! Everything that is about *where* and *how long* rather than *which tool*
//! lives in [`ClientConfig`]; per-tool data lives in the
//! [`crate::tools::ToolDescriptor`] table. Build it through
//! [`ClientConfigBuilder`] so new knobs never break existing callers.

use crate::error::ConvertDeskError;
use crate::progress::ProgressCallback;
use crate::tools::TimeoutClass;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration shared by every tool session.
///
/// # Example
/// ```rust
/// use convertdesk::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:5000")
///     .short_timeout_secs(30)
///     .long_timeout_secs(600)
///     .download_dir("downloads")
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "http://localhost:5000");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Scheme and authority of the processing service, no trailing slash.
    /// Default: `http://localhost:5000`.
    pub base_url: String,

    /// Timeout for image, document and text tools, in seconds. Default: 30.
    pub short_timeout_secs: u64,

    /// Timeout for video tools, in seconds. Default: 300.
    ///
    /// Uploading and transcoding a few hundred megabytes routinely takes
    /// minutes; the short timeout would abort nearly every video request.
    pub long_timeout_secs: u64,

    /// Directory artifacts are saved into. Default: current directory.
    pub download_dir: PathBuf,

    /// `User-Agent` header for every request.
    pub user_agent: String,

    /// Optional observer for submission events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            short_timeout_secs: 30,
            long_timeout_secs: 300,
            download_dir: PathBuf::from("."),
            user_agent: concat!("convertdesk/", env!("CARGO_PKG_VERSION")).to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("short_timeout_secs", &self.short_timeout_secs)
            .field("long_timeout_secs", &self.long_timeout_secs)
            .field("download_dir", &self.download_dir)
            .field("user_agent", &self.user_agent)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn SubmissionProgressCallback>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Timeout for a tool of the given class.
    pub fn timeout_for(&self, class: TimeoutClass) -> Duration {
        Duration::from_secs(match class {
            TimeoutClass::Short => self.short_timeout_secs,
            TimeoutClass::Long => self.long_timeout_secs,
        })
    }

    /// Absolute URL of a tool endpoint path.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn short_timeout_secs(mut self, secs: u64) -> Self {
        self.config.short_timeout_secs = secs;
        self
    }

    pub fn long_timeout_secs(mut self, secs: u64) -> Self {
        self.config.long_timeout_secs = secs;
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ConvertDeskError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(ConvertDeskError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.short_timeout_secs == 0 || c.long_timeout_secs == 0 {
            return Err(ConvertDeskError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
