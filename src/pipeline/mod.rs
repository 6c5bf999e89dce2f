//! Pipeline stages for one tool submission.
//!
//! Each submodule implements exactly one step, so the pure stages (validation,
//! page ranges, request layout, classification) are testable without a server.
//!
//! ## Data Flow
//!
//! ```text
//! validate ──▶ request ──▶ transport ──▶ classify ──▶ emit
//! (rules)      (layout)    (HTTP)        (sniff)      (save)
//! ```
//!
//! 1. [`validate`]   extension, size and MIME checks; the staged selection
//! 2. [`pages`]      page-range grammar for the split tool
//! 3. [`request`]    pure multipart layout from files and parameters
//! 4. [`transport`]  the only stage with network I/O; buffers the whole body
//! 5. [`classify`]   content-type driven choice of outcome shape
//! 6. [`emit`]       writes artifacts through an [`emit::ArtifactSink`]

pub mod classify;
pub mod emit;
pub mod pages;
pub mod request;
pub mod transport;
pub mod validate;
