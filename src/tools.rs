//! The tool table: one immutable [`ToolDescriptor`] per conversion screen.
//!
//! Every per-tool difference (accepted input, size limit, endpoint, field
//! names, output naming, timeout class) lives here as data. The validator,
//! request builder, classifier and emitter are generic over a descriptor, so
//! adding a tool means adding a row to [`TOOLS`] and nothing else.

use crate::error::ConvertDeskError;
use serde::Serialize;
use std::fmt;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// File format tag with a canonical extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Format {
    Jpg,
    Png,
    Webp,
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    Zip,
    Mp4,
    Mp3,
    Txt,
    /// Any file at all (archive creation input).
    Files,
}

impl Format {
    /// Canonical extension without the dot. `None` for [`Format::Files`].
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Format::Jpg => Some("jpg"),
            Format::Png => Some("png"),
            Format::Webp => Some("webp"),
            Format::Pdf => Some("pdf"),
            Format::Docx => Some("docx"),
            Format::Pptx => Some("pptx"),
            Format::Xlsx => Some("xlsx"),
            Format::Zip => Some("zip"),
            Format::Mp4 => Some("mp4"),
            Format::Mp3 => Some("mp3"),
            Format::Txt => Some("txt"),
            Format::Files => None,
        }
    }

    /// Whether `ext` (lowercase, no dot) names this format.
    pub fn matches_extension(self, ext: &str) -> bool {
        match self {
            Format::Jpg => ext == "jpg" || ext == "jpeg",
            Format::Files => true,
            other => other.extension() == Some(ext),
        }
    }

    /// Upper-case tag as the server expects it in `fromFormat` / `toFormat`.
    pub fn tag(self) -> &'static str {
        match self {
            Format::Jpg => "JPG",
            Format::Png => "PNG",
            Format::Webp => "WEBP",
            Format::Pdf => "PDF",
            Format::Docx => "DOCX",
            Format::Pptx => "PPTX",
            Format::Xlsx => "XLSX",
            Format::Zip => "ZIP",
            Format::Mp4 => "MP4",
            Format::Mp3 => "MP3",
            Format::Txt => "TXT",
            Format::Files => "FILES",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Which file extensions a tool accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepts {
    /// Wildcard: no extension check.
    Any,
    /// The extension must match one of these formats.
    Only(&'static [Format]),
}

impl Accepts {
    /// Human-readable list used in format-mismatch messages, e.g. `JPG or PNG`.
    pub fn describe(&self) -> String {
        match self {
            Accepts::Any => "any".to_string(),
            Accepts::Only(formats) => formats
                .iter()
                .map(|f| f.tag())
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

/// Declared-MIME check applied after the extension and size checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeRule {
    /// Tool does not look at the MIME type.
    Unchecked,
    /// MIME must start with this prefix (`video/`).
    Prefix(&'static str),
    /// MIME must contain this substring (`pdf`).
    Contains(&'static str),
    /// MIME must equal one of these.
    Exact(&'static [&'static str]),
}

impl MimeRule {
    pub fn allows(&self, mime: &str) -> bool {
        let mime = mime.trim().to_ascii_lowercase();
        match self {
            MimeRule::Unchecked => true,
            MimeRule::Prefix(p) => mime.starts_with(p),
            MimeRule::Contains(s) => mime.contains(s),
            MimeRule::Exact(list) => list.iter().any(|m| *m == mime),
        }
    }
}

/// How files are placed into the multipart body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePart {
    /// One file under this field name; only the first staged file is sent.
    Single(&'static str),
    /// Every staged file, each under this same field name.
    Repeated(&'static str),
}

impl FilePart {
    pub fn field_name(&self) -> &'static str {
        match self {
            FilePart::Single(name) | FilePart::Repeated(name) => name,
        }
    }
}

/// Client-side naming for single-artifact responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputNaming {
    /// `<original-stem>.<output extension>`.
    Stem,
    /// `<prefix><original-stem>.<output extension>`.
    PrefixedStem(&'static str),
    /// Always the same name.
    Fixed(&'static str),
}

/// Timeout class; the actual durations come from [`crate::ClientConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutClass {
    /// Image, document and text operations.
    Short,
    /// Video operations, measured in minutes.
    Long,
}

/// Immutable per-tool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub accepts: Accepts,
    pub mime_rule: MimeRule,
    /// Value sent as `fromFormat` for `/api/convert` tools.
    pub input_format: Format,
    pub output_format: Format,
    pub allow_multiple: bool,
    pub max_file_size_bytes: u64,
    /// Path relative to the configured base URL.
    pub endpoint: &'static str,
    pub file_part: FilePart,
    /// Scalar fields sent on every request, before caller parameters.
    pub fixed_params: &'static [(&'static str, &'static str)],
    pub headers: &'static [(&'static str, &'static str)],
    pub naming: OutputNaming,
    pub timeout: TimeoutClass,
    /// Clear the selection after a successful submit.
    pub clear_on_success: bool,
    /// Message used when the server error carries no usable text.
    pub fallback_error: &'static str,
}

impl ToolDescriptor {
    /// Suggested name for a single artifact produced from `original_name`.
    pub fn output_name(&self, original_name: &str) -> String {
        let ext = self.output_format.extension().unwrap_or("bin");
        match self.naming {
            OutputNaming::Fixed(name) => name.to_string(),
            OutputNaming::Stem => format!("{}.{}", stem(original_name), ext),
            OutputNaming::PrefixedStem(prefix) => {
                format!("{}{}.{}", prefix, stem(original_name), ext)
            }
        }
    }
}

/// Everything before the first `.`; `file` when that is empty.
pub fn stem(name: &str) -> &str {
    match name.split('.').next() {
        Some(s) if !s.is_empty() => s,
        _ => "file",
    }
}

const IMAGE_MIMES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];
const OCR_MIMES: &[&str] = &["image/jpeg", "image/png"];
const CONVERT_FALLBACK: &str = "Conversion failed";

macro_rules! convert_tool {
    ($id:expr, $title:expr, $from:expr, $to:expr, $from_tag:expr, $to_tag:expr) => {
        ToolDescriptor {
            id: $id,
            title: $title,
            accepts: Accepts::Only(&[$from]),
            mime_rule: MimeRule::Unchecked,
            input_format: $from,
            output_format: $to,
            allow_multiple: false,
            max_file_size_bytes: 50 * MIB,
            endpoint: "/api/convert",
            file_part: FilePart::Single("file"),
            fixed_params: &[("fromFormat", $from_tag), ("toFormat", $to_tag)],
            headers: &[],
            naming: OutputNaming::Stem,
            timeout: TimeoutClass::Short,
            clear_on_success: true,
            fallback_error: CONVERT_FALLBACK,
        }
    };
}

/// Every tool the client knows about.
pub static TOOLS: &[ToolDescriptor] = &[
    convert_tool!("pdf-to-docx", "PDF to DOCX", Format::Pdf, Format::Docx, "PDF", "DOCX"),
    convert_tool!("pdf-to-pptx", "PDF to PPTX", Format::Pdf, Format::Pptx, "PDF", "PPTX"),
    convert_tool!("pdf-to-excel", "PDF to Excel", Format::Pdf, Format::Xlsx, "PDF", "XLSX"),
    convert_tool!("docx-to-pdf", "DOCX to PDF", Format::Docx, Format::Pdf, "DOCX", "PDF"),
    convert_tool!("pptx-to-pdf", "PowerPoint to PDF", Format::Pptx, Format::Pdf, "PPTX", "PDF"),
    convert_tool!("excel-to-pdf", "Excel to PDF", Format::Xlsx, Format::Pdf, "XLSX", "PDF"),
    convert_tool!("pdf-to-jpg", "PDF to JPG", Format::Pdf, Format::Jpg, "PDF", "JPG"),
    convert_tool!("jpg-to-png", "JPG to PNG", Format::Jpg, Format::Png, "JPG", "PNG"),
    convert_tool!("png-to-jpg", "PNG to JPG", Format::Png, Format::Jpg, "PNG", "JPG"),
    convert_tool!("webp-to-jpg", "WebP to JPG", Format::Webp, Format::Jpg, "WEBP", "JPG"),
    convert_tool!("webp-to-png", "WebP to PNG", Format::Webp, Format::Png, "WEBP", "PNG"),
    ToolDescriptor {
        id: "create-zip",
        title: "Create ZIP Archive",
        accepts: Accepts::Any,
        mime_rule: MimeRule::Unchecked,
        input_format: Format::Files,
        output_format: Format::Zip,
        allow_multiple: true,
        max_file_size_bytes: 50 * MIB,
        endpoint: "/api/convert",
        file_part: FilePart::Repeated("Files"),
        fixed_params: &[("fromFormat", "FILES"), ("toFormat", "ZIP")],
        headers: &[("X-Conversion-Type", "zip")],
        naming: OutputNaming::Fixed("archive.zip"),
        timeout: TimeoutClass::Short,
        clear_on_success: false,
        fallback_error: CONVERT_FALLBACK,
    },
    ToolDescriptor {
        id: "remove-background",
        title: "Background Remover",
        accepts: Accepts::Only(&[Format::Jpg, Format::Png]),
        mime_rule: MimeRule::Exact(IMAGE_MIMES),
        input_format: Format::Jpg,
        output_format: Format::Png,
        allow_multiple: false,
        max_file_size_bytes: 5 * MIB,
        endpoint: "/api/remove-background",
        file_part: FilePart::Single("image"),
        fixed_params: &[],
        headers: &[],
        naming: OutputNaming::Fixed("removed-background.png"),
        timeout: TimeoutClass::Short,
        clear_on_success: true,
        fallback_error: "Error processing image. Please try again.",
    },
    ToolDescriptor {
        id: "extract-text",
        title: "Text Extractor",
        accepts: Accepts::Only(&[Format::Jpg, Format::Png]),
        mime_rule: MimeRule::Exact(OCR_MIMES),
        input_format: Format::Jpg,
        output_format: Format::Txt,
        allow_multiple: false,
        max_file_size_bytes: 500 * KIB,
        endpoint: "/api/text-extractor/extract-text",
        file_part: FilePart::Single("file"),
        fixed_params: &[],
        headers: &[],
        naming: OutputNaming::Stem,
        timeout: TimeoutClass::Short,
        clear_on_success: true,
        fallback_error: "Error processing image",
    },
    ToolDescriptor {
        id: "pdf-merge",
        title: "Merge PDF",
        accepts: Accepts::Only(&[Format::Pdf]),
        mime_rule: MimeRule::Contains("pdf"),
        input_format: Format::Pdf,
        output_format: Format::Pdf,
        allow_multiple: true,
        max_file_size_bytes: 10 * MIB,
        endpoint: "/api/pdf/merge",
        file_part: FilePart::Repeated("files"),
        fixed_params: &[],
        headers: &[],
        naming: OutputNaming::Fixed("merged.pdf"),
        timeout: TimeoutClass::Short,
        clear_on_success: true,
        fallback_error: "Failed to merge PDFs. Please try again.",
    },
    ToolDescriptor {
        id: "pdf-split",
        title: "Split PDF",
        accepts: Accepts::Only(&[Format::Pdf]),
        mime_rule: MimeRule::Contains("pdf"),
        input_format: Format::Pdf,
        output_format: Format::Zip,
        allow_multiple: false,
        max_file_size_bytes: 10 * MIB,
        endpoint: "/api/pdf/split",
        file_part: FilePart::Single("file"),
        fixed_params: &[],
        headers: &[],
        naming: OutputNaming::PrefixedStem("split_"),
        timeout: TimeoutClass::Short,
        clear_on_success: true,
        fallback_error: "Failed to split PDF. Please try again.",
    },
    ToolDescriptor {
        id: "video-process",
        title: "Video Editor",
        accepts: Accepts::Any,
        mime_rule: MimeRule::Prefix("video/"),
        input_format: Format::Mp4,
        output_format: Format::Mp4,
        allow_multiple: false,
        max_file_size_bytes: 500 * MIB,
        endpoint: "/api/video/process-video",
        file_part: FilePart::Single("video"),
        fixed_params: &[],
        headers: &[],
        naming: OutputNaming::Fixed("processed-video.mp4"),
        timeout: TimeoutClass::Long,
        clear_on_success: true,
        fallback_error: "Error processing video. Please try again.",
    },
    ToolDescriptor {
        id: "video-to-audio",
        title: "Video to Audio",
        accepts: Accepts::Any,
        mime_rule: MimeRule::Prefix("video/"),
        input_format: Format::Mp4,
        output_format: Format::Mp3,
        allow_multiple: false,
        max_file_size_bytes: 500 * MIB,
        endpoint: "/api/video/extract-audio",
        file_part: FilePart::Single("video"),
        fixed_params: &[],
        headers: &[],
        naming: OutputNaming::Fixed("extracted-audio.mp3"),
        timeout: TimeoutClass::Long,
        clear_on_success: true,
        fallback_error: "Error extracting audio. Please try again.",
    },
];

/// Look up a tool by id.
pub fn find_tool(id: &str) -> Result<&'static ToolDescriptor, ConvertDeskError> {
    TOOLS
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| ConvertDeskError::UnknownTool { id: id.to_string() })
}
