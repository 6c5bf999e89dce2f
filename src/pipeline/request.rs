//! Multipart request assembly.
//!
//! [`build`] is pure: it describes the body (field names, order, file paths)
//! without reading anything from disk. The transport turns the description
//! into bytes. Keeping the two apart makes the field layout testable and
//! guarantees identical inputs always produce identical bodies.

use crate::error::ValidationError;
use crate::pipeline::validate::{FileHandle, UploadSelection};
use crate::tools::{FilePart, ToolDescriptor};
use std::path::PathBuf;

/// Files plus caller-supplied scalar parameters for one submit.
#[derive(Debug, Clone, Default)]
pub struct ConversionRequest {
    pub files: Vec<FileHandle>,
    /// Tool parameters, sent in the order given after the tool's fixed params.
    pub scalar_params: Vec<(String, String)>,
}

impl ConversionRequest {
    pub fn new(selection: &UploadSelection) -> Self {
        Self {
            files: selection.files().to_vec(),
            scalar_params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.scalar_params.extend(params);
        self
    }

    /// Name of the first file, used for output naming.
    pub fn primary_name(&self) -> &str {
        self.files.first().map(|f| f.name.as_str()).unwrap_or("file")
    }
}

/// One multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        path: PathBuf,
        file_name: String,
        mime: String,
    },
}

impl FormField {
    pub fn name(&self) -> &str {
        match self {
            FormField::Text { name, .. } | FormField::File { name, .. } => name,
        }
    }
}

/// Ordered description of a multipart body plus request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartBody {
    pub fields: Vec<FormField>,
    pub headers: Vec<(String, String)>,
}

impl MultipartBody {
    pub fn file_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| matches!(f, FormField::File { .. }))
            .count()
    }

    /// Value of the first text field called `name`.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|f| match f {
            FormField::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }
}

/// Assemble the multipart body for `request` against `tool`.
///
/// Layout: file parts first (one for single-file tools, one per staged file
/// under the same field name for multi-file tools), then the tool's fixed
/// parameters, then the caller's parameters.
pub fn build(
    request: &ConversionRequest,
    tool: &ToolDescriptor,
) -> Result<MultipartBody, ValidationError> {
    if request.files.is_empty() {
        return Err(ValidationError::EmptySelection);
    }

    let file_field = |name: &str, f: &FileHandle| FormField::File {
        name: name.to_string(),
        path: f.path.clone(),
        file_name: f.name.clone(),
        mime: f.mime.clone(),
    };

    let mut fields = match tool.file_part {
        FilePart::Single(name) => vec![file_field(name, &request.files[0])],
        FilePart::Repeated(name) => request.files.iter().map(|f| file_field(name, f)).collect(),
    };

    fields.extend(tool.fixed_params.iter().map(|(k, v)| FormField::Text {
        name: k.to_string(),
        value: v.to_string(),
    }));
    fields.extend(
        request
            .scalar_params
            .iter()
            .map(|(k, v)| FormField::Text {
                name: k.clone(),
                value: v.clone(),
            }),
    );

    let headers = tool
        .headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Ok(MultipartBody { fields, headers })
}

/// Output resolution for the video tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoQuality {
    P480,
    #[default]
    P720,
    P1080,
}

/// Frame rate for the video tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoFps {
    F24,
    #[default]
    F30,
    F60,
}

/// Target bitrate for the video tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoBitrate {
    /// 500k
    Low,
    /// 1M
    #[default]
    Medium,
    /// 2M
    High,
    /// 5M
    Ultra,
}

/// Transcode settings for `video-process`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoSettings {
    pub quality: VideoQuality,
    pub fps: VideoFps,
    pub bitrate: VideoBitrate,
}

impl VideoSettings {
    pub fn to_params(&self) -> Vec<(String, String)> {
        let quality = match self.quality {
            VideoQuality::P480 => "480",
            VideoQuality::P720 => "720",
            VideoQuality::P1080 => "1080",
        };
        let fps = match self.fps {
            VideoFps::F24 => "24",
            VideoFps::F30 => "30",
            VideoFps::F60 => "60",
        };
        let bitrate = match self.bitrate {
            VideoBitrate::Low => "500k",
            VideoBitrate::Medium => "1M",
            VideoBitrate::High => "2M",
            VideoBitrate::Ultra => "5M",
        };
        vec![
            ("quality".to_string(), quality.to_string()),
            ("fps".to_string(), fps.to_string()),
            ("bitrate".to_string(), bitrate.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pages::{PageRangeSpec, SplitOptions};
    use crate::tools::find_tool;

    fn handle(name: &str, mime: &str) -> FileHandle {
        FileHandle::new(format!("/data/{name}"), name, 100, mime)
    }

    fn field_names(body: &MultipartBody) -> Vec<&str> {
        body.fields.iter().map(|f| f.name()).collect()
    }

    #[test]
    fn empty_request_is_rejected() {
        let tool = find_tool("pdf-to-docx").unwrap();
        let err = build(&ConversionRequest::default(), tool).unwrap_err();
        assert_eq!(err, ValidationError::EmptySelection);
    }

    #[test]
    fn single_conversion_sends_file_and_format_pair() {
        let tool = find_tool("png-to-jpg").unwrap();
        let request = ConversionRequest {
            files: vec![handle("a.png", "image/png"), handle("b.png", "image/png")],
            scalar_params: vec![],
        };
        let body = build(&request, tool).unwrap();

        assert_eq!(field_names(&body), vec!["file", "fromFormat", "toFormat"]);
        assert_eq!(body.file_count(), 1);
        assert_eq!(body.text("fromFormat"), Some("PNG"));
        assert_eq!(body.text("toFormat"), Some("JPG"));
        assert!(body.headers.is_empty());
    }

    #[test]
    fn archive_mode_repeats_file_field_and_sets_header() {
        let tool = find_tool("create-zip").unwrap();
        let request = ConversionRequest {
            files: vec![handle("a.txt", "text/plain"), handle("b.csv", "text/csv")],
            scalar_params: vec![],
        };
        let body = build(&request, tool).unwrap();

        assert_eq!(
            field_names(&body),
            vec!["Files", "Files", "fromFormat", "toFormat"]
        );
        assert_eq!(
            body.headers,
            vec![("X-Conversion-Type".to_string(), "zip".to_string())]
        );
    }

    #[test]
    fn split_sends_both_page_fields() {
        let tool = find_tool("pdf-split").unwrap();
        let spec = PageRangeSpec::parse("2-3").unwrap();
        let request = ConversionRequest {
            files: vec![handle("book.pdf", "application/pdf")],
            scalar_params: vec![],
        }
        .with_params(SplitOptions::Range(spec).to_params());
        let body = build(&request, tool).unwrap();

        assert_eq!(
            field_names(&body),
            vec!["file", "splitPage", "splitRange", "mode"]
        );
        assert_eq!(body.text("splitPage"), Some("0"));
        assert_eq!(body.text("splitRange"), Some("2-3"));
    }

    #[test]
    fn video_settings_defaults() {
        let params = VideoSettings::default().to_params();
        assert_eq!(
            params,
            vec![
                ("quality".to_string(), "720".to_string()),
                ("fps".to_string(), "30".to_string()),
                ("bitrate".to_string(), "1M".to_string()),
            ]
        );
    }

    #[test]
    fn build_is_deterministic() {
        let tool = find_tool("pdf-merge").unwrap();
        let request = ConversionRequest {
            files: vec![
                handle("a.pdf", "application/pdf"),
                handle("b.pdf", "application/pdf"),
            ],
            scalar_params: vec![("k".into(), "v".into())],
        };
        assert_eq!(build(&request, tool).unwrap(), build(&request, tool).unwrap());
    }
}
