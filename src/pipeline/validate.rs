//! File validation and the staged upload selection.
//!
//! Rules run in a fixed order and the first failure wins:
//!
//! 1. extension must match the tool's accepted formats (skipped for wildcard tools)
//! 2. size must be ≤ the tool's limit (equality is accepted)
//! 3. declared MIME type must satisfy the tool's [`MimeRule`](crate::tools::MimeRule)
//!
//! [`validate`] is a pure verdict. Staging is [`UploadSelection::stage`]'s
//! job: multi-file tools append every file that passes and skip those that
//! don't; single-file tools replace the selection only when the new file
//! passes.

use crate::error::{ConvertDeskError, ValidationError};
use crate::tools::{Accepts, ToolDescriptor};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

fn open_error(path: &Path, err: std::io::Error) -> ConvertDeskError {
    match err.kind() {
        ErrorKind::NotFound => ConvertDeskError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => ConvertDeskError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ConvertDeskError::Internal(format!("cannot open '{}': {}", path.display(), err)),
    }
}

/// A user-picked file: where it is and what it claims to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub path: PathBuf,
    /// Display name, normally the path's file name.
    pub name: String,
    pub size: u64,
    /// Declared MIME type, e.g. `application/pdf`.
    pub mime: String,
}

impl FileHandle {
    /// Build a handle from explicit metadata.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        size: u64,
        mime: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size,
            mime: mime.into(),
        }
    }

    /// Open a local file: name from the path, size from metadata, MIME
    /// guessed from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ConvertDeskError> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| open_error(path, e))?;
        let meta = file.metadata().await.map_err(|e| open_error(path, e))?;
        if !meta.is_file() {
            return Err(ConvertDeskError::Internal(format!(
                "'{}' is not a regular file",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self::new(path, name, meta.len(), mime))
    }

    /// Lowercase extension after the last `.`, or the empty string.
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => String::new(),
        }
    }
}

/// Check one file against a tool's acceptance rules.
pub fn validate(file: &FileHandle, tool: &ToolDescriptor) -> Result<(), ValidationError> {
    if let Accepts::Only(formats) = tool.accepts {
        let ext = file.extension();
        if !formats.iter().any(|f| f.matches_extension(&ext)) {
            return Err(ValidationError::FormatMismatch {
                expected: tool.accepts.describe(),
                actual: ext,
            });
        }
    }

    if file.size > tool.max_file_size_bytes {
        return Err(ValidationError::TooLarge {
            size: file.size,
            max: tool.max_file_size_bytes,
        });
    }

    if !tool.mime_rule.allows(&file.mime) {
        return Err(ValidationError::InvalidType {
            mime: file.mime.clone(),
        });
    }

    Ok(())
}

/// Files currently staged for one tool session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSelection {
    files: Vec<FileHandle>,
}

/// Per-file verdicts from one [`UploadSelection::stage`] call.
#[derive(Debug, Default)]
pub struct StageReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<(String, ValidationError)>,
}

impl StageReport {
    pub fn all_accepted(&self) -> bool {
        self.rejected.is_empty()
    }
}

impl UploadSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[FileHandle] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Validate and stage `incoming` for `tool`.
    ///
    /// Multi-file tools validate each file independently and append the ones
    /// that pass. Single-file tools look only at the first incoming file and
    /// replace the selection with it if it passes; on failure the previous
    /// selection is left as it was.
    pub fn stage(&mut self, incoming: Vec<FileHandle>, tool: &ToolDescriptor) -> StageReport {
        let mut report = StageReport::default();

        if tool.allow_multiple {
            for file in incoming {
                match validate(&file, tool) {
                    Ok(()) => {
                        debug!("{}: staged '{}'", tool.id, file.name);
                        report.accepted.push(file.name.clone());
                        self.files.push(file);
                    }
                    Err(e) => {
                        debug!("{}: rejected '{}': {}", tool.id, file.name, e);
                        report.rejected.push((file.name, e));
                    }
                }
            }
        } else if let Some(file) = incoming.into_iter().next() {
            match validate(&file, tool) {
                Ok(()) => {
                    debug!("{}: staged '{}' (replacing selection)", tool.id, file.name);
                    report.accepted.push(file.name.clone());
                    self.files = vec![file];
                }
                Err(e) => {
                    debug!("{}: rejected '{}': {}", tool.id, file.name, e);
                    report.rejected.push((file.name, e));
                }
            }
        }

        report
    }

    /// Remove the file at `index`; out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<FileHandle> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::find_tool;

    fn file(name: &str, size: u64, mime: &str) -> FileHandle {
        FileHandle::new(format!("/tmp/{name}"), name, size, mime)
    }

    #[test]
    fn extension_mismatch_is_rejected_first() {
        let tool = find_tool("pdf-to-docx").unwrap();
        // Oversized too, but the format check runs first.
        let f = file("notes.docx", u64::MAX, "application/pdf");
        assert_eq!(
            validate(&f, tool),
            Err(ValidationError::FormatMismatch {
                expected: "PDF".into(),
                actual: "docx".into()
            })
        );
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let tool = find_tool("pdf-to-docx").unwrap();
        assert!(validate(&file("REPORT.PDF", 10, "application/pdf"), tool).is_ok());
    }

    #[test]
    fn size_limit_accepts_equality() {
        let tool = find_tool("pdf-split").unwrap();
        let max = tool.max_file_size_bytes;
        assert!(validate(&file("a.pdf", max, "application/pdf"), tool).is_ok());
        assert_eq!(
            validate(&file("a.pdf", max + 1, "application/pdf"), tool),
            Err(ValidationError::TooLarge { size: max + 1, max })
        );
    }

    #[test]
    fn size_boundary_holds_for_every_tool() {
        for tool in crate::tools::TOOLS {
            let name = match tool.accepts {
                Accepts::Any => "clip.mp4".to_string(),
                Accepts::Only(formats) => format!("x.{}", formats[0].extension().unwrap()),
            };
            let mime = match tool.mime_rule {
                crate::tools::MimeRule::Unchecked => "application/octet-stream",
                crate::tools::MimeRule::Prefix(_) => "video/mp4",
                crate::tools::MimeRule::Contains(_) => "application/pdf",
                crate::tools::MimeRule::Exact(list) => list[0],
            };
            for size in [0, tool.max_file_size_bytes - 1, tool.max_file_size_bytes] {
                assert!(validate(&file(&name, size, mime), tool).is_ok(), "{}", tool.id);
            }
            assert!(matches!(
                validate(&file(&name, tool.max_file_size_bytes + 1, mime), tool),
                Err(ValidationError::TooLarge { .. })
            ));
        }
    }

    #[test]
    fn video_mime_prefix() {
        let tool = find_tool("video-to-audio").unwrap();
        assert!(validate(&file("clip.mov", 10, "video/quicktime"), tool).is_ok());
        assert_eq!(
            validate(&file("song.mp3", 10, "audio/mpeg"), tool),
            Err(ValidationError::InvalidType {
                mime: "audio/mpeg".into()
            })
        );
    }

    #[test]
    fn background_remover_requires_exact_image_mime() {
        let tool = find_tool("remove-background").unwrap();
        assert!(validate(&file("cat.jpeg", 10, "image/jpeg"), tool).is_ok());
        assert!(matches!(
            validate(&file("cat.png", 10, "image/webp"), tool),
            Err(ValidationError::InvalidType { .. })
        ));
    }

    #[test]
    fn wildcard_tool_accepts_any_extension() {
        let tool = find_tool("create-zip").unwrap();
        assert!(validate(&file("Makefile", 10, "text/plain"), tool).is_ok());
    }

    #[test]
    fn multi_file_stage_appends_and_skips_rejects() {
        let tool = find_tool("pdf-merge").unwrap();
        let mut sel = UploadSelection::new();
        sel.stage(vec![file("a.pdf", 1, "application/pdf")], tool);

        let report = sel.stage(
            vec![
                file("b.pdf", 1, "application/pdf"),
                file("c.txt", 1, "text/plain"),
            ],
            tool,
        );
        assert_eq!(report.accepted, vec!["b.pdf"]);
        assert_eq!(report.rejected.len(), 1);
        let names: Vec<_> = sel.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn single_file_stage_replaces_on_success_only() {
        let tool = find_tool("pdf-to-docx").unwrap();
        let mut sel = UploadSelection::new();
        sel.stage(vec![file("first.pdf", 1, "application/pdf")], tool);

        let report = sel.stage(vec![file("photo.png", 1, "image/png")], tool);
        assert!(!report.all_accepted());
        assert_eq!(sel.files()[0].name, "first.pdf");

        sel.stage(vec![file("second.pdf", 1, "application/pdf")], tool);
        assert_eq!(sel.len(), 1);
        assert_eq!(sel.files()[0].name, "second.pdf");
    }

    #[test]
    fn remove_and_clear() {
        let tool = find_tool("create-zip").unwrap();
        let mut sel = UploadSelection::new();
        sel.stage(
            vec![file("a", 1, "x/y"), file("b", 1, "x/y"), file("c", 1, "x/y")],
            tool,
        );
        assert_eq!(sel.remove(1).map(|f| f.name), Some("b".to_string()));
        assert!(sel.remove(9).is_none());
        assert_eq!(sel.len(), 2);
        sel.clear();
        assert!(sel.is_empty());
    }

    #[test]
    fn from_path_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let handle = tokio_test::block_on(FileHandle::from_path(&path)).unwrap();
        assert_eq!(handle.name, "doc.pdf");
        assert_eq!(handle.size, 8);
        assert_eq!(handle.mime, "application/pdf");
    }

    #[test]
    fn from_path_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pdf");

        let err = tokio_test::block_on(FileHandle::from_path(&path)).unwrap_err();
        assert!(matches!(err, ConvertDeskError::FileNotFound { path: ref p } if *p == path));
    }

    #[test]
    fn open_errors_map_by_kind() {
        let path = Path::new("/in/locked.pdf");
        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        assert!(matches!(
            open_error(path, denied),
            ConvertDeskError::PermissionDenied { path: ref p } if p == path
        ));
        let other = std::io::Error::new(ErrorKind::Other, "disk on fire");
        assert!(matches!(open_error(path, other), ConvertDeskError::Internal(_)));
    }

    #[cfg(unix)]
    #[test]
    fn from_path_reports_unreadable_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();
        // Root ignores file modes.
        if std::fs::File::open(&path).is_ok() {
            return;
        }

        let err = tokio_test::block_on(FileHandle::from_path(&path)).unwrap_err();
        assert!(matches!(err, ConvertDeskError::PermissionDenied { .. }));
    }
}
