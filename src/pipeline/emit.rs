//! Artifact emission: classified success → one or more saved files.
//!
//! The save itself goes through an [`ArtifactSink`], so a GUI can offer a
//! "save as" dialog while the CLI writes into a directory.

use crate::error::ConvertDeskError;
use crate::outcome::{ConversionOutcome, SavedArtifact};
use crate::progress::SubmissionProgressCallback;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Destination for finished artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Save `bytes` under (roughly) `name` and report where it went.
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<SavedArtifact, ConvertDeskError>;
}

/// Saves into a directory with browser-style download semantics: existing
/// files are never overwritten; `a.pdf` becomes `a (1).pdf`, `a (2).pdf`, ...
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn free_path(&self, name: &str) -> PathBuf {
        let candidate = self.dir.join(name);
        if !exists(&candidate).await {
            return candidate;
        }
        let (base, ext) = match name.rsplit_once('.') {
            Some((b, e)) if !b.is_empty() => (b, Some(e)),
            _ => (name, None),
        };
        let mut n = 1u32;
        loop {
            let next = match ext {
                Some(e) => format!("{base} ({n}).{e}"),
                None => format!("{base} ({n})"),
            };
            let path = self.dir.join(next);
            if !exists(&path).await {
                return path;
            }
            n += 1;
        }
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Strip any directory components from a server-declared name.
fn safe_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("download")
        .to_string()
}

/// Write to a `.{name}.part` sibling, then rename over `path`. The temp file
/// never outlives a failed rename.
async fn write_atomic(path: &Path, name: &str, bytes: &[u8]) -> Result<(), ConvertDeskError> {
    let tmp_path = path.with_file_name(format!(".{name}.part"));
    let failed = |e| ConvertDeskError::SaveFailed {
        path: path.to_path_buf(),
        source: e,
    };
    tokio::fs::write(&tmp_path, bytes).await.map_err(failed)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(failed(e));
    }
    Ok(())
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<SavedArtifact, ConvertDeskError> {
        let name = safe_file_name(name);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ConvertDeskError::SaveFailed {
                path: self.dir.clone(),
                source: e,
            })?;

        let path = self.free_path(&name).await;
        write_atomic(&path, &name, bytes).await?;

        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(SavedArtifact {
            name,
            path,
            size: bytes.len() as u64,
        })
    }
}

/// Save every artifact of a successful outcome, in order.
///
/// Each save is reported to `progress` as soon as it lands, so a batch that
/// fails halfway has still announced the files it did write.
/// `ErrorResult` saves nothing and comes back as [`ConvertDeskError::Server`]
/// for display.
pub async fn emit(
    outcome: ConversionOutcome,
    sink: &dyn ArtifactSink,
    progress: Option<&dyn SubmissionProgressCallback>,
) -> Result<Vec<SavedArtifact>, ConvertDeskError> {
    let record = |artifact: &SavedArtifact| {
        info!("Saved {}", artifact.path.display());
        if let Some(cb) = progress {
            cb.on_artifact_saved(&artifact.name, artifact.size);
        }
    };

    match outcome {
        ConversionOutcome::SingleBinary {
            bytes,
            suggested_name,
        } => {
            let saved = sink.save(&suggested_name, &bytes).await?;
            record(&saved);
            Ok(vec![saved])
        }
        ConversionOutcome::BatchBinary { items } => {
            let total = items.len();
            let mut saved = Vec::with_capacity(total);
            for item in items {
                match sink.save(&item.name, &item.bytes).await {
                    Ok(artifact) => {
                        record(&artifact);
                        saved.push(artifact);
                    }
                    Err(e) => {
                        warn!("Batch stopped after {} of {} artifacts", saved.len(), total);
                        return Err(e);
                    }
                }
            }
            Ok(saved)
        }
        ConversionOutcome::ErrorResult(e) => Err(ConvertDeskError::Server(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{BatchItem, ErrorCode, ErrorResult};
    use std::sync::Mutex;

    /// Accepts `capacity` saves, then fails every later one.
    struct FullDiskSink {
        inner: DirectorySink,
        capacity: usize,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ArtifactSink for FullDiskSink {
        async fn save(&self, name: &str, bytes: &[u8]) -> Result<SavedArtifact, ConvertDeskError> {
            let n = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if n > self.capacity {
                return Err(ConvertDeskError::SaveFailed {
                    path: self.inner.dir().join(name),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.inner.save(name, bytes).await
        }
    }

    #[derive(Default)]
    struct SavedNames(Mutex<Vec<String>>);

    impl SubmissionProgressCallback for SavedNames {
        fn on_artifact_saved(&self, name: &str, _size: u64) {
            self.0.lock().unwrap().push(name.to_string());
        }
    }

    #[test]
    fn safe_file_name_drops_directories() {
        assert_eq!(safe_file_name("../../etc/passwd"), "passwd");
        assert_eq!(safe_file_name("p1.jpg"), "p1.jpg");
        assert_eq!(safe_file_name(""), "download");
        assert_eq!(safe_file_name(".."), "download");
    }

    #[tokio::test]
    async fn single_binary_saves_once() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        let saved = emit(
            ConversionOutcome::SingleBinary {
                bytes: b"%PDF".to_vec(),
                suggested_name: "merged.pdf".into(),
            },
            &sink,
            None,
        )
        .await
        .unwrap();

        assert_eq!(saved.len(), 1);
        assert_eq!(std::fs::read(dir.path().join("merged.pdf")).unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn collisions_get_numbered_names() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        std::fs::write(dir.path().join("archive.zip"), b"old").unwrap();

        let first = sink.save("archive.zip", b"new1").await.unwrap();
        let second = sink.save("archive.zip", b"new2").await.unwrap();

        assert_eq!(first.path, dir.path().join("archive (1).zip"));
        assert_eq!(second.path, dir.path().join("archive (2).zip"));
        assert_eq!(std::fs::read(dir.path().join("archive.zip")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn batch_preserves_server_order() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        let items = ["p3.jpg", "p1.jpg", "p2.jpg"]
            .iter()
            .map(|n| BatchItem {
                name: n.to_string(),
                bytes: n.as_bytes().to_vec(),
            })
            .collect();

        let saved = emit(ConversionOutcome::BatchBinary { items }, &sink, None)
            .await
            .unwrap();
        let names: Vec<_> = saved.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["p3.jpg", "p1.jpg", "p2.jpg"]);
    }

    #[tokio::test]
    async fn error_result_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        let err = emit(
            ConversionOutcome::ErrorResult(ErrorResult {
                code: ErrorCode::ServerReported,
                status: Some(500),
                message: "bad file".into(),
                detail: None,
            }),
            &sink,
            None,
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "bad file");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn batch_failure_still_reports_earlier_saves() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FullDiskSink {
            inner: DirectorySink::new(dir.path()),
            capacity: 1,
            calls: Mutex::new(0),
        };
        let items = ["p1.jpg", "p2.jpg", "p3.jpg"]
            .iter()
            .map(|n| BatchItem {
                name: n.to_string(),
                bytes: b"jpg".to_vec(),
            })
            .collect();
        let names = SavedNames::default();
        let progress: &dyn SubmissionProgressCallback = &names;

        let err = emit(ConversionOutcome::BatchBinary { items }, &sink, Some(progress))
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertDeskError::SaveFailed { .. }));
        assert_eq!(*names.0.lock().unwrap(), vec!["p1.jpg"]);
        assert!(dir.path().join("p1.jpg").exists());
    }

    #[tokio::test]
    async fn failed_rename_removes_the_part_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory in the way makes the rename fail.
        let target = dir.path().join("out.pdf");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let err = write_atomic(&target, "out.pdf", b"%PDF").await.unwrap_err();

        assert!(matches!(err, ConvertDeskError::SaveFailed { ref path, .. } if *path == target));
        assert!(!dir.path().join(".out.pdf.part").exists());
    }
}
