//! Per-request scratch files and bounded blocking work

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::{Body, Bytes};
use futures::Stream;
use lopdf::Document;
use tempfile::NamedTempFile;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::ApiError;

/// Directory holding staged response artifacts
#[derive(Debug)]
pub struct Scratch {
    dir: PathBuf,
}

impl Scratch {
    /// Use `dir`, or a `pdfops` directory under the system temp dir.
    pub fn new(dir: Option<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.unwrap_or_else(|| std::env::temp_dir().join("pdfops"));
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serialize `doc` into a fresh, uniquely named file.
    pub fn stage(&self, doc: &mut Document) -> Result<StagedArtifact, ApiError> {
        let mut file = tempfile::Builder::new()
            .prefix("pdfops-")
            .suffix(".pdf")
            .tempfile_in(&self.dir)
            .map_err(|e| ApiError::Internal(format!("Failed to create scratch file: {}", e)))?;

        {
            let mut writer = BufWriter::new(file.as_file_mut());
            pdfops_core::write_document(doc, &mut writer)
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            writer
                .flush()
                .map_err(|e| ApiError::Internal(format!("Failed to write scratch file: {}", e)))?;
        }

        let len = file
            .as_file()
            .metadata()
            .map_err(|e| ApiError::Internal(format!("Failed to stat scratch file: {}", e)))?
            .len();

        debug!(path = %file.path().display(), len, "Staged artifact");
        Ok(StagedArtifact { file, len })
    }
}

/// A serialized PDF waiting to be sent; the file is removed on drop
#[derive(Debug)]
pub struct StagedArtifact {
    file: NamedTempFile,
    len: u64,
}

impl StagedArtifact {
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Stream the file as a response body. The file lives until the body is
    /// dropped.
    pub fn into_body(self) -> Result<Body, ApiError> {
        let reader = self
            .file
            .reopen()
            .map_err(|e| ApiError::Internal(format!("Failed to reopen scratch file: {}", e)))?;

        Ok(Body::from_stream(StagedStream {
            inner: ReaderStream::new(tokio::fs::File::from_std(reader)),
            _file: self.file,
        }))
    }
}

struct StagedStream {
    inner: ReaderStream<tokio::fs::File>,
    _file: NamedTempFile,
}

impl Stream for StagedStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Run `job` on the blocking pool, giving up after `timeout_ms`.
pub async fn run_blocking<T, F>(timeout_ms: u64, job: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        tokio::task::spawn_blocking(job),
    )
    .await;

    match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Err(ApiError::Internal(format!(
            "Processing task panicked: {}",
            join_error
        ))),
        Err(_timeout) => Err(ApiError::Timeout(timeout_ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use pdfops_core::fixtures::sample_document;

    fn scratch_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_stage_writes_loadable_pdf() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = Scratch::new(Some(tmp.path().to_path_buf())).unwrap();

        let mut doc = sample_document(2, "Stage");
        let artifact = scratch.stage(&mut doc).unwrap();

        let bytes = std::fs::read(artifact.file.path()).unwrap();
        assert_eq!(bytes.len() as u64, artifact.len());
        assert_eq!(pdfops_core::page_count(&bytes).unwrap(), 2);
    }

    #[test]
    fn test_dropped_artifact_is_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = Scratch::new(Some(tmp.path().to_path_buf())).unwrap();

        let artifact = scratch.stage(&mut sample_document(1, "Drop")).unwrap();
        assert_eq!(scratch_entries(scratch.dir()), 1);

        drop(artifact);
        assert_eq!(scratch_entries(scratch.dir()), 0);
    }

    #[tokio::test]
    async fn test_body_streams_file_then_removes_it() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = Scratch::new(Some(tmp.path().to_path_buf())).unwrap();

        let artifact = scratch.stage(&mut sample_document(3, "Body")).unwrap();
        let len = artifact.len();
        let body = artifact.into_body().unwrap();

        let mut stream = body.into_data_stream();
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        drop(stream);

        assert_eq!(collected.len() as u64, len);
        assert_eq!(pdfops_core::page_count(&collected).unwrap(), 3);
        assert_eq!(scratch_entries(scratch.dir()), 0);
    }

    #[tokio::test]
    async fn test_run_blocking_returns_job_result() {
        let value = run_blocking(1_000, || Ok::<_, ApiError>(42)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_run_blocking_times_out() {
        let result = run_blocking(10, || {
            std::thread::sleep(Duration::from_millis(300));
            Ok::<_, ApiError>(())
        })
        .await;

        assert!(matches!(result, Err(ApiError::Timeout(10))));
    }
}
