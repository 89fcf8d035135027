use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::utils::validation::staging_extension;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Staging I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File '{filename}' exceeds the {limit} byte limit")]
    TooLarge { filename: String, limit: usize },

    #[error("Request body exceeds the maximum allowed limit")]
    BodyTooLarge,

    #[error("Upload stream error: {0}")]
    Stream(String),
}

impl From<MultipartError> for StagingError {
    fn from(err: MultipartError) -> Self {
        // Display only says the body could not be parsed; the status carries the limit hit.
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            StagingError::BodyTooLarge
        } else {
            StagingError::Stream(err.body_text())
        }
    }
}

/// One multipart file written to the staging directory.
///
/// The file on disk is removed exactly once: either through [`StagedFile::remove`]
/// or, if the value is dropped first, by the `Drop` impl.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    filename: String,
    content_type: Option<String>,
    size: u64,
    removed: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!("Removed staged file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove staged file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove abandoned staged file {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// Local directory that buffers multipart files for the duration of a request
pub struct StagingArea {
    dir: PathBuf,
    max_file_size: usize,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>, max_file_size: usize) -> Self {
        Self {
            dir: dir.into(),
            max_file_size,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Stream `body` to a uniquely named file under the staging directory.
    pub async fn stage<S, E>(
        &self,
        filename: &str,
        content_type: Option<&str>,
        body: S,
    ) -> Result<StagedFile, StagingError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<StagingError>,
    {
        let name = match staging_extension(filename) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        let path = self.dir.join(name);
        let mut out = tokio::fs::File::create(&path).await?;
        // Guard first, so every early return below unlinks the partial file.
        let mut staged = StagedFile {
            path,
            filename: filename.to_string(),
            content_type: content_type.map(str::to_string),
            size: 0,
            removed: false,
        };

        let mut body = std::pin::pin!(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(Into::into)?;
            staged.size += chunk.len() as u64;
            if staged.size > self.max_file_size as u64 {
                return Err(StagingError::TooLarge {
                    filename: filename.to_string(),
                    limit: self.max_file_size,
                });
            }
            out.write_all(&chunk).await?;
        }
        out.flush().await?;

        tracing::debug!(
            "Staged {} ({} bytes) at {}",
            staged.filename,
            staged.size,
            staged.path.display()
        );
        Ok(staged)
    }
}
