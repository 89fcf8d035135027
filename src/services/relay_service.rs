use crate::services::media_host::{MediaHost, UploadOptions};
use crate::services::staging::StagedFile;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Public reference to an image now held by the provider
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct RelayedImage {
    pub public_id: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct FailedRelay {
    pub filename: String,
    pub error: String,
}

/// Per-file result of a relay. Serialized without a tag, so a response
/// array mixes `{public_id, url}` and `{filename, error}` objects.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum RelayOutcome {
    Uploaded(RelayedImage),
    Failed(FailedRelay),
}

impl RelayOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, RelayOutcome::Uploaded(_))
    }
}

pub struct RelayService {
    host: Arc<dyn MediaHost>,
    folder: String,
}

impl RelayService {
    pub fn new(host: Arc<dyn MediaHost>, folder: impl Into<String>) -> Self {
        Self {
            host,
            folder: folder.into(),
        }
    }

    pub fn host(&self) -> &dyn MediaHost {
        self.host.as_ref()
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Forward one staged file to the provider.
    ///
    /// Provider failures are logged and turned into [`RelayOutcome::Failed`];
    /// they never propagate. The staged file is removed on every path.
    pub async fn relay(&self, staged: StagedFile) -> RelayOutcome {
        let options = UploadOptions::public_auto(self.folder.as_str());
        let result = self
            .host
            .upload(staged.path(), staged.filename(), &options)
            .await;

        let filename = staged.filename().to_string();
        staged.remove().await;

        match result {
            Ok(hosted) => {
                tracing::info!("☁️  Relayed {} as {}", filename, hosted.public_id);
                RelayOutcome::Uploaded(RelayedImage {
                    public_id: hosted.public_id,
                    url: hosted.secure_url,
                })
            }
            Err(e) => {
                tracing::error!(
                    "{} upload error for {}: {}",
                    self.host.provider_id(),
                    filename,
                    e
                );
                RelayOutcome::Failed(FailedRelay {
                    filename,
                    error: e.to_string(),
                })
            }
        }
    }

    /// Relay every file concurrently and wait for all of them.
    /// Outcomes are returned in input order.
    pub async fn relay_all(&self, files: Vec<StagedFile>) -> Vec<RelayOutcome> {
        join_all(files.into_iter().map(|f| self.relay(f))).await
    }
}
