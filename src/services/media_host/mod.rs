use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub mod cloudinary;

pub use cloudinary::CloudinaryClient;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to read staged file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected provider response: {0}")]
    Malformed(String),
}

/// Options sent with every upload call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub folder: String,
    pub resource_type: &'static str,
    pub access_mode: &'static str,
}

impl UploadOptions {
    /// Publicly readable asset with the resource type detected by the provider
    pub fn public_auto(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            resource_type: "auto",
            access_mode: "public",
        }
    }
}

/// Subset of the provider's upload response that the relay exposes
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HostedImage {
    pub public_id: String,
    pub secure_url: String,
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Provider identifier (e.g., "cloudinary")
    fn provider_id(&self) -> &'static str;

    /// Account the uploads land in, reported by the health endpoint
    fn account(&self) -> &str;

    /// Upload the local file at `path`, presenting it to the provider as `filename`
    async fn upload(
        &self,
        path: &Path,
        filename: &str,
        options: &UploadOptions,
    ) -> Result<HostedImage, ProviderError>;
}
