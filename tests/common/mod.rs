#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request};
use image_relay::config::RelayConfig;
use image_relay::services::media_host::{HostedImage, MediaHost, ProviderError, UploadOptions};
use image_relay::services::relay_service::RelayService;
use image_relay::services::staging::StagingArea;
use image_relay::{AppState, create_app};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub filename: String,
    pub folder: String,
    pub staged_path: std::path::PathBuf,
    pub staged_existed: bool,
    pub content: Vec<u8>,
}

/// Stand-in provider. Files whose name starts with "fail" are rejected.
pub struct MockMediaHost {
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl MockMediaHost {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaHost for MockMediaHost {
    fn provider_id(&self) -> &'static str {
        "mock"
    }

    fn account(&self) -> &str {
        "test-cloud"
    }

    async fn upload(
        &self,
        path: &Path,
        filename: &str,
        options: &UploadOptions,
    ) -> Result<HostedImage, ProviderError> {
        let content = tokio::fs::read(path).await.unwrap_or_default();
        self.calls.lock().unwrap().push(RecordedCall {
            filename: filename.to_string(),
            folder: options.folder.clone(),
            staged_path: path.to_path_buf(),
            staged_existed: path.exists(),
            content,
        });

        if filename.starts_with("fail") {
            return Err(ProviderError::Rejected {
                status: 400,
                message: "Invalid image file".to_string(),
            });
        }

        Ok(HostedImage {
            public_id: format!("{}/{}", options.folder, filename),
            secure_url: format!("https://res.cloudinary.test/{}/{}", options.folder, filename),
        })
    }
}

pub struct TestApp {
    pub app: Router,
    pub host: Arc<MockMediaHost>,
    pub staging_dir: TempDir,
    pub static_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(tweak: impl FnOnce(&mut RelayConfig)) -> Self {
        let _ = tracing_subscriber::fmt::try_init();

        let staging_dir = tempfile::tempdir().unwrap();
        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            static_dir.path().join("index.html"),
            "<!doctype html><div id=\"root\">image uploader</div>",
        )
        .unwrap();
        std::fs::create_dir(static_dir.path().join("assets")).unwrap();
        std::fs::write(static_dir.path().join("assets/app.js"), "console.log('app');").unwrap();

        let mut config = RelayConfig::for_testing(
            staging_dir.path().to_path_buf(),
            static_dir.path().to_path_buf(),
        );
        tweak(&mut config);

        let host = Arc::new(MockMediaHost::new());
        let state = AppState {
            relay: Arc::new(RelayService::new(host.clone(), config.upload_folder.clone())),
            staging: Arc::new(StagingArea::new(
                config.staging_dir.clone(),
                config.max_file_size,
            )),
            config,
        };

        Self {
            app: create_app(state),
            host,
            staging_dir,
            static_dir,
        }
    }

    pub fn staged_file_count(&self) -> usize {
        std::fs::read_dir(self.staging_dir.path()).unwrap().count()
    }
}

/// A multipart part: (field name, optional filename, content)
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}
