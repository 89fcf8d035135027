use super::{HostedImage, MediaHost, ProviderError, UploadOptions};
use crate::config::CloudinaryCredentials;
use crate::utils::signature::sign_params;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const SIGNATURE_ALGORITHM: &str = "sha256";

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Signed-upload client for the Cloudinary Upload API.
///
/// Credentials are handed in at construction; nothing is read from the
/// process environment here.
pub struct CloudinaryClient {
    http: reqwest::Client,
    credentials: CloudinaryCredentials,
    api_base: String,
}

impl CloudinaryClient {
    pub fn new(credentials: CloudinaryCredentials, api_base: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), credentials, api_base)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        credentials: CloudinaryCredentials,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            credentials,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn upload_url(&self, resource_type: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.api_base, self.credentials.cloud_name, resource_type
        )
    }

    /// Parameters covered by the signature. `file`, `api_key`, `resource_type`
    /// and `cloud_name` are excluded by the provider's signing rules.
    fn params_to_sign(options: &UploadOptions, timestamp: u64) -> Vec<(&'static str, String)> {
        vec![
            ("access_mode", options.access_mode.to_string()),
            ("folder", options.folder.clone()),
            ("timestamp", timestamp.to_string()),
        ]
    }

    fn build_form(
        &self,
        options: &UploadOptions,
        timestamp: u64,
        filename: &str,
        data: Vec<u8>,
    ) -> Form {
        let params = Self::params_to_sign(options, timestamp);
        let signature = sign_params(&params, &self.credentials.api_secret);

        let mut form = Form::new();
        for (key, value) in params {
            form = form.text(key, value);
        }
        form.text("api_key", self.credentials.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", SIGNATURE_ALGORITHM)
            .part("file", Part::bytes(data).file_name(filename.to_string()))
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    fn provider_id(&self) -> &'static str {
        "cloudinary"
    }

    fn account(&self) -> &str {
        &self.credentials.cloud_name
    }

    async fn upload(
        &self,
        path: &Path,
        filename: &str,
        options: &UploadOptions,
    ) -> Result<HostedImage, ProviderError> {
        let data = tokio::fs::read(path).await?;
        let size = data.len();
        let form = self.build_form(options, unix_timestamp(), filename, data);

        tracing::debug!(
            "Uploading {} ({} bytes) to {} folder '{}'",
            filename,
            size,
            self.provider_id(),
            options.folder
        );

        let response = self
            .http
            .post(self.upload_url(options.resource_type))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice::<HostedImage>(&body)
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> CloudinaryCredentials {
        CloudinaryCredentials {
            cloud_name: "demo".to_string(),
            api_key: "123456789012345".to_string(),
            api_secret: "abcd".to_string(),
        }
    }

    fn staged_image() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"GIF89a fake image bytes").unwrap();
        file
    }

    #[test]
    fn test_upload_url_uses_cloud_name_and_resource_type() {
        let client = CloudinaryClient::new(credentials(), "https://api.cloudinary.com/");
        assert_eq!(
            client.upload_url("auto"),
            "https://api.cloudinary.com/v1_1/demo/auto/upload"
        );
    }

    #[test]
    fn test_signed_params_cover_fixed_options() {
        let params =
            CloudinaryClient::params_to_sign(&UploadOptions::public_auto("br-uploads"), 42);
        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["access_mode", "folder", "timestamp"]);
        assert_eq!(params[0].1, "public");
        assert_eq!(params[2].1, "42");
    }

    #[tokio::test]
    async fn test_upload_returns_public_id_and_secure_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/auto/upload"))
            .and(body_string_contains("br-uploads"))
            .and(body_string_contains("signature_algorithm"))
            .and(body_string_contains("cat.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "br-uploads/abc123",
                "secure_url": "https://res.cloudinary.com/demo/image/upload/br-uploads/abc123.png",
                "resource_type": "image",
                "bytes": 24
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CloudinaryClient::new(credentials(), server.uri());
        let file = staged_image();
        let hosted = client
            .upload(file.path(), "cat.png", &UploadOptions::public_auto("br-uploads"))
            .await
            .unwrap();

        assert_eq!(hosted.public_id, "br-uploads/abc123");
        assert_eq!(
            hosted.secure_url,
            "https://res.cloudinary.com/demo/image/upload/br-uploads/abc123.png"
        );
    }

    #[tokio::test]
    async fn test_provider_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/auto/upload"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Invalid Signature" }
            })))
            .mount(&server)
            .await;

        let client = CloudinaryClient::new(credentials(), server.uri());
        let file = staged_image();
        let err = client
            .upload(file.path(), "cat.png", &UploadOptions::public_auto("br-uploads"))
            .await
            .unwrap_err();

        match err {
            ProviderError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = CloudinaryClient::new(credentials(), server.uri());
        let file = staged_image();
        let err = client
            .upload(file.path(), "cat.png", &UploadOptions::public_auto("br-uploads"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_missing_staged_file_is_a_read_error() {
        let client = CloudinaryClient::new(credentials(), "http://127.0.0.1:1");
        let err = client
            .upload(
                Path::new("/definitely/not/here.png"),
                "here.png",
                &UploadOptions::public_auto("br-uploads"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Read(_)));
    }
}
