use crate::config::RelayConfig;
use crate::services::media_host::{CloudinaryClient, MediaHost};
use std::sync::Arc;
use tracing::info;

pub fn setup_media_host(config: &RelayConfig) -> Arc<dyn MediaHost> {
    info!(
        "☁️  Media host: Cloudinary (Cloud: {}, API: {})",
        config.credentials.cloud_name, config.api_base
    );

    Arc::new(CloudinaryClient::new(
        config.credentials.clone(),
        config.api_base.clone(),
    ))
}
