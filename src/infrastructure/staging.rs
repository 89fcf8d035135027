use crate::config::RelayConfig;
use crate::services::staging::StagingArea;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

pub async fn setup_staging(config: &RelayConfig) -> anyhow::Result<Arc<StagingArea>> {
    let area = StagingArea::new(config.staging_dir.clone(), config.max_file_size);
    area.ensure_dir()
        .await
        .with_context(|| format!("Failed to create staging dir {}", area.dir().display()))?;

    info!(
        "📂 Staging dir: {} (Max file size={}MB)",
        area.dir().display(),
        config.max_file_size / 1024 / 1024
    );

    Ok(Arc::new(area))
}
