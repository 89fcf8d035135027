use crate::AppState;
use crate::api::error::AppError;
use crate::services::relay_service::RelayOutcome;
use crate::services::staging::StagedFile;
use crate::utils::validation::sanitize_filename;
use axum::{
    Json,
    extract::{Multipart, State},
};

/// Multipart field the browser form appends every image under
pub const IMAGES_FIELD: &str = "images";

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = Multipart, description = "Up to 50 files in the `images` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "One entry per file, in request order. Failed files appear as {filename, error}", body = [RelayOutcome]),
        (status = 400, description = "No files uploaded, or too many files"),
        (status = 413, description = "A file or the whole body exceeds the size limit"),
        (status = 500, description = "Internal server error")
    ),
    tag = "upload"
)]
pub async fn upload_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<RelayOutcome>>, AppError> {
    let mut staged: Vec<StagedFile> = Vec::new();

    let result: Result<(), AppError> = async {
        while let Some(field) = multipart.next_field().await? {
            // Text fields, other file fields and empty file inputs are skipped;
            // the parser discards an unread field when the next one is requested.
            if field.name() != Some(IMAGES_FIELD) {
                continue;
            }
            let Some(original_filename) = field.file_name().filter(|n| !n.is_empty()) else {
                continue;
            };

            if staged.len() >= state.config.max_files {
                return Err(AppError::BadRequest(format!(
                    "Too many files: at most {} allowed in '{}'",
                    state.config.max_files, IMAGES_FIELD
                )));
            }

            let filename = sanitize_filename(original_filename);
            let content_type = field.content_type().map(str::to_string);
            let file = state
                .staging
                .stage(&filename, content_type.as_deref(), field)
                .await?;
            staged.push(file);
        }
        Ok(())
    }
    .await;

    if let Err(e) = result {
        // Drain what is left so the browser sees the response instead of a reset connection
        tracing::warn!("Upload failed early: {}. Consuming remaining stream...", e);
        while let Ok(Some(mut field)) = multipart.next_field().await {
            while let Ok(Some(_)) = field.chunk().await {}
        }
        for file in staged {
            file.remove().await;
        }
        return Err(e);
    }

    if staged.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".to_string()));
    }

    tracing::info!(
        "📦 Relaying {} file(s) to {} folder '{}'",
        staged.len(),
        state.relay.host().provider_id(),
        state.relay.folder()
    );

    let outcomes = state.relay.relay_all(staged).await;

    let failed = outcomes.iter().filter(|o| !o.is_uploaded()).count();
    if failed > 0 {
        tracing::warn!("{} of {} file(s) failed to relay", failed, outcomes.len());
    }

    Ok(Json(outcomes))
}
