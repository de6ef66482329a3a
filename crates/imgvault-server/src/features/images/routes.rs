use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

use super::{
    commands::UploadImageCommand,
    queries::{ImageGallery, ListImagesQuery},
};
use crate::api::response::ApiResponse;
use crate::error::{ApiResult, AppError};
use crate::features::FeatureState;

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

pub fn images_routes() -> Router<FeatureState> {
    Router::new().route("/", post(upload_image).get(list_images))
}

#[tracing::instrument(skip(state, multipart))]
async fn upload_image(
    State(state): State<FeatureState>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut command: Option<UploadImageCommand> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if command.is_some() {
            return Err(AppError::Validation(format!(
                "Only one '{FILE_FIELD}' field is allowed per upload"
            )));
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let content = field.bytes().await?.to_vec();

        command = Some(UploadImageCommand {
            filename,
            content,
            content_type,
        });
    }

    let command = command.ok_or_else(|| {
        AppError::Validation(format!("No '{FILE_FIELD}' field found in multipart data"))
    })?;

    let receipt = super::commands::upload::handle(&state.pipeline, command).await?;

    tracing::info!(
        key = %receipt.key,
        id = receipt.record.id,
        "Image uploaded via API"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(receipt))).into_response())
}

#[tracing::instrument(skip(state))]
async fn list_images(State(state): State<FeatureState>) -> Response {
    let result = super::queries::list::handle(state.repository.as_ref(), ListImagesQuery).await;
    let gallery = ImageGallery::from_result(result);

    match gallery.message {
        Some(message) => {
            ApiResponse::success_with_meta(gallery.images, json!({ "message": message }))
                .into_response()
        },
        None => ApiResponse::success(gallery.images).into_response(),
    }
}
