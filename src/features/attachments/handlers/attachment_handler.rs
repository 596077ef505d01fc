use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath};
use crate::features::attachments::dtos::{
    AccessUrlResponseDto, BatchAccessUrlRequestDto, BatchAccessUrlResponseDto,
    PresignedUploadRequestDto, PresignedUploadResponseDto,
};
use crate::features::attachments::services::{AccessUrlService, UploadService};
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::types::ApiResponse;

/// Request presigned upload URLs for a batch of files
///
/// Files whose content is already stored are answered with
/// `is_duplicate = true` and no upload URL.
#[utoipa::path(
    post,
    path = "/api/storage/presigned/upload",
    tag = "storage",
    request_body = Vec<PresignedUploadRequestDto>,
    responses(
        (status = 201, description = "Upload instructions issued", body = ApiResponse<Vec<PresignedUploadResponseDto>>),
        (status = 400, description = "Invalid file descriptor or batch size"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn request_presigned_upload(
    user: AuthenticatedUser,
    State(service): State<Arc<UploadService>>,
    AppJson(items): AppJson<Vec<PresignedUploadRequestDto>>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<PresignedUploadResponseDto>>>)> {
    debug!(
        "User {} requested upload of {} file(s)",
        user.user_id,
        items.len()
    );

    let instructions = service.request_upload(items).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(instructions),
            Some("Upload instructions issued".to_string()),
            None,
        )),
    ))
}

/// Confirm that the client finished uploading an attachment
#[utoipa::path(
    post,
    path = "/api/storage/{attachment_id}/completed",
    tag = "storage",
    params(
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 204, description = "Attachment verified and completed"),
        (status = 404, description = "Attachment not found"),
        (status = 409, description = "Identical content completed concurrently, retry the upload request"),
        (status = 422, description = "Stored object missing or does not match the declared md5"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn confirm_upload(
    user: AuthenticatedUser,
    State(service): State<Arc<UploadService>>,
    AppPath(attachment_id): AppPath<Uuid>,
) -> Result<StatusCode> {
    debug!(
        "User {} confirming attachment {}",
        user.user_id, attachment_id
    );

    service.confirm_upload(attachment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get a temporary download URL for a completed attachment
#[utoipa::path(
    get,
    path = "/api/storage/{attachment_id}/url",
    tag = "storage",
    params(
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Presigned download URL", body = ApiResponse<AccessUrlResponseDto>),
        (status = 404, description = "Attachment not found or not completed"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_access_url(
    State(service): State<Arc<AccessUrlService>>,
    AppPath(attachment_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<AccessUrlResponseDto>>> {
    let response = service.get_access_url(attachment_id).await?;
    Ok(Json(ApiResponse::success(Some(response), None, None)))
}

/// Get a temporary download URL for the cover of a completed attachment
#[utoipa::path(
    get,
    path = "/api/storage/{attachment_id}/cover-url",
    tag = "storage",
    params(
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Presigned cover download URL", body = ApiResponse<AccessUrlResponseDto>),
        (status = 404, description = "Attachment not found, not completed or without cover"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_cover_access_url(
    State(service): State<Arc<AccessUrlService>>,
    AppPath(attachment_id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<AccessUrlResponseDto>>> {
    let response = service.get_cover_access_url(attachment_id).await?;
    Ok(Json(ApiResponse::success(Some(response), None, None)))
}

/// Get temporary download URLs for several attachments at once
#[utoipa::path(
    post,
    path = "/api/storage/urls",
    tag = "storage",
    request_body = BatchAccessUrlRequestDto,
    responses(
        (status = 200, description = "URLs for the completed attachments among the requested ids", body = ApiResponse<BatchAccessUrlResponseDto>),
        (status = 400, description = "Empty or oversized id list"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_access_urls(
    State(service): State<Arc<AccessUrlService>>,
    AppJson(dto): AppJson<BatchAccessUrlRequestDto>,
) -> Result<Json<ApiResponse<BatchAccessUrlResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let response = service.get_access_urls(&dto.attachment_ids).await?;
    Ok(Json(ApiResponse::success(Some(response), None, None)))
}
