use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath};
use crate::features::moments::dtos::{
    AttachmentLinkDto, CreateMomentDto, MomentPageDto, MomentResponseDto,
};
use crate::features::moments::services::MomentService;
use crate::shared::types::{ApiResponse, CursorQuery};

/// Create a moment, optionally with positioned attachments
#[utoipa::path(
    post,
    path = "/api/moments",
    tag = "moments",
    request_body = CreateMomentDto,
    responses(
        (status = 201, description = "Moment created", body = ApiResponse<MomentResponseDto>),
        (status = 400, description = "Validation error or position outside 0-9"),
        (status = 404, description = "Attachment not found"),
        (status = 409, description = "Two attachments share a position"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_moment(
    State(service): State<Arc<MomentService>>,
    AppJson(dto): AppJson<CreateMomentDto>,
) -> Result<(StatusCode, Json<ApiResponse<MomentResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let moment = service.create_moment(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(moment),
            Some("Moment created successfully".to_string()),
            None,
        )),
    ))
}

/// List moments, newest first, with cursor pagination
#[utoipa::path(
    get,
    path = "/api/moments",
    tag = "moments",
    params(CursorQuery),
    responses(
        (status = 200, description = "One page of moments", body = ApiResponse<MomentPageDto>),
        (status = 400, description = "Malformed cursor or limit"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_moments(
    State(service): State<Arc<MomentService>>,
    Query(query): Query<CursorQuery>,
) -> Result<Json<ApiResponse<MomentPageDto>>> {
    let page = service.list_moments(&query).await?;
    Ok(Json(ApiResponse::success(Some(page), None, None)))
}

#[utoipa::path(
    get,
    path = "/api/moments/{id}",
    tag = "moments",
    params(
        ("id" = Uuid, Path, description = "Moment ID")
    ),
    responses(
        (status = 200, description = "Moment with its attachments", body = ApiResponse<MomentResponseDto>),
        (status = 404, description = "Moment not found"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_moment(
    State(service): State<Arc<MomentService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<MomentResponseDto>>> {
    let moment = service.get_moment(id).await?;
    Ok(Json(ApiResponse::success(Some(moment), None, None)))
}

/// Delete a moment; linked attachments are kept
#[utoipa::path(
    delete,
    path = "/api/moments/{id}",
    tag = "moments",
    params(
        ("id" = Uuid, Path, description = "Moment ID")
    ),
    responses(
        (status = 204, description = "Moment deleted"),
        (status = 404, description = "Moment not found"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_moment(
    State(service): State<Arc<MomentService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode> {
    service.delete_moment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/moments/{id}/attachments",
    tag = "moments",
    params(
        ("id" = Uuid, Path, description = "Moment ID")
    ),
    request_body = AttachmentLinkDto,
    responses(
        (status = 200, description = "Attachment linked", body = ApiResponse<MomentResponseDto>),
        (status = 400, description = "Position outside 0-9"),
        (status = 404, description = "Moment or attachment not found"),
        (status = 409, description = "Position taken or attachment already linked"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_attachment(
    State(service): State<Arc<MomentService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<AttachmentLinkDto>,
) -> Result<Json<ApiResponse<MomentResponseDto>>> {
    let moment = service.add_attachment(id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(moment),
        Some("Attachment linked successfully".to_string()),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/moments/{id}/attachments/{attachment_id}",
    tag = "moments",
    params(
        ("id" = Uuid, Path, description = "Moment ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 204, description = "Attachment unlinked"),
        (status = 404, description = "Link not found"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_attachment(
    State(service): State<Arc<MomentService>>,
    AppPath((id, attachment_id)): AppPath<(Uuid, Uuid)>,
) -> Result<StatusCode> {
    service.remove_attachment(id, attachment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
