use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::attachments::{
    dtos as attachments_dtos, handlers as attachments_handlers, models as attachments_models,
};
use crate::features::moments::{dtos as moments_dtos, handlers as moments_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Storage
        attachments_handlers::request_presigned_upload,
        attachments_handlers::confirm_upload,
        attachments_handlers::get_access_url,
        attachments_handlers::get_cover_access_url,
        attachments_handlers::get_access_urls,
        // Moments
        moments_handlers::list_moments,
        moments_handlers::create_moment,
        moments_handlers::get_moment,
        moments_handlers::delete_moment,
        moments_handlers::add_attachment,
        moments_handlers::remove_attachment,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Storage
            attachments_models::AttachmentStatus,
            attachments_dtos::PresignedUploadRequestDto,
            attachments_dtos::PresignedUploadResponseDto,
            attachments_dtos::AccessUrlResponseDto,
            attachments_dtos::BatchAccessUrlRequestDto,
            attachments_dtos::AttachmentAccessUrlDto,
            attachments_dtos::BatchAccessUrlResponseDto,
            ApiResponse<Vec<attachments_dtos::PresignedUploadResponseDto>>,
            ApiResponse<attachments_dtos::AccessUrlResponseDto>,
            ApiResponse<attachments_dtos::BatchAccessUrlResponseDto>,
            // Moments
            moments_dtos::AttachmentLinkDto,
            moments_dtos::CreateMomentDto,
            moments_dtos::MomentAttachmentDto,
            moments_dtos::MomentResponseDto,
            moments_dtos::MomentPageDto,
            ApiResponse<moments_dtos::MomentResponseDto>,
            ApiResponse<moments_dtos::MomentPageDto>,
        )
    ),
    tags(
        (name = "storage", description = "Direct-to-storage attachment uploads and download URLs"),
        (name = "moments", description = "Moments and their positioned attachments"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Lifetrack API",
        version = "0.1.0",
        description = "API documentation for Lifetrack",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
