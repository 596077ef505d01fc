use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// One file the client intends to upload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PresignedUploadRequestDto {
    /// Original file name; its extension determines the object key suffix
    #[validate(length(min = 1, max = 255, message = "file_name must be 1-255 characters"))]
    #[schema(example = "a.png")]
    pub file_name: String,

    #[validate(length(min = 1, max = 255, message = "mime_type must be 1-255 characters"))]
    #[schema(example = "image/png")]
    pub mime_type: String,

    /// Size in bytes, must be positive
    #[validate(range(min = 1, message = "file_size must be greater than zero"))]
    #[schema(example = 1024)]
    pub file_size: i64,

    /// Hex MD5 of the file content
    #[validate(regex(
        path = "*crate::shared::validation::MD5_REGEX",
        message = "md5 must be 32 hexadecimal characters"
    ))]
    #[schema(example = "d41d8cd98f00b204e9800998ecf8427e")]
    pub md5: String,

    /// Extension of an optional cover image (e.g. a video thumbnail)
    #[serde(default)]
    #[schema(example = "jpg")]
    pub cover_ext: Option<String>,

    #[serde(default)]
    #[validate(regex(
        path = "*crate::shared::validation::MD5_REGEX",
        message = "cover_md5 must be 32 hexadecimal characters"
    ))]
    pub cover_md5: Option<String>,
}

/// Upload instruction returned per requested file, in request order
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PresignedUploadResponseDto {
    pub attachment_id: Uuid,

    /// Absent for duplicates; the bytes are already stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_upload_url: Option<String>,

    #[schema(example = "0192f7a4-5c1e-7c3b-9a57-1f2e3d4c5b6a.png")]
    pub object_key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_object_key: Option<String>,

    pub is_duplicate: bool,
}

/// Time-limited download URL
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessUrlResponseDto {
    pub url: String,
    /// Validity window in seconds
    pub expires_in: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BatchAccessUrlRequestDto {
    /// Upper bound is enforced by the service
    #[validate(length(min = 1, message = "attachment_ids must not be empty"))]
    pub attachment_ids: Vec<Uuid>,
}

/// Download URLs for one completed attachment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentAccessUrlDto {
    pub attachment_id: Uuid,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchAccessUrlResponseDto {
    pub items: Vec<AttachmentAccessUrlDto>,
    pub expires_in: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_dto() -> PresignedUploadRequestDto {
        PresignedUploadRequestDto {
            file_name: "a.png".to_string(),
            mime_type: "image/png".to_string(),
            file_size: 1024,
            md5: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
            cover_ext: None,
            cover_md5: None,
        }
    }

    #[test]
    fn test_valid_descriptor_passes() {
        assert!(valid_dto().validate().is_ok());
    }

    #[test]
    fn test_non_positive_size_is_rejected() {
        let mut dto = valid_dto();
        dto.file_size = 0;
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_malformed_md5_is_rejected() {
        let mut dto = valid_dto();
        dto.md5 = "not-a-digest".to_string();
        assert!(dto.validate().is_err());

        let mut dto = valid_dto();
        dto.cover_md5 = Some("abc".to_string());
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_duplicate_response_omits_urls() {
        let dto = PresignedUploadResponseDto {
            attachment_id: Uuid::now_v7(),
            upload_url: None,
            cover_upload_url: None,
            object_key: "k.png".to_string(),
            cover_object_key: None,
            is_duplicate: true,
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("upload_url").is_none());
        assert_eq!(json["is_duplicate"], true);
    }

    #[test]
    fn test_batch_access_request_must_not_be_empty() {
        let empty = BatchAccessUrlRequestDto {
            attachment_ids: vec![],
        };
        assert!(empty.validate().is_err());

        let one = BatchAccessUrlRequestDto {
            attachment_ids: vec![Uuid::now_v7()],
        };
        assert!(one.validate().is_ok());
    }
}
