use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::attachments::models::AttachmentStatus;
use crate::features::moments::models::{LinkedAttachment, Moment, MomentAttachmentLink};

/// Attachment slot requested for a moment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct AttachmentLinkDto {
    pub attachment_id: Uuid,
    /// Display slot, 0-9
    #[schema(minimum = 0, maximum = 9)]
    pub position: i16,
}

impl From<AttachmentLinkDto> for MomentAttachmentLink {
    fn from(dto: AttachmentLinkDto) -> Self {
        Self {
            attachment_id: dto.attachment_id,
            position: dto.position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMomentDto {
    #[validate(
        length(min = 1, max = 5000, message = "content must be 1-5000 characters"),
        custom(function = "crate::shared::validation::validate_not_blank")
    )]
    pub content: String,

    #[serde(default)]
    #[validate(length(max = 10, message = "A moment holds at most 10 attachments"))]
    pub attachments: Vec<AttachmentLinkDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MomentAttachmentDto {
    pub attachment_id: Uuid,
    pub position: i16,
    /// Only `completed` attachments can be downloaded
    pub status: AttachmentStatus,
    pub mime_type: String,
    pub original_name: String,
}

impl From<LinkedAttachment> for MomentAttachmentDto {
    fn from(link: LinkedAttachment) -> Self {
        Self {
            attachment_id: link.attachment_id,
            position: link.position,
            status: link.status,
            mime_type: link.mime_type,
            original_name: link.original_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MomentResponseDto {
    pub id: Uuid,
    pub content: String,
    pub attachments: Vec<MomentAttachmentDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MomentResponseDto {
    pub fn from_parts(moment: Moment, attachments: Vec<LinkedAttachment>) -> Self {
        Self {
            id: moment.id,
            content: moment.content,
            attachments: attachments.into_iter().map(Into::into).collect(),
            created_at: moment.created_at,
            updated_at: moment.updated_at,
        }
    }
}

/// One page of moments, newest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MomentPageDto {
    pub items: Vec<MomentResponseDto>,
    /// Pass back as `cursor` to fetch the next page; absent on the last page
    pub next_cursor: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;

    fn link(position: i16) -> AttachmentLinkDto {
        AttachmentLinkDto {
            attachment_id: Uuid::now_v7(),
            position,
        }
    }

    #[test]
    fn test_create_moment_validation() {
        let content: String = Sentence(3..8).fake();
        let dto = CreateMomentDto {
            content,
            attachments: (0..10).map(link).collect(),
        };
        assert!(dto.validate().is_ok());

        let empty = CreateMomentDto {
            content: String::new(),
            attachments: vec![],
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_whitespace_content_is_rejected() {
        let dto = CreateMomentDto {
            content: "   \n ".to_string(),
            attachments: vec![],
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_more_than_ten_attachments_is_rejected() {
        let dto = CreateMomentDto {
            content: Sentence(3..8).fake(),
            attachments: (0..11).map(link).collect(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_attachments_default_to_empty() {
        let dto: CreateMomentDto = serde_json::from_str(r#"{"content":"quiet day"}"#).unwrap();
        assert!(dto.attachments.is_empty());
    }
}
