use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::attachments::models::AttachmentStatus;

/// Database model for a moment (a short journal entry)
#[derive(Debug, Clone, FromRow)]
pub struct Moment {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Positioned link between a moment and an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MomentAttachmentLink {
    pub attachment_id: Uuid,
    pub position: i16,
}

/// Linked attachment joined with its current upload state
#[derive(Debug, Clone, FromRow)]
pub struct LinkedAttachment {
    pub attachment_id: Uuid,
    pub position: i16,
    pub status: AttachmentStatus,
    pub mime_type: String,
    pub original_name: String,
}
