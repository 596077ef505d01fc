use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Attachment lifecycle status matching the `attachment_status` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "attachment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttachmentStatus {
    Uploading,
    Completed,
}

/// Database model for an uploaded (or uploading) file
#[derive(Debug, Clone, FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub object_key: String,
    pub cover_object_key: Option<String>,
    pub original_name: String,
    pub mime_type: String,
    /// Lowercase hex MD5 declared by the client
    pub content_hash: String,
    pub cover_content_hash: Option<String>,
    pub file_size: i64,
    pub status: AttachmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attachment {
    pub fn is_completed(&self) -> bool {
        self.status == AttachmentStatus::Completed
    }
}

/// Values for a freshly minted attachment row
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub id: Uuid,
    pub object_key: String,
    pub cover_object_key: Option<String>,
    pub original_name: String,
    pub mime_type: String,
    pub content_hash: String,
    pub cover_content_hash: Option<String>,
    pub file_size: i64,
}
