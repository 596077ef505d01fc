use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::core::config::UploadPolicy;
use crate::core::error::{AppError, Result};
use crate::features::attachments::dtos::{PresignedUploadRequestDto, PresignedUploadResponseDto};
use crate::features::attachments::models::NewAttachment;
use crate::features::attachments::repositories::{AttachmentRepository, AttachmentTransaction};
use crate::modules::storage::ObjectStore;
use crate::shared::constants::MAX_UPLOAD_BATCH;
use crate::shared::validation::EXTENSION_REGEX;

/// Descriptor that passed validation, with normalized extension and digests
struct PreparedUpload {
    original_name: String,
    mime_type: String,
    file_size: i64,
    ext: String,
    content_hash: String,
    cover: Option<PreparedCover>,
}

struct PreparedCover {
    ext: String,
    content_hash: String,
}

/// Orchestrates the two-phase upload: presigned PUT issuance, then
/// integrity-checked confirmation.
pub struct UploadService {
    repository: Arc<dyn AttachmentRepository>,
    store: Arc<dyn ObjectStore>,
    policy: UploadPolicy,
}

impl UploadService {
    pub fn new(
        repository: Arc<dyn AttachmentRepository>,
        store: Arc<dyn ObjectStore>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            repository,
            store,
            policy,
        }
    }

    /// Produce one upload instruction per descriptor, in order.
    ///
    /// Every descriptor is validated before anything is written. Rows and
    /// presigned URLs are produced inside one transaction, so a failure on
    /// any descriptor leaves no rows behind.
    pub async fn request_upload(
        &self,
        items: Vec<PresignedUploadRequestDto>,
    ) -> Result<Vec<PresignedUploadResponseDto>> {
        if items.is_empty() {
            return Err(AppError::Validation(
                "At least one file is required".to_string(),
            ));
        }
        if items.len() > MAX_UPLOAD_BATCH {
            return Err(AppError::Validation(format!(
                "At most {} files can be uploaded per request",
                MAX_UPLOAD_BATCH
            )));
        }

        let prepared = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| prepare(index, item))
            .collect::<Result<Vec<_>>>()?;

        let mut tx = self.repository.begin().await?;
        let mut instructions = Vec::with_capacity(prepared.len());

        for upload in prepared {
            let instruction = self.issue_instruction(tx.as_mut(), upload).await?;
            instructions.push(instruction);
        }

        tx.commit().await?;

        info!(
            "Issued {} upload instruction(s), {} duplicate(s)",
            instructions.len(),
            instructions.iter().filter(|i| i.is_duplicate).count()
        );

        Ok(instructions)
    }

    async fn issue_instruction(
        &self,
        tx: &mut dyn AttachmentTransaction,
        upload: PreparedUpload,
    ) -> Result<PresignedUploadResponseDto> {
        if let Some(existing) = tx.find_completed_by_hash(&upload.content_hash).await? {
            debug!(
                "Content {} already stored as attachment {}",
                upload.content_hash, existing.id
            );
            return Ok(PresignedUploadResponseDto {
                attachment_id: existing.id,
                upload_url: None,
                cover_upload_url: None,
                object_key: existing.object_key,
                cover_object_key: existing.cover_object_key,
                is_duplicate: true,
            });
        }

        let (cover_object_key, cover_content_hash) = match upload.cover {
            Some(cover) => (Some(mint_object_key(&cover.ext)), Some(cover.content_hash)),
            None => (None, None),
        };

        let attachment = tx
            .insert(&NewAttachment {
                id: Uuid::now_v7(),
                object_key: mint_object_key(&upload.ext),
                cover_object_key,
                original_name: upload.original_name,
                mime_type: upload.mime_type,
                content_hash: upload.content_hash,
                cover_content_hash,
                file_size: upload.file_size,
            })
            .await?;

        let expiry = self.policy.upload_url_expiry_secs;
        let upload_url = self.store.presign_put(&attachment.object_key, expiry).await?;
        let cover_upload_url = match &attachment.cover_object_key {
            Some(key) => Some(self.store.presign_put(key, expiry).await?),
            None => None,
        };

        debug!(
            "Attachment {} awaiting upload at {}",
            attachment.id, attachment.object_key
        );

        Ok(PresignedUploadResponseDto {
            attachment_id: attachment.id,
            upload_url: Some(upload_url),
            cover_upload_url,
            object_key: attachment.object_key,
            cover_object_key: attachment.cover_object_key,
            is_duplicate: false,
        })
    }

    /// Verify the uploaded object(s) against the declared digests and mark
    /// the attachment completed. A completed attachment is verified again,
    /// so a confirm never succeeds for bytes that no longer match.
    pub async fn confirm_upload(&self, attachment_id: Uuid) -> Result<()> {
        let attachment = self
            .repository
            .find_by_id(attachment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attachment {} not found", attachment_id)))?;

        self.verify_object(
            &attachment.object_key,
            &attachment.content_hash,
            Some(attachment.file_size),
        )
        .await?;

        if let (Some(key), Some(hash)) = (
            attachment.cover_object_key.as_deref(),
            attachment.cover_content_hash.as_deref(),
        ) {
            self.verify_object(key, hash, None).await?;
        }

        let was_completed = attachment.is_completed();
        let completed = self.repository.mark_completed(attachment_id).await?;

        if was_completed {
            debug!("Attachment {} re-verified, already completed", attachment_id);
            return Ok(());
        }

        info!(
            "Attachment {} ({}) completed: {} bytes, {}, uploaded in {}s",
            completed.id,
            completed.original_name,
            completed.file_size,
            completed.mime_type,
            (completed.updated_at - completed.created_at).num_seconds()
        );

        Ok(())
    }

    async fn verify_object(
        &self,
        key: &str,
        expected_hash: &str,
        expected_size: Option<i64>,
    ) -> Result<()> {
        let stat = self.store.stat(key).await?.ok_or_else(|| {
            warn!("Confirm rejected: object {} is missing", key);
            AppError::IntegrityMismatch(format!("Object {} has not been uploaded", key))
        })?;

        let e_tag = stat.normalized_e_tag();
        if !e_tag
            .as_deref()
            .is_some_and(|tag| tag.eq_ignore_ascii_case(expected_hash))
        {
            warn!(
                "Confirm rejected: object {} has etag {:?}, expected {}",
                key, e_tag, expected_hash
            );
            return Err(AppError::IntegrityMismatch(format!(
                "Stored content of {} does not match the declared md5",
                key
            )));
        }

        if let (Some(expected), Some(actual)) = (expected_size, stat.content_length) {
            if expected != actual {
                warn!(
                    "Confirm rejected: object {} is {} bytes, expected {}",
                    key, actual, expected
                );
                return Err(AppError::IntegrityMismatch(format!(
                    "Stored size of {} does not match the declared file_size",
                    key
                )));
            }
        }

        Ok(())
    }
}

fn prepare(index: usize, item: PresignedUploadRequestDto) -> Result<PreparedUpload> {
    item.validate()
        .map_err(|e| AppError::Validation(format!("files[{}]: {}", index, e)))?;

    let ext = file_extension(&item.file_name).ok_or_else(|| {
        AppError::Validation(format!(
            "files[{}]: file_name must carry an alphanumeric extension",
            index
        ))
    })?;

    let cover = match (item.cover_ext.as_deref(), item.cover_md5.as_deref()) {
        (None, None) => None,
        (Some(cover_ext), Some(cover_md5)) => {
            let cover_ext = cover_ext.trim_start_matches('.');
            if !EXTENSION_REGEX.is_match(cover_ext) {
                return Err(AppError::Validation(format!(
                    "files[{}]: cover_ext must be alphanumeric",
                    index
                )));
            }
            Some(PreparedCover {
                ext: cover_ext.to_ascii_lowercase(),
                content_hash: cover_md5.to_ascii_lowercase(),
            })
        }
        _ => {
            return Err(AppError::Validation(format!(
                "files[{}]: cover_ext and cover_md5 must be provided together",
                index
            )))
        }
    };

    Ok(PreparedUpload {
        original_name: item.file_name,
        mime_type: item.mime_type,
        file_size: item.file_size,
        ext,
        content_hash: item.md5.to_ascii_lowercase(),
        cover,
    })
}

fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| EXTENSION_REGEX.is_match(ext))
        .map(|ext| ext.to_ascii_lowercase())
}

/// Fresh random key; keys are never derived from content so they are never reused
fn mint_object_key(ext: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), ext)
}
