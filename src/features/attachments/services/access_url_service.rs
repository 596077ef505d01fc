use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;
use uuid::Uuid;

use crate::core::config::UploadPolicy;
use crate::core::error::{AppError, Result};
use crate::features::attachments::dtos::{
    AccessUrlResponseDto, AttachmentAccessUrlDto, BatchAccessUrlResponseDto,
};
use crate::features::attachments::models::Attachment;
use crate::features::attachments::repositories::AttachmentRepository;
use crate::modules::storage::ObjectStore;
use crate::shared::constants::MAX_ACCESS_URL_BATCH;

/// Issues presigned download URLs. Only completed attachments are served;
/// unknown, uploading and cover-less cases share one NotFound.
pub struct AccessUrlService {
    repository: Arc<dyn AttachmentRepository>,
    store: Arc<dyn ObjectStore>,
    policy: UploadPolicy,
}

impl AccessUrlService {
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

    pub async fn get_access_url(&self, attachment_id: Uuid) -> Result<AccessUrlResponseDto> {
        let attachment = self.completed(attachment_id).await?;
        self.sign(&attachment.object_key).await
    }

    pub async fn get_cover_access_url(&self, attachment_id: Uuid) -> Result<AccessUrlResponseDto> {
        let attachment = self.completed(attachment_id).await?;
        let cover_key = attachment
            .cover_object_key
            .as_deref()
            .ok_or_else(|| not_available(attachment_id))?;
        self.sign(cover_key).await
    }

    /// URLs for the completed attachments among `attachment_ids`, in request
    /// order. Ids that cannot be served are left out.
    pub async fn get_access_urls(
        &self,
        attachment_ids: &[Uuid],
    ) -> Result<BatchAccessUrlResponseDto> {
        if attachment_ids.len() > MAX_ACCESS_URL_BATCH {
            return Err(AppError::Validation(format!(
                "At most {} attachment ids can be requested at once",
                MAX_ACCESS_URL_BATCH
            )));
        }

        let found = self.repository.find_completed_by_ids(attachment_ids).await?;
        let mut ordered: Vec<&Attachment> = Vec::with_capacity(found.len());
        for id in attachment_ids {
            if ordered.iter().any(|a| a.id == *id) {
                continue;
            }
            if let Some(attachment) = found.iter().find(|a| a.id == *id) {
                ordered.push(attachment);
            }
        }

        let expiry = self.policy.access_url_expiry_secs;
        let items = try_join_all(ordered.into_iter().map(|attachment| async move {
            let url = self.store.presign_get(&attachment.object_key, expiry).await?;
            let cover_url = match &attachment.cover_object_key {
                Some(key) => Some(self.store.presign_get(key, expiry).await?),
                None => None,
            };
            Ok::<_, AppError>(AttachmentAccessUrlDto {
                attachment_id: attachment.id,
                url,
                cover_url,
            })
        }))
        .await?;

        debug!(
            "Issued access URLs for {} of {} requested attachment(s)",
            items.len(),
            attachment_ids.len()
        );

        Ok(BatchAccessUrlResponseDto {
            items,
            expires_in: expiry,
        })
    }

    async fn completed(&self, attachment_id: Uuid) -> Result<Attachment> {
        self.repository
            .find_completed_by_id(attachment_id)
            .await?
            .ok_or_else(|| not_available(attachment_id))
    }

    async fn sign(&self, key: &str) -> Result<AccessUrlResponseDto> {
        let expires_in = self.policy.access_url_expiry_secs;
        let url = self.store.presign_get(key, expires_in).await?;
        Ok(AccessUrlResponseDto { url, expires_in })
    }
}

fn not_available(attachment_id: Uuid) -> AppError {
    AppError::NotFound(format!(
        "Attachment {} not found or not completed",
        attachment_id
    ))
}
