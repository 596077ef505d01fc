use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::attachments::models::{Attachment, AttachmentStatus, NewAttachment};
use crate::features::attachments::repositories::{AttachmentRepository, AttachmentTransaction};
use crate::features::auth::model::{AuthenticatedUser, Claims};
use crate::features::auth::JwtValidator;
use crate::features::moments::models::{LinkedAttachment, Moment, MomentAttachmentLink};
use crate::features::moments::repositories::{MomentRepository, MomentTransaction};
use crate::modules::storage::{ObjectStat, ObjectStore};
use crate::shared::constants::MAX_ATTACHMENT_POSITION;

// =============================================================================
// AUTH
// =============================================================================

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        secret: "lifetrack-test-secret".to_string(),
        issuer: "lifetrack-test".to_string(),
        jwt_leeway: Duration::from_secs(0),
    }
}

pub fn test_jwt_validator() -> JwtValidator {
    JwtValidator::new(&test_auth_config())
}

/// Token accepted by `test_jwt_validator`, valid for one hour
pub fn issue_test_token(user_id: i64, email: &str) -> String {
    let config = test_auth_config();
    let now = Utc::now().timestamp() as u64;
    let claims = Claims {
        user_id,
        email: email.to_string(),
        iss: config.issuer,
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .unwrap()
}

pub fn create_test_user() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: 1,
        email: "tester@example.com".to_string(),
    }
}

async fn inject_test_user_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_test_user());
    next.run(request).await
}

pub fn with_test_user(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_test_user_middleware))
}

// =============================================================================
// IN-MEMORY DATABASE
// =============================================================================

/// Row as the insert leaves it, before any confirmation
fn materialize(new: NewAttachment) -> Attachment {
    let now = Utc::now();
    Attachment {
        id: new.id,
        object_key: new.object_key,
        cover_object_key: new.cover_object_key,
        original_name: new.original_name,
        mime_type: new.mime_type,
        content_hash: new.content_hash,
        cover_content_hash: new.cover_content_hash,
        file_size: new.file_size,
        status: AttachmentStatus::Uploading,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
struct DbState {
    attachments: Vec<Attachment>,
    moments: Vec<Moment>,
    links: Vec<(Uuid, MomentAttachmentLink)>,
}

/// Shared in-memory stand-in for Postgres. Transactions buffer their writes
/// and apply them on commit; dropping one discards them. Mirrors the table
/// constraints: unique object keys, one completed row per content hash,
/// attachment foreign keys and unique (moment, position).
#[derive(Default)]
pub struct InMemoryDb {
    state: Arc<Mutex<DbState>>,
}

impl InMemoryDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, DbState> {
        self.state.lock().unwrap()
    }

    fn seed(
        &self,
        file_name: &str,
        md5: &str,
        cover_md5: Option<&str>,
        status: AttachmentStatus,
    ) -> Attachment {
        let ext = file_name.rsplit('.').next().unwrap_or("bin");
        let attachment = NewAttachment {
            id: Uuid::now_v7(),
            object_key: format!("{}.{}", Uuid::new_v4(), ext),
            cover_object_key: cover_md5.map(|_| format!("{}.jpg", Uuid::new_v4())),
            original_name: file_name.to_string(),
            mime_type: "application/octet-stream".to_string(),
            content_hash: md5.to_string(),
            cover_content_hash: cover_md5.map(str::to_string),
            file_size: 1024,
        };
        let mut attachment = materialize(attachment);
        attachment.status = status;

        self.lock().attachments.push(attachment.clone());
        attachment
    }

    pub fn seed_completed(
        &self,
        file_name: &str,
        md5: &str,
        cover_md5: Option<&str>,
    ) -> Attachment {
        self.seed(file_name, md5, cover_md5, AttachmentStatus::Completed)
    }

    pub fn seed_uploading(&self, file_name: &str, md5: &str) -> Attachment {
        self.seed(file_name, md5, None, AttachmentStatus::Uploading)
    }

    pub fn attachment(&self, id: Uuid) -> Option<Attachment> {
        self.lock().attachments.iter().find(|a| a.id == id).cloned()
    }

    pub fn attachment_count(&self) -> usize {
        self.lock().attachments.len()
    }

    /// Committed moment with a fixed creation time
    pub fn seed_moment(&self, content: &str, created_at: DateTime<Utc>) -> Moment {
        let moment = Moment {
            id: Uuid::now_v7(),
            content: content.to_string(),
            created_at,
            updated_at: created_at,
        };
        self.lock().moments.push(moment.clone());
        moment
    }

    pub fn moment_count(&self) -> usize {
        self.lock().moments.len()
    }

    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }
}

#[async_trait]
impl AttachmentRepository for InMemoryDb {
    async fn begin(&self) -> Result<Box<dyn AttachmentTransaction>> {
        Ok(Box::new(InMemoryAttachmentTransaction {
            state: self.state.clone(),
            pending: Vec::new(),
        }))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attachment>> {
        Ok(self.attachment(id))
    }

    async fn find_completed_by_id(&self, id: Uuid) -> Result<Option<Attachment>> {
        Ok(self.attachment(id).filter(Attachment::is_completed))
    }

    async fn find_completed_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Attachment>> {
        Ok(self
            .lock()
            .attachments
            .iter()
            .filter(|a| a.is_completed() && ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn mark_completed(&self, id: Uuid) -> Result<Attachment> {
        let mut state = self.lock();

        let index = state
            .attachments
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Attachment {} not found", id)))?;

        if state.attachments[index].is_completed() {
            return Ok(state.attachments[index].clone());
        }

        let hash = state.attachments[index].content_hash.clone();
        if state
            .attachments
            .iter()
            .any(|a| a.id != id && a.is_completed() && a.content_hash == hash)
        {
            return Err(AppError::Conflict(
                "Identical content was completed concurrently".to_string(),
            ));
        }

        let attachment = &mut state.attachments[index];
        attachment.status = AttachmentStatus::Completed;
        attachment.updated_at = Utc::now();
        Ok(attachment.clone())
    }
}

struct InMemoryAttachmentTransaction {
    state: Arc<Mutex<DbState>>,
    pending: Vec<Attachment>,
}

#[async_trait]
impl AttachmentTransaction for InMemoryAttachmentTransaction {
    async fn find_completed_by_hash(&mut self, content_hash: &str) -> Result<Option<Attachment>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .attachments
            .iter()
            .find(|a| a.is_completed() && a.content_hash == content_hash)
            .cloned())
    }

    async fn insert(&mut self, attachment: &NewAttachment) -> Result<Attachment> {
        let key_taken = {
            let state = self.state.lock().unwrap();
            state
                .attachments
                .iter()
                .chain(self.pending.iter())
                .any(|a| a.object_key == attachment.object_key)
        };
        if key_taken {
            return Err(AppError::Conflict(format!(
                "Object key {} is already in use",
                attachment.object_key
            )));
        }

        let row = materialize(attachment.clone());
        self.pending.push(row.clone());
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.state.lock().unwrap().attachments.extend(this.pending);
        Ok(())
    }
}

#[async_trait]
impl MomentRepository for InMemoryDb {
    async fn begin(&self) -> Result<Box<dyn MomentTransaction>> {
        Ok(Box::new(InMemoryMomentTransaction {
            state: self.state.clone(),
            pending_moments: Vec::new(),
            pending_links: Vec::new(),
        }))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Moment>> {
        Ok(self.lock().moments.iter().find(|m| m.id == id).cloned())
    }

    async fn list_page(&self, before: Option<DateTime<Utc>>, limit: i64) -> Result<Vec<Moment>> {
        let mut moments: Vec<Moment> = self
            .lock()
            .moments
            .iter()
            .filter(|m| before.is_none_or(|before| m.created_at < before))
            .cloned()
            .collect();
        moments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        moments.truncate(limit.max(0) as usize);
        Ok(moments)
    }

    async fn find_linked_attachments(&self, moment_id: Uuid) -> Result<Vec<LinkedAttachment>> {
        let state = self.lock();
        let mut linked: Vec<LinkedAttachment> = state
            .links
            .iter()
            .filter(|(owner, _)| *owner == moment_id)
            .filter_map(|(_, link)| {
                state
                    .attachments
                    .iter()
                    .find(|a| a.id == link.attachment_id)
                    .map(|a| LinkedAttachment {
                        attachment_id: a.id,
                        position: link.position,
                        status: a.status,
                        mime_type: a.mime_type.clone(),
                        original_name: a.original_name.clone(),
                    })
            })
            .collect();
        linked.sort_by_key(|l| l.position);
        Ok(linked)
    }

    async fn remove_link(&self, moment_id: Uuid, attachment_id: Uuid) -> Result<bool> {
        let mut state = self.lock();
        let before = state.links.len();
        state
            .links
            .retain(|(owner, link)| !(*owner == moment_id && link.attachment_id == attachment_id));
        Ok(state.links.len() < before)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.lock();
        let before = state.moments.len();
        state.moments.retain(|m| m.id != id);
        let deleted = state.moments.len() < before;
        if deleted {
            state.links.retain(|(owner, _)| *owner != id);
        }
        Ok(deleted)
    }
}

struct InMemoryMomentTransaction {
    state: Arc<Mutex<DbState>>,
    pending_moments: Vec<Moment>,
    pending_links: Vec<(Uuid, MomentAttachmentLink)>,
}

#[async_trait]
impl MomentTransaction for InMemoryMomentTransaction {
    async fn insert_moment(&mut self, id: Uuid, content: &str) -> Result<Moment> {
        let now = Utc::now();
        let moment = Moment {
            id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.pending_moments.push(moment.clone());
        Ok(moment)
    }

    async fn find_moment(&mut self, id: Uuid) -> Result<Option<Moment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .moments
            .iter()
            .chain(self.pending_moments.iter())
            .find(|m| m.id == id)
            .cloned())
    }

    async fn insert_link(&mut self, moment_id: Uuid, link: MomentAttachmentLink) -> Result<()> {
        {
            let state = self.state.lock().unwrap();

            if !(0..=MAX_ATTACHMENT_POSITION).contains(&link.position) {
                return Err(AppError::Validation(format!(
                    "Position {} is out of range",
                    link.position
                )));
            }
            if !state.attachments.iter().any(|a| a.id == link.attachment_id) {
                return Err(AppError::NotFound(format!(
                    "Attachment {} not found",
                    link.attachment_id
                )));
            }

            let mut existing = state.links.iter().chain(self.pending_links.iter());
            if let Some((_, taken)) = existing.find(|(owner, other)| {
                *owner == moment_id
                    && (other.position == link.position
                        || other.attachment_id == link.attachment_id)
            }) {
                return Err(if taken.position == link.position {
                    AppError::Conflict(format!("Position {} is already taken", link.position))
                } else {
                    AppError::Conflict(format!(
                        "Attachment {} is already linked",
                        link.attachment_id
                    ))
                });
            }
        }

        self.pending_links.push((moment_id, link));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        let mut state = this.state.lock().unwrap();
        state.moments.extend(this.pending_moments);
        state.links.extend(this.pending_links);
        Ok(())
    }
}

// =============================================================================
// OBJECT STORE
// =============================================================================

/// Object store double; objects appear only through `put_object`
#[derive(Default)]
pub struct FakeObjectStore {
    objects: Mutex<HashMap<String, ObjectStat>>,
    presign_put_calls: AtomicUsize,
    presign_get_calls: AtomicUsize,
    fail_presign_after: Mutex<Option<usize>>,
}

impl FakeObjectStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Simulate a client PUT of content with the given md5
    pub fn put_object(&self, key: &str, md5: &str, size: i64) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            ObjectStat {
                e_tag: Some(format!("\"{}\"", md5)),
                content_length: Some(size),
            },
        );
    }

    /// Let `n` presign calls succeed, fail every one after
    pub fn fail_presign_after(&self, n: usize) {
        *self.fail_presign_after.lock().unwrap() = Some(n);
    }

    pub fn presign_put_calls(&self) -> usize {
        self.presign_put_calls.load(Ordering::SeqCst)
    }

    pub fn presign_get_calls(&self) -> usize {
        self.presign_get_calls.load(Ordering::SeqCst)
    }

    fn check_presign_budget(&self, key: &str) -> Result<()> {
        let issued = self.presign_put_calls() + self.presign_get_calls();
        match *self.fail_presign_after.lock().unwrap() {
            Some(limit) if issued >= limit => Err(AppError::Internal(format!(
                "Failed to generate presigned URL for '{}': store unavailable",
                key
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn presign_put(&self, key: &str, expiry_secs: u32) -> Result<String> {
        self.check_presign_budget(key)?;
        self.presign_put_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "https://storage.test/lifetrack/{}?X-Amz-Expires={}&X-Amz-Method=PUT",
            key, expiry_secs
        ))
    }

    async fn presign_get(&self, key: &str, expiry_secs: u32) -> Result<String> {
        self.check_presign_budget(key)?;
        self.presign_get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "https://storage.test/lifetrack/{}?X-Amz-Expires={}",
            key, expiry_secs
        ))
    }

    async fn stat(&self, key: &str) -> Result<Option<ObjectStat>> {
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }
}
