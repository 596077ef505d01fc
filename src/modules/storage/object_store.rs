use async_trait::async_trait;

use crate::core::error::Result;

/// Metadata reported by the store for an uploaded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStat {
    /// Entity tag as returned by the store, possibly quoted
    pub e_tag: Option<String>,
    pub content_length: Option<i64>,
}

impl ObjectStat {
    /// ETag without surrounding quotes, lowercased for digest comparison
    pub fn normalized_e_tag(&self) -> Option<String> {
        self.e_tag
            .as_deref()
            .map(|tag| tag.trim().trim_matches('"').to_ascii_lowercase())
            .filter(|tag| !tag.is_empty())
    }
}

/// Object store operations the upload flow relies on.
///
/// Clients move bytes directly against the store through presigned URLs;
/// the service itself only signs URLs and inspects metadata.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn presign_put(&self, key: &str, expiry_secs: u32) -> Result<String>;

    async fn presign_get(&self, key: &str, expiry_secs: u32) -> Result<String>;

    /// `Ok(None)` when the object does not exist
    async fn stat(&self, key: &str) -> Result<Option<ObjectStat>>;
}
