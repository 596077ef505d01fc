//! Storage module for attachment blobs
//!
//! Provides the `ObjectStore` seam and its MinIO/S3-compatible
//! implementation used for presigned uploads and downloads.

mod minio_client;
mod object_store;

pub use minio_client::MinIOClient;
pub use object_store::{ObjectStat, ObjectStore};
