//! Shared recommendation assets: the global PDF and the image gallery.
//!
//! Objects live in a blob store bucket. Listing is open to every role;
//! upload and delete are gated on health staff.

pub mod fs_store;
pub mod gallery;

pub use fs_store::FsBlobStore;
pub use gallery::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),
}

/// One stored object as returned by `BlobStore::list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobObject {
    /// Name relative to the listed prefix.
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Replace an existing object instead of failing.
    pub overwrite: bool,
    pub content_type: Option<String>,
}

/// Object storage capability.
#[async_trait]
pub trait BlobStore: Send + Sync {
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Objects directly under `prefix`, newest first, at most `limit`.
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<BlobObject>, AssetError>;

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<(), AssetError>;

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), AssetError>;
}
