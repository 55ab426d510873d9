use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{AssetError, BlobObject, BlobStore, UploadOptions};

/// `BlobStore` over a local directory: `<root>/<bucket>/<path>`.
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
}

impl FsBlobStore {
    /// Public URLs are `file://` paths under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let base_url = format!("file://{}", root.display());
        Self { root, base_url }
    }

    pub fn with_base_url(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Map a bucket and relative key to a path under the root. Only plain
    /// path segments are accepted.
    fn resolve(&self, bucket: &str, key: &str) -> Result<PathBuf, AssetError> {
        let mut path = self.root.clone();
        for part in [bucket, key] {
            if part.contains('\\') {
                return Err(AssetError::InvalidPath(part.into()));
            }
            for component in Path::new(part).components() {
                match component {
                    Component::Normal(segment) => path.push(segment),
                    _ => return Err(AssetError::InvalidPath(part.into())),
                }
            }
        }
        if path == self.root {
            return Err(AssetError::InvalidPath(key.into()));
        }
        Ok(path)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, bucket, path)
    }

    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<BlobObject>, AssetError> {
        let dir = self.resolve(bucket, prefix)?;
        if !tokio::fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let created_at = meta
                .created()
                .or_else(|_| meta.modified())
                .ok()
                .map(DateTime::<Utc>::from);
            objects.push(BlobObject {
                name: entry.file_name().to_string_lossy().into_owned(),
                created_at,
                size: meta.len(),
            });
        }

        objects.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.name.cmp(&a.name))
        });
        objects.truncate(limit);
        Ok(objects)
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<(), AssetError> {
        let target = self.resolve(bucket, path)?;
        if !options.overwrite && tokio::fs::try_exists(&target).await? {
            return Err(AssetError::AlreadyExists(format!("{bucket}/{path}")));
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &content).await?;
        tracing::debug!(
            bucket,
            path,
            bytes = content.len(),
            content_type = options.content_type.as_deref().unwrap_or("unknown"),
            "Stored object"
        );
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), AssetError> {
        for path in paths {
            let target = self.resolve(bucket, path)?;
            match tokio::fs::remove_file(&target).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(AssetError::NotFound(format!("{bucket}/{path}")));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
