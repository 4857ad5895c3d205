//! Object storage for uploaded images.
//!
//! Handlers talk to a [`StorageProvider`]; the server ships with
//! [`LocalStorage`], which writes below `STORAGE_ROOT` and serves files
//! back through the `/storage` static route.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use inmo_core::error::CoreError;
use inmo_core::types::DbId;

use crate::error::AppError;

/// Largest accepted image upload (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// URL prefix under which stored objects are served.
pub const STORAGE_ROUTE: &str = "/storage";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid object path '{0}'")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidPath(path) => {
                AppError::BadRequest(format!("Invalid object path '{path}'"))
            }
            StorageError::Io(e) => AppError::InternalError(format!("Storage I/O error: {e}")),
        }
    }
}

#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Store `bytes` at `path` (relative, `/`-separated), replacing any
    /// existing object.
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Remove the object at `path`. Missing objects are not an error.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Absolute URL a browser can fetch the object from.
    fn public_url(&self, path: &str) -> String;
}

/// Filesystem-backed storage.
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` under the root, refusing anything that could escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageProvider for LocalStorage {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        tracing::debug!(path, size = bytes.len(), "Stored object");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}{STORAGE_ROUTE}/{path}", self.public_base_url)
    }
}

/// Check an uploaded image and return its normalized extension.
pub fn validate_image(filename: &str, size: usize) -> Result<String, CoreError> {
    if size == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".into()));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(CoreError::Validation(format!(
            "Image exceeds the maximum size of {} MiB",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "Unsupported image type '{ext}'. Must be one of: {}",
            IMAGE_EXTENSIONS.join(", ")
        )));
    }
    Ok(ext)
}

/// `properties/{id}/{uuid}.{ext}`
pub fn property_image_path(property_id: DbId, ext: &str) -> String {
    format!("properties/{property_id}/{}.{ext}", uuid::Uuid::new_v4())
}

/// `sponsors/{id}/{uuid}.{ext}`
pub fn sponsor_logo_path(sponsor_id: DbId, ext: &str) -> String {
    format!("sponsors/{sponsor_id}/{}.{ext}", uuid::Uuid::new_v4())
}
