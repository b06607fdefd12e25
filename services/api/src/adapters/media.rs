//! services/api/src/adapters/media.rs
//!
//! A `MediaStore` that writes donation photos under a local directory. The
//! directory is served back under `/media` by the web router.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use food_share_core::ports::{media_object_key, MediaStore, PortError, PortResult};
use std::path::PathBuf;
use tracing::info;

#[derive(Clone)]
pub struct FsMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsMediaStore {
    /// `public_base_url` is the server's external address; photo URLs are
    /// `{public_base_url}/media/{key}`.
    pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self {
            root,
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn upload(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> PortResult<String> {
        let key = media_object_key(file_name, Utc::now());
        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        info!(
            key = %key,
            bytes = data.len(),
            content_type = content_type.unwrap_or("unknown"),
            "Stored donation photo"
        );
        Ok(format!(
            "{}/media/{}",
            self.public_base_url.trim_end_matches('/'),
            key
        ))
    }
}
