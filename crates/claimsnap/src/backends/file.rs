//! 📁 File payload store: a local directory pretending to be a bucket.
//!
//! `{root}/{bucket}/{key}` on disk. Handy for running a batch on a laptop with the
//! wifi off, or for replaying a payload someone pasted into a ticket.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::payload_store::{PayloadStore, decode_payload_bytes};
use crate::notification::ObjectLocation;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FileStorageConfig {
    /// 📂 Directory whose subdirectories play the part of buckets.
    pub root: PathBuf,
}

#[derive(Debug)]
pub(crate) struct FilePayloadStore {
    config: FileStorageConfig,
}

impl FilePayloadStore {
    pub(crate) fn new(config: FileStorageConfig) -> Self {
        Self { config }
    }

    fn path_for(&self, location: &ObjectLocation) -> PathBuf {
        self.config.root.join(&location.bucket).join(&location.key)
    }
}

#[async_trait]
impl PayloadStore for FilePayloadStore {
    async fn fetch_payload(&self, location: &ObjectLocation) -> Result<String> {
        let the_path = self.path_for(location);
        info!("📁 Reading batch payload from {}", the_path.display());

        let the_bytes = tokio::fs::read(&the_path).await.with_context(|| {
            format!(
                "💀 Error getting object {} from bucket {}. Looked on disk at '{}' and found nothing but dust bunnies.",
                location.key,
                location.bucket,
                the_path.display()
            )
        })?;

        decode_payload_bytes(&the_bytes)
    }
}
