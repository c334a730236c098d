use std::io::Read;

use anyhow::{Context, Result};
use async_trait::async_trait;
use flate2::read::MultiGzDecoder;
use tracing::{debug, warn};

use crate::app_config::StorageConfig;
use crate::backends::{file, s3};
use crate::notification::ObjectLocation;

/// 🪣 Something that can turn a bucket + key into the batch payload text.
///
/// # Contract 📜
/// - One call, one whole payload. No paging. Batches are small enough to hold in memory.
/// - `Err` here is fatal for the invocation. No record gets processed, no summary gets built.
#[async_trait]
pub(crate) trait PayloadStore: std::fmt::Debug {
    /// 📥 Fetch the full payload at `location` as text.
    async fn fetch_payload(&self, location: &ObjectLocation) -> Result<String>;
}

/// 🎭 The many faces of a payload store.
#[derive(Debug)]
pub(crate) enum PayloadStoreBackend {
    S3(s3::S3PayloadStore),
    File(file::FilePayloadStore),
    #[cfg(test)]
    InMemory(super::in_mem::InMemoryPayloadStore),
}

impl PayloadStoreBackend {
    /// 🏗️ Pick a backend from config. S3 needs a network-free SDK setup, File needs nothing.
    pub(crate) async fn from_config(config: &StorageConfig) -> Result<Self> {
        match config {
            StorageConfig::S3(s3_config) => Ok(Self::S3(
                s3::S3PayloadStore::new(s3_config.clone()).await,
            )),
            StorageConfig::File(file_config) => {
                Ok(Self::File(file::FilePayloadStore::new(file_config.clone())))
            }
        }
    }
}

#[async_trait]
impl PayloadStore for PayloadStoreBackend {
    async fn fetch_payload(&self, location: &ObjectLocation) -> Result<String> {
        match self {
            PayloadStoreBackend::S3(store) => store.fetch_payload(location).await,
            PayloadStoreBackend::File(store) => store.fetch_payload(location).await,
            #[cfg(test)]
            PayloadStoreBackend::InMemory(store) => store.fetch_payload(location).await,
        }
    }
}

// 🫁 gzip members start with 0x1f 0x8b. Delivery streams love to squish objects like this.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// 🔓 Turn raw object bytes into payload text.
///
/// Gzip-compressed objects are inflated first (all members, concatenated streams
/// included). The result is decoded as UTF-8 lossily; a stray invalid byte costs
/// one record, not the whole batch.
pub(crate) fn decode_payload_bytes(raw: &[u8]) -> Result<String> {
    let the_inflated;
    let the_bytes = if raw.starts_with(&GZIP_MAGIC) {
        let mut buffer = Vec::with_capacity(raw.len() * 4);
        MultiGzDecoder::new(raw)
            .read_to_end(&mut buffer)
            .context("💀 Payload looked gzipped (magic bytes and everything) but would not inflate")?;
        debug!(
            "🫁 inflated gzip payload: {} bytes -> {} bytes",
            raw.len(),
            buffer.len()
        );
        the_inflated = buffer;
        the_inflated.as_slice()
    } else {
        raw
    };

    let the_text = String::from_utf8_lossy(the_bytes);
    if let std::borrow::Cow::Owned(_) = the_text {
        warn!("🔣 payload contained invalid UTF-8; offending bytes were replaced");
    }
    Ok(the_text.into_owned())
}
