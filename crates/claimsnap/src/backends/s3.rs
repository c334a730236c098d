//! 🪣 S3 payload store: the batch payload, straight from the bucket.
//!
//! Transport: `GetObject` → `ByteStream::collect()` → bytes → [`decode_payload_bytes`].
//! Batches are small (one delivery-stream flush), so the whole object is buffered.
//! No `BufReader` line loop here. The decoder wants the whole text anyway.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use serde::Deserialize;
use tracing::{debug, info};

use super::payload_store::{PayloadStore, decode_payload_bytes};
use crate::notification::ObjectLocation;

/// 🔧 Configuration for the S3 payload store.
///
/// `region` is optional: when absent, the SDK's usual chain decides
/// (env vars → profile → instance metadata → hope).
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct S3StorageConfig {
    #[serde(default)]
    pub region: Option<String>,
}

/// 🪣 Reads batch payloads out of S3.
#[derive(Debug)]
pub(crate) struct S3PayloadStore {
    client: aws_sdk_s3::Client,
}

impl S3PayloadStore {
    /// 🚀 Build the SDK client from the environment. No request is sent here;
    /// missing credentials surface on the first `fetch_payload`, where they are fatal anyway.
    pub(crate) async fn new(config: S3StorageConfig) -> Self {
        let mut the_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = config.region {
            the_loader = the_loader.region(aws_sdk_s3::config::Region::new(region));
        }
        let the_sdk_config = the_loader.load().await;
        Self {
            client: aws_sdk_s3::Client::new(&the_sdk_config),
        }
    }
}

#[async_trait]
impl PayloadStore for S3PayloadStore {
    async fn fetch_payload(&self, location: &ObjectLocation) -> Result<String> {
        info!("🪣 Fetching batch payload from {location}");

        let the_response = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|err| anyhow!("{}", DisplayErrorContext(&err)))
            .with_context(|| {
                format!(
                    "💀 Error getting object {} from bucket {}. Make sure they exist and your bucket is in the same region as this function.",
                    location.key, location.bucket
                )
            })?;

        let the_bytes = the_response
            .body
            .collect()
            .await
            .with_context(|| {
                format!("💀 The body of {location} stopped flowing halfway through")
            })?
            .into_bytes();

        debug!("🪣 hauled {} bytes out of {location}", the_bytes.len());
        decode_payload_bytes(&the_bytes)
    }
}
