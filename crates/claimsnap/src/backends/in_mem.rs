//! 🧪 In-memory backends: a bucket, a repository and a detector, all living in RAM.
//!
//! For tests. Only for tests. Compiled only for tests. If you found a way to
//! deploy this, please also deploy a therapist.
//!
//! The repository and detector keep a shared call log behind
//! `Arc<tokio::sync::Mutex<...>>` so a test can hand a clone to the pipeline and
//! still read what happened afterwards.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::asset_repository::AssetRepository;
use super::label_detector::LabelDetector;
use super::payload_store::{PayloadStore, decode_payload_bytes};
use crate::common::{AssetContent, DetectionParams, Label, LabelSet};
use crate::metadata::UpdateRequest;
use crate::notification::ObjectLocation;

/// 🪣 A bucket that is really a `HashMap`.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryPayloadStore {
    objects: HashMap<(String, String), Vec<u8>>,
}

impl InMemoryPayloadStore {
    pub(crate) fn with_object(
        mut self,
        bucket: &str,
        key: &str,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.objects
            .insert((bucket.to_string(), key.to_string()), bytes.into());
        self
    }
}

#[async_trait]
impl PayloadStore for InMemoryPayloadStore {
    async fn fetch_payload(&self, location: &ObjectLocation) -> Result<String> {
        match self
            .objects
            .get(&(location.bucket.clone(), location.key.clone()))
        {
            Some(bytes) => decode_payload_bytes(bytes),
            None => bail!(
                "💀 Error getting object {} from bucket {}. Make sure they exist and your bucket is in the same region as this function.",
                location.key,
                location.bucket
            ),
        }
    }
}

/// 📒 One interaction with the in-memory repository, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RepoCall {
    Fetch { asset_id: String },
    Update { asset_id: String, body: Value },
}

/// 🗄️ A repository with a memory and a sense of drama.
///
/// - Known asset → its bytes with status 200.
/// - Unknown asset → empty body with status 404 (still `Ok`, like the real thing).
/// - Asset marked unreachable → transport error on fetch or update.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryRepository {
    contents: HashMap<String, Vec<u8>>,
    unreachable_on_fetch: HashSet<String>,
    unreachable_on_update: HashSet<String>,
    log: Arc<Mutex<Vec<RepoCall>>>,
}

impl InMemoryRepository {
    pub(crate) fn with_asset(mut self, asset_id: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.contents.insert(asset_id.to_string(), bytes.into());
        self
    }

    pub(crate) fn unreachable_on_fetch(mut self, asset_id: &str) -> Self {
        self.unreachable_on_fetch.insert(asset_id.to_string());
        self
    }

    pub(crate) fn unreachable_on_update(mut self, asset_id: &str) -> Self {
        self.unreachable_on_update.insert(asset_id.to_string());
        self
    }

    pub(crate) async fn calls(&self) -> Vec<RepoCall> {
        self.log.lock().await.clone()
    }
}

#[async_trait]
impl AssetRepository for InMemoryRepository {
    async fn fetch_content(&self, asset_id: &str) -> Result<AssetContent> {
        self.log.lock().await.push(RepoCall::Fetch {
            asset_id: asset_id.to_string(),
        });
        if self.unreachable_on_fetch.contains(asset_id) {
            bail!("💀 connection refused while fetching '{asset_id}'");
        }
        Ok(match self.contents.get(asset_id) {
            Some(bytes) => AssetContent {
                asset_id: asset_id.to_string(),
                bytes: bytes.clone(),
                status: 200,
            },
            None => AssetContent {
                asset_id: asset_id.to_string(),
                bytes: Vec::new(),
                status: 404,
            },
        })
    }

    async fn update_node(&self, asset_id: &str, request: &UpdateRequest) -> Result<()> {
        self.log.lock().await.push(RepoCall::Update {
            asset_id: asset_id.to_string(),
            body: serde_json::to_value(request)?,
        });
        if self.unreachable_on_update.contains(asset_id) {
            bail!("💀 connection reset while updating '{asset_id}'");
        }
        Ok(())
    }
}

/// 👁️ A detector that answers from a script keyed by image bytes.
///
/// Bytes it has no script for are rejected as an invalid image, which is what a
/// real detector does with a 404 page.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryDetector {
    scripts: HashMap<Vec<u8>, Vec<Label>>,
    seen_params: Arc<Mutex<Vec<DetectionParams>>>,
}

impl InMemoryDetector {
    pub(crate) fn with_labels(mut self, image: &[u8], labels: Vec<Label>) -> Self {
        self.scripts.insert(image.to_vec(), labels);
        self
    }

    pub(crate) async fn seen_params(&self) -> Vec<DetectionParams> {
        self.seen_params.lock().await.clone()
    }
}

#[async_trait]
impl LabelDetector for InMemoryDetector {
    async fn detect_labels(&self, image: Vec<u8>, params: DetectionParams) -> Result<LabelSet> {
        self.seen_params.lock().await.push(params);
        match self.scripts.get(&image) {
            Some(labels) => Ok(LabelSet::new(labels.clone())),
            None => bail!("💀 InvalidImageFormatException: request has invalid image format"),
        }
    }
}
