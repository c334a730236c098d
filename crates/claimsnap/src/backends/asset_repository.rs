use anyhow::Result;
use async_trait::async_trait;

use crate::backends::content_repo::{self, RepositoryConfig};
use crate::common::AssetContent;
use crate::metadata::UpdateRequest;

/// 🗄️ The content repository, seen from the pipeline: read bytes, write metadata.
///
/// # Contract 📜
/// - `fetch_content` buffers the whole body before returning. Transport errors are `Err`.
///   A response with an error status is still `Ok`; the status rides along in
///   [`AssetContent::status`] and nobody downstream vetoes on it.
/// - `update_node` sends one partial update. Transport errors are `Err`. Same
///   status policy: logged, not enforced.
/// - Neither method retries. A failure costs one record, not the batch.
#[async_trait]
pub(crate) trait AssetRepository: std::fmt::Debug {
    /// 📥 GET the asset's binary content.
    async fn fetch_content(&self, asset_id: &str) -> Result<AssetContent>;
    /// 📤 PUT a metadata patch onto the asset's node.
    async fn update_node(&self, asset_id: &str, request: &UpdateRequest) -> Result<()>;
}

/// 🎭 Repository backends. REST in production, a `HashMap` with opinions in tests.
#[derive(Debug)]
pub(crate) enum AssetRepositoryBackend {
    Rest(content_repo::RestContentRepository),
    #[cfg(test)]
    InMemory(super::in_mem::InMemoryRepository),
}

impl AssetRepositoryBackend {
    /// 🏗️ The REST repository is the only production option, so this mostly builds an HTTP client.
    pub(crate) fn from_config(config: &RepositoryConfig) -> Result<Self> {
        Ok(Self::Rest(content_repo::RestContentRepository::new(
            config.clone(),
        )?))
    }
}

#[async_trait]
impl AssetRepository for AssetRepositoryBackend {
    async fn fetch_content(&self, asset_id: &str) -> Result<AssetContent> {
        match self {
            AssetRepositoryBackend::Rest(repo) => repo.fetch_content(asset_id).await,
            #[cfg(test)]
            AssetRepositoryBackend::InMemory(repo) => repo.fetch_content(asset_id).await,
        }
    }

    async fn update_node(&self, asset_id: &str, request: &UpdateRequest) -> Result<()> {
        match self {
            AssetRepositoryBackend::Rest(repo) => repo.update_node(asset_id, request).await,
            #[cfg(test)]
            AssetRepositoryBackend::InMemory(repo) => repo.update_node(asset_id, request).await,
        }
    }
}
