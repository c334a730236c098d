//! 🏷️➡️🗄️ Metadata writer: stamping the verdict onto the asset.
//!
//! Every update carries the node type and a fresh numeric image id (epoch millis,
//! unique enough for one asset at a time). Then one of two shapes:
//!
//! ```text
//!   category found   → { nodeType, properties: { imageId, claimType } }
//!   nothing matched  → { nodeType, properties: { imageId }, aspectNames: [...] }
//! ```
//!
//! ⚠️ The "nothing matched" path REPLACES the node's aspect list with a fixed one
//! that includes the claim-type-missing marker. It does not read the node's current
//! aspects and append. Any aspect the node had that is not in the list is dropped
//! by the repository. Known approximation. Kept on purpose until someone asks for
//! a read-modify-write.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::backends::{AssetRepository, AssetRepositoryBackend};
use crate::classify::Category;

/// 🔧 The vocabulary of the repository's content model.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MetadataConfig {
    #[serde(default = "default_node_type")]
    pub node_type: String,
    #[serde(default = "default_image_id_property")]
    pub image_id_property: String,
    #[serde(default = "default_claim_type_property")]
    pub claim_type_property: String,
    /// 🧩 The aspect list sent when no category matched.
    #[serde(default = "default_fallback_aspects")]
    pub fallback_aspects: Vec<String>,
}

fn default_node_type() -> String {
    "acme:insuranceClaimImage".to_string()
}

fn default_image_id_property() -> String {
    "acme:imageId".to_string()
}

fn default_claim_type_property() -> String {
    "acme:claimType".to_string()
}

fn default_fallback_aspects() -> Vec<String> {
    [
        "cm:versionable",
        "cm:auditable",
        "cm:titled",
        "cm:author",
        "exif:exif",
        "acme:claimTypeMissing",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            node_type: default_node_type(),
            image_id_property: default_image_id_property(),
            claim_type_property: default_claim_type_property(),
            fallback_aspects: default_fallback_aspects(),
        }
    }
}

/// 📤 The outbound patch for one node. Serialized straight into the PUT body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateRequest {
    pub node_type: String,
    pub properties: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_names: Option<Vec<String>>,
}

impl MetadataConfig {
    /// 🏗️ Shape the patch for `category`. Pure; the image id is handed in.
    pub(crate) fn build_request(&self, category: Category, image_id: i64) -> UpdateRequest {
        let mut properties = Map::new();
        properties.insert(self.image_id_property.clone(), Value::from(image_id));

        let aspect_names = match category.claim_type() {
            Some(claim_type) => {
                properties.insert(
                    self.claim_type_property.clone(),
                    Value::from(claim_type),
                );
                None
            }
            None => Some(self.fallback_aspects.clone()),
        };

        UpdateRequest {
            node_type: self.node_type.clone(),
            properties,
            aspect_names,
        }
    }
}

/// ✍️ Builds the patch and ships it to the repository.
#[derive(Debug)]
pub(crate) struct MetadataWriter {
    config: MetadataConfig,
}

impl MetadataWriter {
    pub(crate) fn new(config: MetadataConfig) -> Self {
        Self { config }
    }

    /// 📤 Stamp `category` onto `asset_id`. Transport failure is this record's failure.
    pub(crate) async fn write(
        &self,
        repository: &AssetRepositoryBackend,
        asset_id: &str,
        category: Category,
    ) -> Result<()> {
        let the_image_id = chrono::Utc::now().timestamp_millis();
        let the_request = self.config.build_request(category, the_image_id);
        debug!(
            "✍️ Writing {category} onto '{asset_id}' (imageId {the_image_id}, fallback aspects: {})",
            the_request.aspect_names.is_some()
        );
        repository.update_node(asset_id, &the_request).await
    }
}
