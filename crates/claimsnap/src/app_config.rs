//! 🔧 App Configuration: env vars, an optional TOML file, and Figment holding it all together.
//!
//! 📡 "Where is the repository?" "In REPO_HOST." "Since when?" "Since before any of us."
//!
//! Three layers, later ones win:
//! 1. 🦕 the legacy pair `REPO_HOST` / `REPO_PASSWORD`, which deployments have been
//!    setting for years and will keep setting until the heat death of the universe
//! 2. 🌱 `CLAIMSNAP_*`, nested with `__` (e.g. `CLAIMSNAP_DETECTION__MIN_CONFIDENCE=80`)
//! 3. 📄 the TOML file, if one was given

use std::path::Path;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::backends::{DetectionConfig, FileStorageConfig, RepositoryConfig, S3StorageConfig};
use crate::metadata::MetadataConfig;

/// 📦 Everything one invocation needs to know before it touches the network.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 🗄️ Where the photos live. The only section without defaults, because the
    /// host has no sensible default and guessing one is how data ends up in the wrong place.
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
}

/// 🪣 Where batch payloads are read from.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum StorageConfig {
    #[serde(alias = "s3")]
    S3(S3StorageConfig),
    // 📁 local directory laid out as `root/bucket/key`, for replaying batches offline
    #[serde(alias = "file")]
    File(FileStorageConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::S3(S3StorageConfig::default())
    }
}

/// 🚀 Load the config from the environment and, optionally, a TOML file.
///
/// - `None` → env vars only.
/// - `Some(path)` → env vars + the file, merged. The file wins on conflicts.
///
/// 💀 Errors when the merged result doesn't deserialize, which most often means
/// nobody told us where the repository is.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new()
        .merge(
            Env::raw()
                .only(&["REPO_HOST", "REPO_PASSWORD"])
                .map(|key| {
                    if key == "repo_host" {
                        "repository.host".into()
                    } else {
                        "repository.password".into()
                    }
                }),
        )
        .merge(Env::prefixed("CLAIMSNAP_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables \
             (REPO_HOST, REPO_PASSWORD, CLAIMSNAP_*). Is the repository host set anywhere?",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables \
                 (REPO_HOST, REPO_PASSWORD, CLAIMSNAP_*). No file was provided, so the \
                 environment had to carry this alone. It did not."
            .to_string(),
    };

    config.extract().context(context_msg)
}
