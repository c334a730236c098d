//! 🔌 Backends: where the real I/O happens.
//!
//! Three collaborators, three traits, three enums. Same casting agency as always:
//! - 🪣 [`PayloadStore`] hands us the batch payload (S3, a local directory, or RAM in tests).
//! - 🗄️ [`AssetRepository`] serves asset bytes and accepts metadata updates (REST, or RAM in tests).
//! - 🏷️ [`LabelDetector`] looks at bytes and says what it sees (Rekognition, or a script in tests).
//!
//! Each trait is dispatched through a `*Backend` enum so the pipeline never has to
//! know whether it is talking to a data center or a `HashMap`.
//!
//! 🦆 The duck is here because every file must have one. This is law.

mod asset_repository;
mod content_repo;
mod file;
mod label_detector;
mod payload_store;
mod rekognition;
mod s3;

#[cfg(test)]
pub(crate) mod in_mem;

pub(crate) use asset_repository::{AssetRepository, AssetRepositoryBackend};
pub(crate) use label_detector::{LabelDetector, LabelDetectorBackend};
pub(crate) use payload_store::{PayloadStore, PayloadStoreBackend};

// 🎯 Configs co-located with their backends, re-exported so app_config doesn't go spelunking.
pub use content_repo::RepositoryConfig;
pub use file::FileStorageConfig;
pub use rekognition::DetectionConfig;
pub use s3::S3StorageConfig;
