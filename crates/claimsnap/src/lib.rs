//! 📸 claimsnap: claim photos in, claim types out.
//!
//! 🎬 *[a delivery stream dumps a file of JSON lines into a bucket]*
//! *[the bucket rings a doorbell]*
//! *[we answer, read every line, look at every photo, and label every node]*
//!
//! One invocation = one batch object = one [`BatchResult`]. The payload fetch is
//! the only thing allowed to fail the whole invocation. Everything after it fails
//! one record at a time.

pub mod app_config;
pub mod batch;
pub mod classify;
pub mod common;
pub mod notification;

mod backends;
mod events;
mod metadata;
mod pipeline;

use anyhow::{Context, Result};
use tracing::debug;

pub use crate::backends::{DetectionConfig, FileStorageConfig, RepositoryConfig, S3StorageConfig};
pub use crate::metadata::MetadataConfig;

use crate::app_config::AppConfig;
use crate::backends::{
    AssetRepositoryBackend, LabelDetectorBackend, PayloadStore, PayloadStoreBackend,
};
use crate::classify::Classifier;
use crate::common::BatchResult;
use crate::metadata::MetadataWriter;
use crate::notification::{ObjectLocation, StorageNotification};
use crate::pipeline::Pipeline;

/// 🔔 Answer the doorbell: pull the object location out of a notification and run it.
pub async fn handle_notification(
    app_config: &AppConfig,
    notification: &StorageNotification,
) -> Result<BatchResult> {
    let the_location = notification
        .object_location()
        .context("💀 The notification didn't say which object to process")?;
    run(app_config, the_location).await
}

/// 🚀 Process the batch object at `location` with backends built from `app_config`.
///
/// 💀 `Err` only when the backends can't be built or the payload can't be read.
/// Bad records are counted, not raised.
pub async fn run(app_config: &AppConfig, location: ObjectLocation) -> Result<BatchResult> {
    let the_store = PayloadStoreBackend::from_config(&app_config.storage).await?;
    let the_repository = AssetRepositoryBackend::from_config(&app_config.repository)?;
    let the_detector = LabelDetectorBackend::from_config(&app_config.detection).await;

    let the_pipeline = Pipeline::new(
        the_repository,
        Classifier::new(the_detector, app_config.detection.params()),
        MetadataWriter::new(app_config.metadata.clone()),
    );

    process_object(&the_store, &the_pipeline, &location).await
}

async fn process_object(
    store: &PayloadStoreBackend,
    pipeline: &Pipeline,
    location: &ObjectLocation,
) -> Result<BatchResult> {
    debug!("📥 handing {location} to the payload store");
    let the_payload = store
        .fetch_payload(location)
        .await
        .with_context(|| format!("💀 Could not read the batch payload at {location}"))?;

    Ok(pipeline.process_payload(&the_payload).await)
}
