//! 👁️ Rekognition label detector: the eyes of the operation.
//!
//! `DetectLabels` with raw image bytes, `MaxLabels` and `MinConfidence`.
//! What comes back is an ordered list of `(Name, Confidence)`; we keep the order
//! and drop anything without a name (the SDK models every field as optional,
//! because of course it does).

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_rekognition::error::DisplayErrorContext;
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::Image;
use serde::Deserialize;
use tracing::debug;

use super::label_detector::LabelDetector;
use crate::common::{DetectionParams, Label, LabelSet};

/// 🔧 Detection knobs. The thresholds default to the values the classification
/// rules were tuned against: 25 labels, 75% confidence.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DetectionConfig {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "default_max_labels")]
    pub max_labels: i32,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

fn default_max_labels() -> i32 {
    DetectionParams::default().max_labels
}

fn default_min_confidence() -> f32 {
    DetectionParams::default().min_confidence
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            region: None,
            max_labels: default_max_labels(),
            min_confidence: default_min_confidence(),
        }
    }
}

impl DetectionConfig {
    pub fn params(&self) -> DetectionParams {
        DetectionParams {
            max_labels: self.max_labels,
            min_confidence: self.min_confidence,
        }
    }
}

#[derive(Debug)]
pub(crate) struct RekognitionDetector {
    client: aws_sdk_rekognition::Client,
}

impl RekognitionDetector {
    pub(crate) async fn new(config: &DetectionConfig) -> Self {
        let mut the_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            the_loader =
                the_loader.region(aws_sdk_rekognition::config::Region::new(region.clone()));
        }
        let the_sdk_config = the_loader.load().await;
        Self {
            client: aws_sdk_rekognition::Client::new(&the_sdk_config),
        }
    }
}

#[async_trait]
impl LabelDetector for RekognitionDetector {
    async fn detect_labels(&self, image: Vec<u8>, params: DetectionParams) -> Result<LabelSet> {
        let the_image = Image::builder().bytes(Blob::new(image)).build();

        let the_output = self
            .client
            .detect_labels()
            .image(the_image)
            .max_labels(params.max_labels)
            .min_confidence(params.min_confidence)
            .send()
            .await
            .map_err(|err| anyhow!("{}", DisplayErrorContext(&err)))
            .context("💀 Rekognition looked at the image and said no")?;

        let the_labels = labels_from_sdk(the_output.labels());
        debug!("👁️ Successfully analysed image: [{}]", the_labels.names());
        Ok(the_labels)
    }
}

/// 🔄 SDK labels → our labels, order preserved, nameless ones dropped.
fn labels_from_sdk(sdk_labels: &[aws_sdk_rekognition::types::Label]) -> LabelSet {
    sdk_labels
        .iter()
        .filter_map(|sdk_label| {
            sdk_label
                .name()
                .map(|name| Label::new(name, sdk_label.confidence().unwrap_or_default()))
        })
        .collect()
}
