use anyhow::Result;
use async_trait::async_trait;

use crate::backends::rekognition::{self, DetectionConfig};
use crate::common::{DetectionParams, LabelSet};

/// 🏷️ The label-detection capability: bytes in, confidence-scored labels out.
///
/// # Contract 📜
/// - Labels come back in the detector's own order. Callers rely on that order.
/// - `params` bounds the answer (`max_labels`, `min_confidence`); the detector applies them.
/// - The model behind it is none of our business.
#[async_trait]
pub(crate) trait LabelDetector: std::fmt::Debug {
    async fn detect_labels(&self, image: Vec<u8>, params: DetectionParams) -> Result<LabelSet>;
}

#[derive(Debug)]
pub(crate) enum LabelDetectorBackend {
    Rekognition(rekognition::RekognitionDetector),
    #[cfg(test)]
    InMemory(super::in_mem::InMemoryDetector),
}

impl LabelDetectorBackend {
    pub(crate) async fn from_config(config: &DetectionConfig) -> Self {
        Self::Rekognition(rekognition::RekognitionDetector::new(config).await)
    }
}

#[async_trait]
impl LabelDetector for LabelDetectorBackend {
    async fn detect_labels(&self, image: Vec<u8>, params: DetectionParams) -> Result<LabelSet> {
        match self {
            LabelDetectorBackend::Rekognition(detector) => {
                detector.detect_labels(image, params).await
            }
            #[cfg(test)]
            LabelDetectorBackend::InMemory(detector) => detector.detect_labels(image, params).await,
        }
    }
}
