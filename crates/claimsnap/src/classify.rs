//! 🔎 Classification: from a pile of labels to one claim category.
//!
//! 🎬 *[a detector returns 25 labels. "Vehicle", "Transportation", "Dog", "Car"...]*
//! *[the classifier squints. walks the list. top to bottom. stops at "Car".]*
//! *["Car," it says. The adjuster's queue gets one item shorter.]*
//!
//! ## The rule 📜
//!
//! Walk the labels in the order the detector returned them. The FIRST label whose
//! name is in the catalog decides the category. Not the most confident label. Not
//! the catalog's favourite. The first one the detector mentions. The catalog only
//! says which names are recognised; it ranks nothing.
//!
//! No catalog name anywhere → [`Category::Unknown`].

use std::fmt;

use anyhow::{Context, Result};
use tracing::{debug, trace};

use crate::backends::{LabelDetector, LabelDetectorBackend};
use crate::common::{AssetContent, DetectionParams, LabelSet};

/// 🗂️ Claim categories, plus the "we looked and shrugged" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Car,
    Motorcycle,
    Boat,
    Electronics,
    Jewelry,
    Wristwatch,
    Clock,
    Bicycle,
    Sport,
    Furniture,
    /// 🤷 No recognised label in the set.
    Unknown,
}

impl Category {
    /// 📚 Every recognised category. `Unknown` is not in the catalog; it is what the catalog isn't.
    pub const CATALOG: [Category; 10] = [
        Category::Car,
        Category::Motorcycle,
        Category::Boat,
        Category::Electronics,
        Category::Jewelry,
        Category::Wristwatch,
        Category::Clock,
        Category::Bicycle,
        Category::Sport,
        Category::Furniture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Motorcycle => "Motorcycle",
            Self::Boat => "Boat",
            Self::Electronics => "Electronics",
            Self::Jewelry => "Jewelry",
            Self::Wristwatch => "Wristwatch",
            Self::Clock => "Clock",
            Self::Bicycle => "Bicycle",
            Self::Sport => "Sport",
            Self::Furniture => "Furniture",
            Self::Unknown => "Unknown",
        }
    }

    /// 🏷️ Exact, case-sensitive lookup of a detector label name in the catalog.
    pub fn from_label(name: &str) -> Option<Category> {
        Self::CATALOG
            .into_iter()
            .find(|category| category.as_str() == name)
    }

    /// 🧾 The value to write as the claim-type property, if there is one to write.
    pub fn claim_type(&self) -> Option<&'static str> {
        match self {
            Self::Unknown => None,
            recognised => Some(recognised.as_str()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 🔎 First catalog hit in detector order wins. Pure, no I/O.
pub fn resolve_category(labels: &LabelSet) -> Category {
    labels
        .iter()
        .find_map(|label| Category::from_label(&label.name))
        .unwrap_or(Category::Unknown)
}

/// 🧠 Sends bytes to the detector with the fixed thresholds, then applies the rule.
#[derive(Debug)]
pub(crate) struct Classifier {
    detector: LabelDetectorBackend,
    params: DetectionParams,
}

impl Classifier {
    pub(crate) fn new(detector: LabelDetectorBackend, params: DetectionParams) -> Self {
        Self { detector, params }
    }

    /// 🔎 Classify one asset. Consumes the content; the bytes are gone after this.
    pub(crate) async fn classify(&self, content: AssetContent) -> Result<Category> {
        let the_asset_id = content.asset_id;
        // 🔬 the status rides along only for this line; nobody vetoes on it
        debug!(
            "🔬 Analysing image '{the_asset_id}' ({} bytes, fetched with status {})...",
            content.bytes.len(),
            content.status
        );

        let the_labels = self
            .detector
            .detect_labels(content.bytes, self.params)
            .await
            .with_context(|| format!("💀 Label detection failed for '{the_asset_id}'"))?;
        trace!("🏷️ '{the_asset_id}' labels: [{}]", the_labels.names());

        let the_category = resolve_category(&the_labels);
        debug!(
            "🗂️ '{the_asset_id}' classified as {the_category} from {} labels",
            the_labels.len()
        );
        Ok(the_category)
    }
}
