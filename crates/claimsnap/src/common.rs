//! 📦 Common data structures: the luggage every record carries through the pipeline.
//!
//! 🎬 COLD OPEN: INT. CLAIMS DEPARTMENT - 4:12 AM
//!
//! A photo of a dented bumper sits in a repository. Nobody has looked at it.
//! Nobody will look at it. A machine will look at it, say "Car" with 98.7%
//! confidence, and an adjuster will never know how close that photo came to
//! being filed under "Unknown" forever. These structs are how that happens.
//!
//! Everything in here is owned by exactly one stage at a time and handed to the
//! next stage by value. No `Arc`. No `Rc`. No back-references. Just a relay race
//! where the baton is a `Vec<u8>` and nobody drops it. Mostly. 🦆

use std::fmt;

use serde::{Deserialize, Serialize};

/// 📸 The raw bytes of one asset, fresh off the content repository.
///
/// Lives exactly as long as it takes the classifier to look at it. Never touches
/// a disk. Never gets cached. Gets dropped the moment the labels come back, like
/// a burner phone after the heist.
#[derive(Debug, Clone)]
pub(crate) struct AssetContent {
    /// 🆔 Which node these bytes belong to.
    pub asset_id: String,
    /// 📦 The body, fully buffered. No streaming contract, no partial reads.
    pub bytes: Vec<u8>,
    /// 📡 Whatever status the repository answered with. Recorded, logged, never judged.
    pub status: u16,
}

/// 🏷️ One label from the detection capability: a name and how sure it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    /// 🎯 0..=100, the detector's self-esteem for this label.
    pub confidence: f32,
}

impl Label {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

/// 🏷️🏷️🏷️ The ordered label list returned for one asset.
///
/// ⚠️ Order is load-bearing: the classifier walks it front to back and the first
/// catalog hit wins. Do not sort this. Do not "helpfully" rank it by confidence.
/// The detector's order IS the priority.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    pub fn new(labels: Vec<Label>) -> Self {
        Self { labels }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 📋 Just the names, comma-joined, for log lines that fit on one screen.
    pub fn names(&self) -> String {
        self.labels
            .iter()
            .map(|label| label.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<Label> for LabelSet {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// 🎚️ The two knobs handed to the label detector on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// 📏 At most this many labels come back.
    pub max_labels: i32,
    /// 🎯 Labels below this confidence never make it out of the detector.
    pub min_confidence: f32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            max_labels: 25,
            min_confidence: 75.0,
        }
    }
}

/// 📊 The one artifact an invocation hands back: how many, how many worked, how many didn't.
///
/// Built once when the orchestrator runs out of records. Fields are private so
/// nobody can sneak in a `succeeded += 1` after the fact. `total` is always
/// `succeeded + failed` because it is never stored separately. Math enforced by
/// construction, not by hope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchResult {
    succeeded: usize,
    failed: usize,
}

impl BatchResult {
    pub(crate) fn new(succeeded: usize, failed: usize) -> Self {
        Self { succeeded, failed }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// 📝 The human-readable line the invoker gets back.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} events, {} succeeded, {} failed.",
            self.total(),
            self.succeeded,
            self.failed
        )
    }
}
