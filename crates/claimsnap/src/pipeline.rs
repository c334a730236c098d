//! 🚦 The batch orchestrator: one record at a time, in order, no matter what.
//!
//! 🎬 *[a batch of 500 events arrives. record 17 is garbage. record 212's photo is a 404.]*
//! *[the orchestrator shrugs at both, writes them down as failures, and keeps walking.]*
//! *[at the end it says: "Processed 500 events, 498 succeeded, 2 failed." and goes home.]*
//!
//! ```text
//!   Pending ──▶ Running{i, ok, failed} ──(i == n)──▶ Completed(BatchResult)
//!                   │        ▲
//!                   └────────┘  parse → fetch → classify → write, for record i
//! ```
//!
//! Per record, every stage can fail, and a failure skips the remaining stages for
//! THAT record only. Record `i + 1` never starts before record `i` is finished.
//! No parallelism, no overlap of in-flight requests, no retries. The counts stay
//! boringly deterministic.

use thiserror::Error;
use tracing::{Instrument, info, info_span, warn};

use crate::backends::{AssetRepository, AssetRepositoryBackend};
use crate::batch::decode_batch;
use crate::classify::{Category, Classifier};
use crate::common::BatchResult;
use crate::events::{ParseError, parse_record};
use crate::metadata::MetadataWriter;

/// 💀 Why one record didn't make it. The batch result never sees this; the logs do.
#[derive(Debug, Error)]
pub(crate) enum RecordError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("fetching content for '{asset_id}' failed: {cause:#}")]
    Fetch {
        asset_id: String,
        cause: anyhow::Error,
    },
    #[error("classifying '{asset_id}' failed: {cause:#}")]
    Classify {
        asset_id: String,
        cause: anyhow::Error,
    },
    #[error("updating metadata for '{asset_id}' failed: {cause:#}")]
    Write {
        asset_id: String,
        cause: anyhow::Error,
    },
}

impl RecordError {
    pub(crate) fn stage(&self) -> &'static str {
        match self {
            RecordError::Parse(_) => "parse",
            RecordError::Fetch { .. } => "fetch",
            RecordError::Classify { .. } => "classify",
            RecordError::Write { .. } => "write",
        }
    }
}

/// 🔗 The four stages wired together for a single record.
#[derive(Debug)]
pub(crate) struct Pipeline {
    repository: AssetRepositoryBackend,
    classifier: Classifier,
    writer: MetadataWriter,
}

impl Pipeline {
    pub(crate) fn new(
        repository: AssetRepositoryBackend,
        classifier: Classifier,
        writer: MetadataWriter,
    ) -> Self {
        Self {
            repository,
            classifier,
            writer,
        }
    }

    /// 🧾→📸→🏷️→🗄️ Run one record through every stage, stopping at the first failure.
    pub(crate) async fn process_record(&self, raw: &str) -> Result<Category, RecordError> {
        // 🧾 stage 1: text → record. A bad line never reaches the network.
        let the_record = parse_record(raw)?;
        let the_asset_id = the_record.asset_id;
        info!("🧾 Processing event for nodeId: {the_asset_id}");

        // 📸 stage 2: pull the photo. Only a transport failure stops us here.
        let the_content = self
            .repository
            .fetch_content(&the_asset_id)
            .await
            .map_err(|cause| RecordError::Fetch {
                asset_id: the_asset_id.clone(),
                cause,
            })?;

        // 🏷️ stage 3: the bytes move into the classifier and don't come back
        let the_category = self
            .classifier
            .classify(the_content)
            .await
            .map_err(|cause| RecordError::Classify {
                asset_id: the_asset_id.clone(),
                cause,
            })?;

        // 🗄️ stage 4: stamp the verdict onto the node
        self.writer
            .write(&self.repository, &the_asset_id, the_category)
            .await
            .map_err(|cause| RecordError::Write {
                asset_id: the_asset_id.clone(),
                cause,
            })?;

        Ok(the_category)
    }

    /// ✂️🚦 Decode a payload and orchestrate every record in it.
    pub(crate) async fn process_payload(&self, payload: &str) -> BatchResult {
        // ✂️ lines borrow from the payload, so the payload outlives the whole batch
        let the_records = decode_batch(payload);
        BatchOrchestrator::new(self, the_records).run().await
    }
}

/// 🚦 Where the orchestrator is in its one and only trip through the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BatchState {
    Pending,
    Running {
        next_index: usize,
        succeeded: usize,
        failed: usize,
    },
    Completed(BatchResult),
}

/// 🚦 Drives the pipeline over every record of one batch.
#[derive(Debug)]
pub(crate) struct BatchOrchestrator<'a> {
    pipeline: &'a Pipeline,
    records: Vec<&'a str>,
    state: BatchState,
}

impl<'a> BatchOrchestrator<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline, records: Vec<&'a str>) -> Self {
        Self {
            pipeline,
            records,
            state: BatchState::Pending,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> BatchState {
        self.state
    }

    /// 👣 Advance exactly one transition. In `Running`, that means one whole record.
    pub(crate) async fn step(&mut self) -> BatchState {
        self.state = match self.state {
            // 🚦 first step only announces the batch; no record is touched yet
            BatchState::Pending => {
                info!("🚦 Number of events: {}", self.records.len());
                BatchState::Running {
                    next_index: 0,
                    succeeded: 0,
                    failed: 0,
                }
            }
            BatchState::Running {
                next_index,
                succeeded,
                failed,
            } => match self.records.get(next_index).copied() {
                // 👣 one record, start to finish, before anyone else gets a turn
                Some(raw) => {
                    if self.process_one(next_index, raw).await {
                        BatchState::Running {
                            next_index: next_index + 1,
                            succeeded: succeeded + 1,
                            failed,
                        }
                    } else {
                        BatchState::Running {
                            next_index: next_index + 1,
                            succeeded,
                            failed: failed + 1,
                        }
                    }
                }
                // 🏁 out of records: freeze the counts
                None => {
                    let the_result = BatchResult::new(succeeded, failed);
                    info!("🏁 {the_result}");
                    BatchState::Completed(the_result)
                }
            },
            // 🔒 terminal. Stepping a finished batch changes nothing.
            completed @ BatchState::Completed(_) => completed,
        };
        self.state
    }

    /// 🏃 Step until the batch is done and hand back the result.
    pub(crate) async fn run(mut self) -> BatchResult {
        loop {
            if let BatchState::Completed(the_result) = self.step().await {
                return the_result;
            }
        }
    }

    async fn process_one(&self, index: usize, raw: &str) -> bool {
        // 🔭 every log line from every stage of this record carries index and total
        let the_span = info_span!("record", index, total = self.records.len());
        match self.pipeline.process_record(raw).instrument(the_span).await {
            Ok(category) => {
                info!(index, "✅ event classified as {category} and written");
                true
            }
            // 💀 logged, counted, forgotten. The next record doesn't care.
            Err(err) => {
                warn!(index, stage = err.stage(), "💀 Error: {err}");
                false
            }
        }
    }
}
