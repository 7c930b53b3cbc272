//! The concurrent artifact fetch pipeline.
//!
//! Consumes a list of ([`Project`], [`Artifact`]) pairs, downloads them
//! concurrently, verifies integrity, writes them into the output layout,
//! and reports progress, per-item errors, and per-item successes through
//! caller-supplied channels. Transfer failures are retried up to a
//! bounded budget; integrity and persistence failures are terminal.
//!
//! # Example
//!
//! ```ignore
//! use packmule::fetch::{AsyncReqwestClient, FetchItem, FetchPipeline};
//! use std::sync::Arc;
//!
//! let client = AsyncReqwestClient::new()?;
//! let pipeline = FetchPipeline::new(Arc::new(client), layout).with_retries(2);
//! let summary = pipeline.run(FetchItem::from_store(&store), observer).await;
//! println!("fetched {} artifacts", summary.fetched);
//! ```

mod error;
mod http;
mod pipeline;
mod progress;

pub use error::FetchError;
pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpError};
pub use pipeline::{FetchPipeline, MAX_RETRIES};
pub use progress::ProgressTracker;

use crate::project::{Artifact, Project};
use crate::store::GraphStore;
use std::path::Path;

/// One unit of work for the pipeline: materialize `artifact` for
/// `project`.
#[derive(Debug, Clone)]
pub struct FetchItem {
    pub project: Project,
    pub artifact: Artifact,
}

/// Callbacks a fetch run reports through.
///
/// Progress callbacks may interleave across concurrently completing
/// items but the reported `completed_bytes` sequence is monotonically
/// non-decreasing and never exceeds `total_bytes`. Error and success
/// callbacks fire once per item outcome; no per-item failure aborts
/// sibling items.
pub trait FetchObserver: Send + Sync {
    /// The shared byte counters advanced past their last published value.
    fn on_progress(&self, completed_bytes: u64, total_bytes: u64);

    /// An item failed. Retryable failures may be reported once per attempt.
    fn on_error(&self, error: FetchError);

    /// An item was verified and written to `path`.
    fn on_success(&self, path: &Path, artifact: &Artifact);
}

impl FetchItem {
    /// The default work list for a store: every project's primary
    /// artifact.
    ///
    /// Projects whose platforms provide no downloadable file are left
    /// out; the driver surfaces those separately if it cares.
    pub fn from_store(store: &GraphStore) -> Vec<FetchItem> {
        store
            .all_projects()
            .into_iter()
            .filter_map(|project| {
                project.primary_artifact().map(|artifact| FetchItem {
                    project: project.clone(),
                    artifact: artifact.clone(),
                })
            })
            .collect()
    }
}

/// Counts reported after a fetch run drains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Items verified and written to disk.
    pub fetched: usize,
    /// Items that ultimately failed (exhausted retries, integrity or
    /// persistence failures, missing download url).
    pub failed: usize,
    /// Items skipped because their destination already existed.
    pub skipped: usize,
    /// Final value of the shared completed-bytes counter.
    pub bytes_fetched: u64,
}
