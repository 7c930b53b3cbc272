//! The fetch pipeline engine.
//!
//! # Algorithm
//!
//! 1. Resolve each item's destination from its project type and file
//!    name; items whose destination already exists (on disk or earlier
//!    in the same batch) are reported and skipped - the pipeline never
//!    overwrites.
//! 2. Launch one task per remaining item on a [`JoinSet`]. Each task
//!    streams the body, feeding the shared [`ProgressTracker`] per
//!    chunk, verifies the advertised hashes, and writes the file under
//!    a freshly created parent directory tree.
//! 3. After the batch drains, transfer failures are re-run as a smaller
//!    batch until the retry budget is spent. Integrity and persistence
//!    failures never re-run.
//!
//! # Concurrency
//!
//! Tasks share only the progress counters (atomic) and the callback
//! channels; destinations are unique within a run, so no two tasks
//! touch the same path. The graph store is not mutated here - attaching
//! verified artifacts back to the store is the driver's move, between
//! pipeline invocations.

use super::error::FetchError;
use super::http::AsyncHttpClient;
use super::progress::ProgressTracker;
use super::{FetchItem, FetchObserver, FetchSummary};
use crate::config::OutputLayout;
use crate::integrity;
use crate::project::Artifact;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Hard ceiling on retry rounds, whatever budget the caller configures.
pub const MAX_RETRIES: u32 = 3;

/// Downloads, verifies, and persists artifacts concurrently.
pub struct FetchPipeline<C: AsyncHttpClient + 'static> {
    client: Arc<C>,
    layout: OutputLayout,
    retries: u32,
}

/// An item that passed the pre-conditions and is ready to transfer.
struct PreparedItem {
    artifact: Artifact,
    /// Project display name, for error reporting.
    name: String,
    url: String,
    dest: PathBuf,
}

/// What happened to one item in one attempt.
enum ItemOutcome {
    Fetched,
    /// Transfer failed; the item may run again in the next round.
    Retry(Box<PreparedItem>),
    /// Terminal failure; already reported.
    Failed,
}

#[derive(Default)]
struct AttemptOutcome {
    retryable: Vec<PreparedItem>,
    fetched: usize,
    failed: usize,
}

impl<C: AsyncHttpClient + 'static> FetchPipeline<C> {
    /// Creates a pipeline writing into `layout`, with no retry budget.
    pub fn new(client: Arc<C>, layout: OutputLayout) -> Self {
        Self {
            client,
            layout,
            retries: 0,
        }
    }

    /// Sets the retry budget. Capped at [`MAX_RETRIES`] rounds.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Runs the pipeline to completion, including retry rounds.
    ///
    /// Returns only after every launched task has drained. All per-item
    /// failures flow through `observer`; nothing here panics across the
    /// pipeline boundary.
    pub async fn run(&self, items: Vec<FetchItem>, observer: Arc<dyn FetchObserver>) -> FetchSummary {
        let mut summary = FetchSummary::default();
        let mut pending = Vec::new();
        let mut claimed_destinations = HashSet::new();

        for item in items {
            let dest = self
                .layout
                .destination_for(item.project.kind, &item.artifact.file_name);

            let Some(url) = item.artifact.url.clone() else {
                observer.on_error(FetchError::NoDownloadUrl {
                    name: item.project.display_name().to_string(),
                });
                summary.failed += 1;
                continue;
            };

            let exists = tokio::fs::try_exists(&dest).await.unwrap_or(false);
            if exists || !claimed_destinations.insert(dest.clone()) {
                observer.on_error(FetchError::AlreadyExists { path: dest });
                summary.skipped += 1;
                continue;
            }

            pending.push(PreparedItem {
                name: item.project.display_name().to_string(),
                artifact: item.artifact,
                url,
                dest,
            });
        }

        if pending.is_empty() {
            return summary;
        }

        let total: u64 = pending.iter().map(|item| item.artifact.size).sum();
        let progress = Arc::new(ProgressTracker::new(total));
        debug!(
            items = pending.len(),
            total_bytes = total,
            retries = self.retries,
            "Starting fetch run"
        );

        let max_attempts = self.retries.min(MAX_RETRIES) + 1;
        let mut attempt = 1;
        loop {
            let outcome = self
                .run_attempt(std::mem::take(&mut pending), attempt, &progress, &observer)
                .await;
            summary.fetched += outcome.fetched;
            summary.failed += outcome.failed;

            if outcome.retryable.is_empty() {
                break;
            }
            if attempt >= max_attempts {
                summary.failed += outcome.retryable.len();
                break;
            }

            pending = outcome.retryable;
            attempt += 1;
            debug!(attempt, remaining = pending.len(), "Retrying failed transfers");
        }

        summary.bytes_fetched = progress.completed();
        debug!(
            fetched = summary.fetched,
            failed = summary.failed,
            skipped = summary.skipped,
            bytes = summary.bytes_fetched,
            "Fetch run complete"
        );
        summary
    }

    /// Runs one concurrent attempt over `batch`.
    async fn run_attempt(
        &self,
        batch: Vec<PreparedItem>,
        attempt: u32,
        progress: &Arc<ProgressTracker>,
        observer: &Arc<dyn FetchObserver>,
    ) -> AttemptOutcome {
        let mut tasks = JoinSet::new();
        for prepared in batch {
            let client = Arc::clone(&self.client);
            let progress = Arc::clone(progress);
            let observer = Arc::clone(observer);
            tasks.spawn(fetch_one(client, prepared, attempt, progress, observer));
        }

        let mut outcome = AttemptOutcome::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(ItemOutcome::Fetched) => outcome.fetched += 1,
                Ok(ItemOutcome::Retry(item)) => outcome.retryable.push(*item),
                Ok(ItemOutcome::Failed) => outcome.failed += 1,
                Err(e) => {
                    // A panicking task loses its item; report and count it
                    // rather than letting the panic cross the boundary.
                    error!(error = %e, "Download task aborted");
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }
}

/// Downloads, verifies, and writes a single item.
async fn fetch_one<C: AsyncHttpClient>(
    client: Arc<C>,
    prepared: PreparedItem,
    attempt: u32,
    progress: Arc<ProgressTracker>,
    observer: Arc<dyn FetchObserver>,
) -> ItemOutcome {
    let mut received: u64 = 0;

    let result = {
        let progress = &progress;
        let observer = &observer;
        let received = &mut received;
        let mut on_chunk = move |len: usize| {
            *received += len as u64;
            progress.record(len as u64, |completed, total| {
                observer.on_progress(completed, total)
            });
        };
        client.get_streamed(&prepared.url, &mut on_chunk).await
    };

    let body = match result {
        Ok(body) if !body.is_empty() => body,
        Ok(_) => {
            progress.roll_back(received);
            observer.on_error(FetchError::DownloadFailed {
                path: prepared.dest.clone(),
                attempt,
                message: "empty response body".to_string(),
            });
            return ItemOutcome::Retry(Box::new(prepared));
        }
        Err(e) => {
            progress.roll_back(received);
            observer.on_error(FetchError::DownloadFailed {
                path: prepared.dest.clone(),
                attempt,
                message: e.to_string(),
            });
            return ItemOutcome::Retry(Box::new(prepared));
        }
    };

    // Primary hash first: a mismatch there rejects the artifact outright.
    let primary = prepared
        .artifact
        .primary_hash()
        .map(|(algorithm, expected)| (algorithm, expected.to_string()));
    if let Some((algorithm, expected)) = &primary {
        let actual = integrity::hash_bytes(*algorithm, &body);
        if !actual.eq_ignore_ascii_case(expected) {
            progress.roll_back(received);
            warn!(
                project = %prepared.name,
                file = %prepared.artifact.file_name,
                algorithm = %algorithm,
                "Primary hash mismatch, artifact rejected"
            );
            observer.on_error(FetchError::HashMismatch {
                file_name: prepared.artifact.file_name.clone(),
                algorithm: *algorithm,
                expected: expected.clone(),
                actual,
            });
            return ItemOutcome::Failed;
        }
    }

    // Remaining digests are advisory: mismatches are reported but the
    // artifact is kept.
    for (algorithm, expected) in &prepared.artifact.hashes {
        if primary.as_ref().map(|(a, _)| a) == Some(algorithm) {
            continue;
        }
        let actual = integrity::hash_bytes(*algorithm, &body);
        if !actual.eq_ignore_ascii_case(expected) {
            observer.on_error(FetchError::HashMismatch {
                file_name: prepared.artifact.file_name.clone(),
                algorithm: *algorithm,
                expected: expected.clone(),
                actual,
            });
        }
    }

    if let Some(parent) = prepared.dest.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            progress.roll_back(received);
            observer.on_error(FetchError::CouldNotSave {
                path: prepared.dest.clone(),
                message: e.to_string(),
            });
            return ItemOutcome::Failed;
        }
    }
    if let Err(e) = tokio::fs::write(&prepared.dest, &body).await {
        progress.roll_back(received);
        observer.on_error(FetchError::CouldNotSave {
            path: prepared.dest.clone(),
            message: e.to_string(),
        });
        return ItemOutcome::Failed;
    }

    debug!(
        path = %prepared.dest.display(),
        bytes = body.len(),
        "Artifact saved"
    );
    observer.on_success(&prepared.dest, &prepared.artifact);
    ItemOutcome::Fetched
}
