//! Error types for the fetch pipeline.
//!
//! Errors are categorized by failure kind so the retry loop can tell
//! transient transfer failures apart from permanent ones. Only transfer
//! failures are retryable: integrity and persistence failures repeat
//! deterministically, and a pre-existing destination is a pre-condition,
//! not a failure of the attempt.

use std::path::PathBuf;
use thiserror::Error;

use crate::integrity::HashAlgorithm;

/// Per-item failures reported through the caller's error channel.
///
/// No failure of one item aborts its siblings; the pipeline delivers
/// every error here and keeps draining the batch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Destination already exists; the pipeline never overwrites
    #[error("already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// Transfer failed (network error, non-success status, empty body)
    #[error("download failed for {path} (attempt {attempt}): {message}")]
    DownloadFailed {
        path: PathBuf,
        attempt: u32,
        message: String,
    },

    /// Downloaded bytes do not match an advertised digest
    #[error("{algorithm} mismatch for {file_name}: expected {expected}, got {actual}")]
    HashMismatch {
        file_name: String,
        algorithm: HashAlgorithm,
        expected: String,
        actual: String,
    },

    /// Verified bytes could not be written to disk
    #[error("could not save {path}: {message}")]
    CouldNotSave { path: PathBuf, message: String },

    /// The platform provides no downloadable file for this artifact
    #[error("no download url for {name}")]
    NoDownloadUrl { name: String },
}

impl FetchError {
    /// Whether a retry could plausibly change the outcome.
    ///
    /// A primary-hash mismatch is terminal: content integrity failures
    /// are not transient. Save failures and pre-existing destinations do
    /// not consume retry slots either.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::DownloadFailed { .. })
    }
}
