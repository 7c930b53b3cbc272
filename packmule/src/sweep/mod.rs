//! The orphan sweep.
//!
//! Reconciles the output tree against the graph store: walks every
//! non-protected project-type directory and deletes files and
//! directories that match neither an expected path nor an expected
//! content hash. Matching by content hash means a known artifact that
//! was moved by hand survives the sweep; a renamed-and-changed file
//! does not.
//!
//! # Design
//!
//! Discovery enumerates the tree bottom-up in a blocking task, then
//! hashes candidate files concurrently while a small worker set drains
//! a bounded delete queue. Directory candidates are removed after the
//! file phase, children first; a directory that still holds surviving
//! children fails with `DirectoryNotEmpty`, which is expected and
//! swallowed.
//!
//! # Failure Semantics
//!
//! An unreadable file is reported and skipped, never deleted -
//! destructive action on ambiguous input is the one thing the sweep
//! must not do. Deletion failures other than `DirectoryNotEmpty` are
//! reported in the outcome.

use crate::config::{self, OutputLayout};
use crate::integrity::{self, HashAlgorithm};
use crate::store::GraphStore;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Bound on the delete queue between discovery and the worker set.
const DELETE_QUEUE_DEPTH: usize = 64;

/// Size of the I/O-bound deletion worker set.
const DELETE_WORKERS: usize = 4;

/// A manually placed file the sweep must treat as expected.
#[derive(Debug, Clone)]
pub struct OverrideFile {
    pub path: PathBuf,
    /// Precomputed SHA-256 of the file's contents, lowercase hex.
    pub sha256: String,
}

/// Errors collected during a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    /// A file could not be hashed; it is skipped, not deleted
    #[error("could not read {path}: {message}")]
    UnreadableFile { path: PathBuf, message: String },

    /// A walk step failed; entries below it are skipped
    #[error("could not walk {path}: {message}")]
    WalkFailed { path: PathBuf, message: String },

    /// A deletion failed for a reason other than `DirectoryNotEmpty`
    #[error("could not delete {path}: {message}")]
    DeleteFailed { path: PathBuf, message: String },
}

/// Result of one sweep run.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// Orphaned files deleted (or, in a dry run, that would be deleted).
    pub files_deleted: usize,
    /// Directories deleted.
    pub directories_deleted: usize,
    /// Bytes freed by file deletions.
    pub bytes_freed: u64,
    /// Files skipped because they could not be hashed.
    pub skipped: usize,
    /// Everything that went wrong, in no particular order.
    pub errors: Vec<SweepError>,
}

/// One enumerated path, in bottom-up order.
enum WalkEntry {
    File(PathBuf),
    Dir(PathBuf),
}

/// A file deletion the worker set will carry out.
struct Deletion {
    path: PathBuf,
    size: u64,
}

/// Sweeps orphaned content out of the output tree.
///
/// `overrides` are manually placed files that must survive; both their
/// paths and their precomputed hashes count as expected. When `dry_run`
/// is set, candidates are counted and reported but nothing is deleted.
///
/// The store is read-only here: the sweep derives the expected world
/// from it and reconciles the filesystem, never the other way around.
pub async fn sweep_orphans(
    store: &GraphStore,
    layout: &OutputLayout,
    overrides: &[OverrideFile],
    dry_run: bool,
) -> SweepOutcome {
    let mut outcome = SweepOutcome::default();

    let (expected_paths, expected_hashes) =
        expected_sets(store, layout, overrides, &mut outcome).await;

    // Discovery: enumerate every sweepable directory bottom-up.
    let roots: Vec<PathBuf> = layout
        .sweepable_directories()
        .into_iter()
        .filter(|dir| dir.is_dir())
        .collect();
    let entries = tokio::task::spawn_blocking(move || {
        let mut entries = Vec::new();
        let mut errors = Vec::new();
        for root in &roots {
            walk_bottom_up(root, &mut entries, &mut errors);
        }
        (entries, errors)
    })
    .await;
    let (entries, walk_errors) = match entries {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Sweep discovery task aborted");
            return outcome;
        }
    };
    outcome.errors.extend(walk_errors);

    // Nothing enumerated means nothing to decide or delete; skip the
    // consumer machinery outright instead of cancelling it mid-flight.
    if entries.is_empty() {
        debug!("Sweep found no paths to evaluate");
        return outcome;
    }

    let mut dir_candidates = Vec::new();
    let expected_paths = Arc::new(expected_paths);
    let expected_hashes = Arc::new(expected_hashes);

    // Delete queue and worker set. Workers share one receiver; the
    // queue is bounded so discovery cannot run arbitrarily far ahead
    // of deletion.
    let (delete_tx, delete_rx) = mpsc::channel::<Deletion>(DELETE_QUEUE_DEPTH);
    let delete_rx = Arc::new(Mutex::new(delete_rx));
    let mut workers = JoinSet::new();
    for _ in 0..DELETE_WORKERS {
        let delete_rx = Arc::clone(&delete_rx);
        workers.spawn(async move {
            let mut deleted = 0usize;
            let mut freed = 0u64;
            let mut errors = Vec::new();
            loop {
                let next = { delete_rx.lock().await.recv().await };
                let Some(Deletion { path, size }) = next else {
                    break;
                };
                if dry_run {
                    info!(path = %path.display(), "Would delete orphaned file");
                    deleted += 1;
                    freed += size;
                    continue;
                }
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {
                        debug!(path = %path.display(), "Deleted orphaned file");
                        deleted += 1;
                        freed += size;
                    }
                    Err(e) => errors.push(SweepError::DeleteFailed {
                        path,
                        message: e.to_string(),
                    }),
                }
            }
            (deleted, freed, errors)
        });
    }

    // Evaluation: hash candidate files concurrently, feeding confirmed
    // orphans straight into the delete queue.
    let mut hashers: JoinSet<Result<Option<Deletion>, SweepError>> = JoinSet::new();
    for entry in entries {
        match entry {
            WalkEntry::Dir(path) => dir_candidates.push(path),
            WalkEntry::File(path) => {
                if !config::is_managed(&path) {
                    continue;
                }
                if expected_paths.contains(&path) {
                    continue;
                }
                let expected_hashes = Arc::clone(&expected_hashes);
                hashers.spawn(async move {
                    let hash_path = path.clone();
                    let hashed = tokio::task::spawn_blocking(move || -> std::io::Result<_> {
                        let size = std::fs::metadata(&hash_path)?.len();
                        let digest = integrity::hash_file(HashAlgorithm::Sha256, &hash_path)?;
                        Ok((digest, size))
                    })
                    .await;
                    match hashed {
                        Ok(Ok((digest, size))) => {
                            if expected_hashes.contains(&digest) {
                                debug!(path = %path.display(), "Content matches a known artifact, kept");
                                Ok(None)
                            } else {
                                Ok(Some(Deletion { path, size }))
                            }
                        }
                        Ok(Err(e)) => Err(SweepError::UnreadableFile {
                            path,
                            message: e.to_string(),
                        }),
                        Err(e) => Err(SweepError::UnreadableFile {
                            path,
                            message: e.to_string(),
                        }),
                    }
                });
            }
        }
    }

    while let Some(joined) = hashers.join_next().await {
        match joined {
            Ok(Ok(Some(deletion))) => {
                if delete_tx.send(deletion).await.is_err() {
                    break;
                }
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => {
                outcome.skipped += 1;
                outcome.errors.push(e);
            }
            Err(e) => {
                warn!(error = %e, "Sweep hash task aborted");
                outcome.skipped += 1;
            }
        }
    }

    // Close the queue and drain the workers.
    drop(delete_tx);
    while let Some(joined) = workers.join_next().await {
        if let Ok((deleted, freed, errors)) = joined {
            outcome.files_deleted += deleted;
            outcome.bytes_freed += freed;
            outcome.errors.extend(errors);
        }
    }

    // Directory candidates, children first. A directory that still has
    // surviving children reports DirectoryNotEmpty, which is the
    // expected signal to keep it.
    for path in dir_candidates {
        if dry_run {
            debug!(path = %path.display(), "Would attempt to delete directory");
            outcome.directories_deleted += 1;
            continue;
        }
        match tokio::fs::remove_dir(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted orphaned directory");
                outcome.directories_deleted += 1;
            }
            Err(e) if e.kind() == ErrorKind::DirectoryNotEmpty => {}
            Err(e) => outcome.errors.push(SweepError::DeleteFailed {
                path,
                message: e.to_string(),
            }),
        }
    }

    info!(
        files_deleted = outcome.files_deleted,
        directories_deleted = outcome.directories_deleted,
        bytes_freed = outcome.bytes_freed,
        skipped = outcome.skipped,
        errors = outcome.errors.len(),
        dry_run,
        "Sweep complete"
    );
    outcome
}

/// Builds the expected-path and expected-hash sets from the store's
/// artifacts and the overrides.
///
/// Artifact files are hashed from disk concurrently; an expected file
/// that is missing contributes only its path.
async fn expected_sets(
    store: &GraphStore,
    layout: &OutputLayout,
    overrides: &[OverrideFile],
    outcome: &mut SweepOutcome,
) -> (HashSet<PathBuf>, HashSet<String>) {
    let mut expected_paths = HashSet::new();
    let mut expected_hashes = HashSet::new();

    let mut hashers = JoinSet::new();
    for project in store.all_projects() {
        for artifact in &project.files {
            let dest = layout.destination_for(project.kind, &artifact.file_name);
            if expected_paths.insert(dest.clone()) && dest.is_file() {
                hashers.spawn_blocking(move || {
                    integrity::hash_file(HashAlgorithm::Sha256, &dest).map_err(|e| (dest, e))
                });
            }
        }
    }

    for file in overrides {
        expected_paths.insert(file.path.clone());
        expected_hashes.insert(file.sha256.clone());
    }

    while let Some(joined) = hashers.join_next().await {
        match joined {
            Ok(Ok(digest)) => {
                expected_hashes.insert(digest);
            }
            Ok(Err((path, e))) => outcome.errors.push(SweepError::UnreadableFile {
                path,
                message: e.to_string(),
            }),
            Err(e) => warn!(error = %e, "Expected-hash task aborted"),
        }
    }

    (expected_paths, expected_hashes)
}

/// Enumerates everything under `root` except the root itself, children
/// before their parent directories.
fn walk_bottom_up(root: &Path, entries: &mut Vec<WalkEntry>, errors: &mut Vec<SweepError>) {
    let read = match std::fs::read_dir(root) {
        Ok(read) => read,
        Err(e) => {
            errors.push(SweepError::WalkFailed {
                path: root.to_path_buf(),
                message: e.to_string(),
            });
            return;
        }
    };

    for entry in read {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                errors.push(SweepError::WalkFailed {
                    path: root.to_path_buf(),
                    message: e.to_string(),
                });
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            walk_bottom_up(&path, entries, errors);
            entries.push(WalkEntry::Dir(path));
        } else {
            entries.push(WalkEntry::File(path));
        }
    }
}
