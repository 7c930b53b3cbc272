//! The `prune` subcommand.

use crate::error::CliError;
use packmule::config::OutputLayout;
use packmule::integrity::{self, HashAlgorithm};
use packmule::store::GraphStore;
use packmule::sweep::{sweep_orphans, OverrideFile};
use std::path::{Path, PathBuf};

/// Reconciles the output tree against the store, deleting orphans.
///
/// Files named with `--keep` are hashed up front and treated as
/// expected, both by path and by content.
pub async fn prune(
    dir: &Path,
    store_path: &Path,
    dry_run: bool,
    keep: &[PathBuf],
) -> Result<(), CliError> {
    let store = GraphStore::load(store_path)?;
    let layout = OutputLayout::new(dir);

    let mut overrides = Vec::with_capacity(keep.len());
    for path in keep {
        let sha256 = integrity::hash_file(HashAlgorithm::Sha256, path).map_err(|e| {
            CliError::Keep {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;
        overrides.push(OverrideFile {
            path: path.clone(),
            sha256,
        });
    }

    let outcome = sweep_orphans(&store, &layout, &overrides, dry_run).await;

    if dry_run {
        println!(
            "Would delete {} files ({} bytes) and up to {} directories.",
            outcome.files_deleted, outcome.bytes_freed, outcome.directories_deleted,
        );
    } else {
        println!(
            "Deleted {} files ({} bytes) and {} directories; {} skipped.",
            outcome.files_deleted,
            outcome.bytes_freed,
            outcome.directories_deleted,
            outcome.skipped,
        );
    }
    if !outcome.errors.is_empty() {
        eprintln!("{} problems:", outcome.errors.len());
        for error in &outcome.errors {
            eprintln!("  {}", error);
        }
    }
    Ok(())
}
