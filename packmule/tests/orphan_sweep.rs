//! Integration tests for the orphan sweep.
//!
//! These tests build real directory trees and verify:
//! - Orphans are deleted; expected paths and content matches survive
//! - Moved-but-identical files are recognized by content hash
//! - Protected directories and unmanaged extensions are never touched
//! - The sweep is idempotent
//! - Dry runs delete nothing

use packmule::config::OutputLayout;
use packmule::integrity::{hash_bytes, HashAlgorithm};
use packmule::project::{Artifact, Project, ProjectType, UpdateStrategy};
use packmule::store::GraphStore;
use packmule::sweep::{sweep_orphans, OverrideFile, SweepOutcome};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

const SODIUM_BYTES: &[u8] = b"sodium jar bytes";

/// A store with one mod project whose artifact is `mods/sodium.jar`.
fn store_with_sodium() -> GraphStore {
    let mut store = GraphStore::new(
        "test-pack",
        vec!["1.20.1".to_string()],
        vec!["fabric".to_string()],
    );
    let project = Project {
        kind: ProjectType::Mod,
        id: BTreeMap::new(),
        name: BTreeMap::from([("modrinth".to_string(), "Sodium".to_string())]),
        slug: BTreeMap::from([("modrinth".to_string(), "sodium".to_string())]),
        files: vec![Artifact {
            url: Some("https://cdn.example/sodium.jar".to_string()),
            file_name: "sodium.jar".to_string(),
            size: SODIUM_BYTES.len() as u64,
            hashes: BTreeMap::from([(
                HashAlgorithm::Sha1,
                hash_bytes(HashAlgorithm::Sha1, SODIUM_BYTES),
            )]),
            mc_versions: BTreeSet::new(),
            loaders: BTreeSet::new(),
        }],
        graph_id: None,
        dependents: BTreeSet::new(),
        redistributable: true,
        update_strategy: UpdateStrategy::Latest,
        aliases: BTreeSet::new(),
    };
    assert!(store.add(project));
    store
}

fn write(path: &Path, bytes: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

async fn sweep(store: &GraphStore, layout: &OutputLayout) -> SweepOutcome {
    sweep_orphans(store, layout, &[], false).await
}

// =============================================================================
// Integration Tests
// =============================================================================

#[tokio::test]
async fn test_orphan_deleted_expected_file_kept() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    let store = store_with_sodium();

    let expected = layout.destination_for(ProjectType::Mod, "sodium.jar");
    write(&expected, SODIUM_BYTES);
    let orphan = layout.destination_for(ProjectType::Mod, "leftover.jar");
    write(&orphan, b"orphan bytes");

    let outcome = sweep(&store, &layout).await;

    assert_eq!(outcome.files_deleted, 1);
    assert_eq!(outcome.bytes_freed, b"orphan bytes".len() as u64);
    assert!(outcome.errors.is_empty());
    assert!(expected.exists());
    assert!(!orphan.exists());
}

#[tokio::test]
async fn test_moved_identical_file_survives_by_content_hash() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    let store = store_with_sodium();

    // The artifact lives at its expected path; a byte-identical copy sits
    // somewhere else, and a renamed-and-changed file sits next to it.
    write(
        &layout.destination_for(ProjectType::Mod, "sodium.jar"),
        SODIUM_BYTES,
    );
    let moved = layout
        .directory_for(ProjectType::Mod)
        .join("renamed-sodium.jar");
    write(&moved, SODIUM_BYTES);
    let changed = layout.directory_for(ProjectType::Mod).join("changed.jar");
    write(&changed, b"orphan bytes");

    let outcome = sweep(&store, &layout).await;

    assert_eq!(outcome.files_deleted, 1);
    assert!(moved.exists(), "content match must survive");
    assert!(!changed.exists(), "changed content must be swept");
}

#[tokio::test]
async fn test_override_survives_by_path_and_hash() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    let store = store_with_sodium();

    let hand_placed = layout.directory_for(ProjectType::Mod).join("hand-placed.jar");
    write(&hand_placed, b"hand placed bytes");
    let overrides = [OverrideFile {
        path: hand_placed.clone(),
        sha256: hash_bytes(HashAlgorithm::Sha256, b"hand placed bytes"),
    }];

    let outcome = sweep_orphans(&store, &layout, &overrides, false).await;

    assert_eq!(outcome.files_deleted, 0);
    assert!(hand_placed.exists());
}

#[tokio::test]
async fn test_unmanaged_extensions_are_left_alone() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    let store = store_with_sodium();

    let notes = layout.directory_for(ProjectType::Mod).join("notes.txt");
    write(&notes, b"keep me");

    let outcome = sweep(&store, &layout).await;

    assert_eq!(outcome.files_deleted, 0);
    assert!(notes.exists());
}

#[tokio::test]
async fn test_protected_directories_are_never_walked() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    let store = store_with_sodium();

    // Worlds output into saves/, which is protected: even a managed
    // extension there must survive.
    let region = dir.path().join("saves").join("world").join("backup.zip");
    write(&region, b"world backup");

    let outcome = sweep(&store, &layout).await;

    assert_eq!(outcome.files_deleted, 0);
    assert_eq!(outcome.directories_deleted, 0);
    assert!(region.exists());
}

#[tokio::test]
async fn test_orphaned_subdirectory_is_removed_after_its_files() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    let store = store_with_sodium();

    let nested = layout.directory_for(ProjectType::Mod).join("old-pack");
    write(&nested.join("a.jar"), b"orphan bytes");
    write(&nested.join("b.jar"), b"more orphan bytes");

    let outcome = sweep(&store, &layout).await;

    assert_eq!(outcome.files_deleted, 2);
    assert_eq!(outcome.directories_deleted, 1);
    assert!(!nested.exists());
}

#[tokio::test]
async fn test_directory_with_surviving_children_is_kept() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    let store = store_with_sodium();

    let nested = layout.directory_for(ProjectType::Mod).join("mixed");
    write(&nested.join("orphan.jar"), b"orphan bytes");
    write(&nested.join("notes.txt"), b"keep me");

    let outcome = sweep(&store, &layout).await;

    assert_eq!(outcome.files_deleted, 1);
    assert_eq!(outcome.directories_deleted, 0);
    assert!(nested.join("notes.txt").exists());
    assert!(outcome.errors.is_empty(), "DirectoryNotEmpty is expected, not an error");
}

#[tokio::test]
async fn test_sweep_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    let store = store_with_sodium();

    write(
        &layout.destination_for(ProjectType::Mod, "sodium.jar"),
        SODIUM_BYTES,
    );
    let nested = layout.directory_for(ProjectType::Mod).join("old");
    write(&nested.join("orphan.jar"), b"orphan bytes");

    let first = sweep(&store, &layout).await;
    assert_eq!(first.files_deleted, 1);
    assert_eq!(first.directories_deleted, 1);

    let second = sweep(&store, &layout).await;
    assert_eq!(second.files_deleted, 0);
    assert_eq!(second.directories_deleted, 0);
    assert!(second.errors.is_empty());
}

#[tokio::test]
async fn test_empty_tree_short_circuits() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    let store = store_with_sodium();

    // mods/ exists but is empty; nothing to evaluate.
    std::fs::create_dir_all(layout.directory_for(ProjectType::Mod)).unwrap();

    let outcome = sweep(&store, &layout).await;
    assert_eq!(outcome.files_deleted, 0);
    assert_eq!(outcome.directories_deleted, 0);
    assert!(outcome.errors.is_empty());
}

#[tokio::test]
async fn test_dry_run_reports_without_deleting() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    let store = store_with_sodium();

    let orphan = layout.destination_for(ProjectType::Mod, "leftover.jar");
    write(&orphan, b"orphan bytes");

    let outcome = sweep_orphans(&store, &layout, &[], true).await;

    assert_eq!(outcome.files_deleted, 1);
    assert!(orphan.exists(), "dry run must not delete");
}
