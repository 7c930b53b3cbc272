//! Store persistence.
//!
//! The whole store serializes to a single JSON document. Writes go to a
//! temporary file in the destination directory and land with an atomic
//! rename, so a crash mid-write never leaves a truncated store behind.
//!
//! The document layout is compatibility-relevant and its field names are
//! stable:
//!
//! ```json
//! {
//!   "pack_name": "...",
//!   "mc_versions": ["1.20.1"],
//!   "loaders": ["fabric"],
//!   "projects": [ { "type": "mod", "pakku_id": "...", ... } ]
//! }
//! ```

use super::{GraphId, GraphStore};
use crate::project::Project;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or saving a store document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store file could not be read
    #[error("could not read store at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Store file is not a valid store document
    #[error("could not parse store at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A persisted record is missing its graph id
    #[error("project {slug:?} in {path} has no pakku_id")]
    MissingGraphId { path: PathBuf, slug: String },

    /// Two persisted records share a graph id
    #[error("duplicate pakku_id {id} in {path}")]
    DuplicateGraphId { path: PathBuf, id: GraphId },

    /// Store file could not be written
    #[error("could not write store at {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Wire form of the store document.
#[derive(Serialize, Deserialize)]
struct StoreDocument {
    pack_name: String,
    mc_versions: Vec<String>,
    loaders: Vec<String>,
    projects: Vec<Project>,
}

impl GraphStore {
    /// Loads a store document from `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or if any
    /// record is missing a graph id or shares one with another record.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| StoreError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let document: StoreDocument =
            serde_json::from_str(&content).map_err(|e| StoreError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut projects = BTreeMap::new();
        for project in document.projects {
            let id = project
                .graph_id
                .clone()
                .ok_or_else(|| StoreError::MissingGraphId {
                    path: path.to_path_buf(),
                    slug: project.primary_slug().to_string(),
                })?;
            if projects.insert(id.clone(), project).is_some() {
                return Err(StoreError::DuplicateGraphId {
                    path: path.to_path_buf(),
                    id,
                });
            }
        }

        debug!(
            path = %path.display(),
            projects = projects.len(),
            "Loaded store"
        );

        Ok(Self {
            pack_name: document.pack_name,
            mc_versions: document.mc_versions,
            loaders: document.loaders,
            projects,
        })
    }

    /// Saves the store document to `path` with an atomic replace.
    ///
    /// Projects serialize sorted by primary slug so repeated saves of an
    /// unchanged store are byte-identical.
    ///
    /// # Errors
    ///
    /// Returns error if the temporary file cannot be created, written,
    /// or renamed over `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let document = StoreDocument {
            pack_name: self.pack_name.clone(),
            mc_versions: self.mc_versions.clone(),
            loaders: self.loaders.clone(),
            projects: self.all_projects().into_iter().cloned().collect(),
        };

        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut temp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))
            .map_err(|e| StoreError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        serde_json::to_writer_pretty(&mut temp, &document).map_err(|e| StoreError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        temp.write_all(b"\n").map_err(|e| StoreError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        temp.persist(path).map_err(|e| StoreError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        debug!(path = %path.display(), projects = self.projects.len(), "Saved store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{project, store};
    use super::*;
    use crate::integrity::HashAlgorithm;
    use crate::project::Artifact;
    use std::collections::BTreeSet;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packmule-lock.json");

        let mut original = store();
        let mut sodium = project("sodium");
        sodium.files.push(Artifact {
            url: Some("https://cdn.example/sodium.jar".to_string()),
            file_name: "sodium.jar".to_string(),
            size: 1000,
            hashes: [(HashAlgorithm::Sha1, "abc123".to_string())].into(),
            mc_versions: BTreeSet::from(["1.20.1".to_string()]),
            loaders: BTreeSet::from(["fabric".to_string()]),
        });
        original.add(sodium);
        original.add(project("lithium"));

        original.save(&path).unwrap();
        let loaded = GraphStore::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_wire_field_names_are_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packmule-lock.json");

        let mut s = store();
        let mut sodium = project("sodium");
        sodium.files.push(Artifact {
            url: Some("https://cdn.example/sodium.jar".to_string()),
            file_name: "sodium.jar".to_string(),
            size: 1000,
            hashes: [(HashAlgorithm::Sha1, "abc123".to_string())].into(),
            mc_versions: BTreeSet::new(),
            loaders: BTreeSet::new(),
        });
        s.add(sodium);
        s.save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value.get("pack_name").is_some());
        assert!(value.get("mc_versions").is_some());
        assert!(value.get("loaders").is_some());

        let record = &value["projects"][0];
        let fields = [
            "type",
            "id",
            "name",
            "slug",
            "files",
            "pakku_id",
            "pakku_links",
            "redistributable",
            "update_strategy",
        ];
        for field in fields {
            assert!(record.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(record["type"], "mod");

        let file = &record["files"][0];
        for field in ["url", "file_name", "size", "hashes", "mc_versions", "loaders"] {
            assert!(file.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(file["hashes"]["sha1"], "abc123");
    }

    #[test]
    fn test_load_rejects_record_without_graph_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packmule-lock.json");
        fs::write(
            &path,
            r#"{
                "pack_name": "p",
                "mc_versions": [],
                "loaders": [],
                "projects": [{
                    "type": "mod",
                    "id": {},
                    "name": {},
                    "slug": {"modrinth": "sodium"},
                    "redistributable": true
                }]
            }"#,
        )
        .unwrap();

        let error = GraphStore::load(&path).unwrap_err();
        assert!(matches!(error, StoreError::MissingGraphId { .. }));
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packmule-lock.json");
        fs::write(&path, "stale contents").unwrap();

        store().save(&path).unwrap();
        let loaded = GraphStore::load(&path).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.pack_name(), "test-pack");
    }
}
