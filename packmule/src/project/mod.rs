//! Project data model.
//!
//! A [`Project`] is one content item tracked across one or more platforms.
//! Platform clients create projects, the graph store deduplicates and
//! persists them, and the fetch pipeline materializes their [`Artifact`]s.

mod artifact;
mod identity;

pub use artifact::Artifact;
pub use identity::same_project;

use crate::store::GraphId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Kind of content a project ships, which decides its output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Mod,
    ResourcePack,
    ShaderPack,
    World,
    DataPack,
}

impl ProjectType {
    /// Output directory name for this kind of content, relative to the
    /// bundle working directory.
    pub fn directory(&self) -> &'static str {
        match self {
            ProjectType::Mod => "mods",
            ProjectType::ResourcePack => "resourcepacks",
            ProjectType::ShaderPack => "shaderpacks",
            ProjectType::World => "saves",
            ProjectType::DataPack => "datapacks",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectType::Mod => write!(f, "mod"),
            ProjectType::ResourcePack => write!(f, "resource pack"),
            ProjectType::ShaderPack => write!(f, "shader pack"),
            ProjectType::World => write!(f, "world"),
            ProjectType::DataPack => write!(f, "data pack"),
        }
    }
}

/// How the project follows upstream releases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// Track the newest compatible release.
    #[default]
    Latest,
    /// Stay on the recorded release.
    Pinned,
    /// No strategy recorded.
    None,
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStrategy::Latest => write!(f, "latest"),
            UpdateStrategy::Pinned => write!(f, "pinned"),
            UpdateStrategy::None => write!(f, "none"),
        }
    }
}

/// A content item tracked across one or more platforms.
///
/// The per-platform maps are keyed by platform name ("curseforge",
/// "modrinth", ...). Two `Project` values describe the same real-world
/// item when any id, slug, or name overlaps, or when one lists the other
/// in its alias set - see [`same_project`]. That identity test, not
/// structural equality, drives merge and dedup.
///
/// Field names follow the persisted lock-file layout and must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Kind of content, which decides the output directory.
    #[serde(rename = "type")]
    pub kind: ProjectType,

    /// Platform-native identifiers, keyed by platform name.
    pub id: BTreeMap<String, String>,

    /// Display names, keyed by platform name.
    pub name: BTreeMap<String, String>,

    /// URL slugs, keyed by platform name.
    pub slug: BTreeMap<String, String>,

    /// Known artifacts for the recorded version.
    #[serde(default)]
    pub files: Vec<Artifact>,

    /// Identifier assigned when the project first enters a graph store.
    ///
    /// Stable for the project's lifetime inside that store; `None` until
    /// the project is added.
    #[serde(rename = "pakku_id", default, skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<GraphId>,

    /// Reverse-dependency edges: ids of projects in the same store that
    /// require this one.
    #[serde(rename = "pakku_links", default)]
    pub dependents: BTreeSet<GraphId>,

    /// Whether the license permits automated redistribution and caching.
    pub redistributable: bool,

    /// How the project follows upstream releases.
    #[serde(default)]
    pub update_strategy: UpdateStrategy,

    /// Extra ids/slugs/names this project is known under, fed into the
    /// identity test.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub aliases: BTreeSet<String>,
}

impl Project {
    /// The project's primary slug, used for deterministic ordering.
    ///
    /// Falls back through name and platform id so a project is always
    /// sortable.
    pub fn primary_slug(&self) -> &str {
        self.slug
            .values()
            .next()
            .or_else(|| self.name.values().next())
            .or_else(|| self.id.values().next())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// A human-readable name for logs and error reports.
    pub fn display_name(&self) -> &str {
        self.name
            .values()
            .next()
            .map(String::as_str)
            .unwrap_or_else(|| self.primary_slug())
    }

    /// The artifact a fetch run should materialize for this project:
    /// the first file the platforms provide a download for.
    pub fn primary_artifact(&self) -> Option<&Artifact> {
        self.files.iter().find(|file| file.is_downloadable())
    }

    /// Fold another description of the same project into this one.
    ///
    /// Used when several platform responses satisfy the identity test
    /// against each other. Identity fields union; this record's graph id
    /// and kind win. Artifacts from `other` are appended unless an equal
    /// artifact is already present.
    pub fn merge_from(&mut self, other: Project) {
        self.id.extend(other.id);
        self.name.extend(other.name);
        self.slug.extend(other.slug);
        self.aliases.extend(other.aliases);
        self.dependents.extend(other.dependents);
        self.redistributable = self.redistributable && other.redistributable;
        for file in other.files {
            if !self.files.contains(&file) {
                self.files.push(file);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn project(slug: &str) -> Project {
        Project {
            kind: ProjectType::Mod,
            id: BTreeMap::new(),
            name: BTreeMap::new(),
            slug: BTreeMap::from([("modrinth".to_string(), slug.to_string())]),
            files: Vec::new(),
            graph_id: None,
            dependents: BTreeSet::new(),
            redistributable: true,
            update_strategy: UpdateStrategy::Latest,
            aliases: BTreeSet::new(),
        }
    }

    #[test]
    fn test_primary_slug_falls_back_to_name_then_id() {
        let mut p = project("sodium");
        assert_eq!(p.primary_slug(), "sodium");

        p.slug.clear();
        p.name.insert("modrinth".to_string(), "Sodium".to_string());
        assert_eq!(p.primary_slug(), "Sodium");

        p.name.clear();
        p.id.insert("modrinth".to_string(), "AANobbMI".to_string());
        assert_eq!(p.primary_slug(), "AANobbMI");
    }

    #[test]
    fn test_merge_unions_identity_and_keeps_distinct_files() {
        let mut a = project("sodium");
        a.files.push(Artifact {
            url: Some("https://cdn.example/sodium-mr.jar".to_string()),
            file_name: "sodium-mr.jar".to_string(),
            size: 1,
            hashes: BTreeMap::new(),
            mc_versions: BTreeSet::new(),
            loaders: BTreeSet::new(),
        });

        let mut b = project("sodium");
        b.slug.insert("curseforge".to_string(), "sodium".to_string());
        b.redistributable = false;
        b.files = a.files.clone();

        a.merge_from(b);
        assert_eq!(a.slug.len(), 2);
        assert_eq!(a.files.len(), 1);
        assert!(!a.redistributable);
    }

    #[test]
    fn test_project_type_directories() {
        assert_eq!(ProjectType::Mod.directory(), "mods");
        assert_eq!(ProjectType::World.directory(), "saves");
        assert_eq!(ProjectType::ResourcePack.directory(), "resourcepacks");
    }
}
