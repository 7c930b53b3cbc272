//! The dependency graph store.
//!
//! A [`GraphStore`] is the persisted collection of projects for one
//! content bundle, plus the bundle-level settings (target game versions
//! and loader set). It owns identity assignment and link maintenance and
//! is the unit of durable state: every mutating operation re-serializes
//! the whole store (see [`persist`]).
//!
//! The store is an arena: a map from [`GraphId`] to project record.
//! Dependency edges are plain id references, so no record owns another
//! and back-edges cannot form ownership cycles.
//!
//! # Concurrency
//!
//! The store is single-writer. The driver mutates it between fetch and
//! sweep passes; the pipeline and sweep only read it.

mod persist;

pub use persist::StoreError;

use crate::project::{same_project, Project};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Opaque unique identifier assigned to a project when it first enters a
/// graph store. Stable for the project's lifetime inside that store and
/// never reused after removal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(String);

impl GraphId {
    /// Wraps an id read from a persisted record.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The persisted collection of projects for one content bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStore {
    pack_name: String,
    mc_versions: Vec<String>,
    loaders: Vec<String>,
    projects: BTreeMap<GraphId, Project>,
}

impl GraphStore {
    /// Creates an empty store for a bundle.
    pub fn new(
        pack_name: impl Into<String>,
        mc_versions: Vec<String>,
        loaders: Vec<String>,
    ) -> Self {
        Self {
            pack_name: pack_name.into(),
            mc_versions,
            loaders,
            projects: BTreeMap::new(),
        }
    }

    /// The bundle name.
    pub fn pack_name(&self) -> &str {
        &self.pack_name
    }

    /// Target game versions, in preference order.
    pub fn mc_versions(&self) -> &[String] {
        &self.mc_versions
    }

    /// Target loaders, in preference order.
    pub fn loaders(&self) -> &[String] {
        &self.loaders
    }

    /// Number of projects in the store.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the store holds no projects.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Adds a project to the store.
    ///
    /// Rejects the project (returns `false`, store unchanged) when an
    /// existing record satisfies the identity test against it. Otherwise
    /// assigns a fresh [`GraphId`] and inserts.
    pub fn add(&mut self, mut project: Project) -> bool {
        if self.is_added(&project) {
            debug!(
                slug = project.primary_slug(),
                "Rejecting duplicate project"
            );
            return false;
        }

        let id = self.mint_graph_id();
        project.graph_id = Some(id.clone());
        debug!(slug = project.primary_slug(), graph_id = %id, "Adding project");
        self.projects.insert(id, project);
        true
    }

    /// Whether an existing record satisfies the identity test against
    /// `candidate`.
    pub fn is_added(&self, candidate: &Project) -> bool {
        self.projects
            .values()
            .any(|existing| same_project(existing, candidate))
    }

    /// Finds the stored record matching `candidate` by identity test.
    pub fn find(&self, candidate: &Project) -> Option<&Project> {
        self.projects
            .values()
            .find(|existing| same_project(existing, candidate))
    }

    /// Finds a stored record by any platform slug, case-insensitive.
    pub fn find_by_slug(&self, slug: &str) -> Option<&Project> {
        self.projects.values().find(|project| {
            project
                .slug
                .values()
                .any(|candidate| candidate.eq_ignore_ascii_case(slug))
        })
    }

    /// Looks up a record by graph id.
    pub fn get(&self, id: &GraphId) -> Option<&Project> {
        self.projects.get(id)
    }

    /// Records that the project identified by `owner` requires
    /// `dependency`: finds the stored record matching `dependency` by
    /// identity test and adds `owner` to its dependents set. No-op when
    /// no record matches.
    pub fn link_dependency(&mut self, owner: &GraphId, dependency: &Project) {
        let record = self
            .projects
            .values_mut()
            .find(|existing| same_project(existing, dependency));
        match record {
            Some(record) => {
                record.dependents.insert(owner.clone());
            }
            None => {
                debug!(
                    owner = %owner,
                    dependency = dependency.primary_slug(),
                    "Dependency not in store, link skipped"
                );
            }
        }
    }

    /// Removes a record from the store, returning it.
    ///
    /// Dangling references to the removed id in other records' dependents
    /// sets are left in place: callers are expected to consult
    /// [`dependents_of`](Self::dependents_of) first and decide whether
    /// removal is safe. This is an advisory check, not a cascading
    /// delete.
    pub fn remove(&mut self, id: &GraphId) -> Option<Project> {
        let removed = self.projects.remove(id);
        if let Some(project) = &removed {
            debug!(slug = project.primary_slug(), graph_id = %id, "Removed project");
        }
        removed
    }

    /// The projects that require the project identified by `id`.
    pub fn dependents_of(&self, id: &GraphId) -> Vec<&Project> {
        let Some(record) = self.projects.get(id) else {
            return Vec::new();
        };
        record
            .dependents
            .iter()
            .filter_map(|dependent| self.projects.get(dependent))
            .collect()
    }

    /// Attaches a verified artifact to a stored record.
    ///
    /// The driver calls this after a fetch pass; identity fields are
    /// never touched. Equal artifacts are not duplicated.
    pub fn attach_artifact(&mut self, id: &GraphId, artifact: crate::project::Artifact) {
        if let Some(record) = self.projects.get_mut(id) {
            if !record.files.contains(&artifact) {
                record.files.push(artifact);
            }
        }
    }

    /// All projects, sorted by primary slug for reproducible downstream
    /// processing.
    pub fn all_projects(&self) -> Vec<&Project> {
        let mut projects: Vec<&Project> = self.projects.values().collect();
        projects.sort_by(|a, b| a.primary_slug().cmp(b.primary_slug()));
        projects
    }

    /// Mints an id not currently present in the arena.
    fn mint_graph_id(&self) -> GraphId {
        let mut rng = rand::thread_rng();
        loop {
            let raw: [u8; 8] = rng.gen();
            let id = GraphId(raw.iter().map(|b| format!("{:02x}", b)).collect());
            if !self.projects.contains_key(&id) {
                return id;
            }
        }
    }
}
