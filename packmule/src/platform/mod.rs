//! The platform client seam.
//!
//! Content platforms (their HTTP APIs, auth, response mapping) live
//! outside this crate. The core consumes them through
//! [`PlatformClient`]: resolution returns fully formed [`Project`]s
//! whose artifacts are already filtered and sorted by compatibility.
//!
//! Responses from different platforms that describe the same real-world
//! item are folded together with [`combine`] before entering the graph
//! store.

use crate::project::{same_project, Project};
use std::future::Future;
use thiserror::Error;

/// Resolution failures.
///
/// These surface to the driver per project and are never fatal to a
/// batch.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The platform knows no project under the given id or slug
    #[error("{query} not found on {platform}")]
    NotFound { platform: String, query: String },

    /// The query matched more than one project
    #[error("{query} is ambiguous on {platform}")]
    Ambiguous { platform: String, query: String },

    /// The caller passed an empty id or slug
    #[error("empty project query")]
    EmptyQuery,

    /// The platform request itself failed
    #[error("{platform}: {message}")]
    Platform { platform: String, message: String },
}

/// One content platform, as the core consumes it.
pub trait PlatformClient: Send + Sync {
    /// Platform name used as the key in per-platform project maps.
    fn platform_name(&self) -> &'static str;

    /// Resolves an id or slug to the best-matching project, artifacts
    /// already filtered and sorted by compatibility.
    fn resolve(
        &self,
        query: &str,
        mc_versions: &[String],
        loaders: &[String],
    ) -> impl Future<Output = Result<Project, ResolveError>> + Send;

    /// Bulk refresh for update flows. Returns at most `limit` projects.
    fn refresh_many(
        &self,
        ids: &[String],
        mc_versions: &[String],
        loaders: &[String],
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Project>, ResolveError>> + Send;
}

/// Folds platform responses into the minimal set of distinct projects.
///
/// Responses are merged pairwise in arrival order: each one either folds
/// into the first already-accepted project it matches under the identity
/// test, or starts a new entry. Chained identities (A~B, B~C) therefore
/// collapse as long as the linking response arrives between them.
pub fn combine(responses: Vec<Project>) -> Vec<Project> {
    let mut combined: Vec<Project> = Vec::new();
    for response in responses {
        match combined
            .iter_mut()
            .find(|existing| same_project(existing, &response))
        {
            Some(existing) => existing.merge_from(response),
            None => combined.push(response),
        }
    }
    combined
}
