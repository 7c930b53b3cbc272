//! The `deps` subcommand.

use crate::error::CliError;
use packmule::store::GraphStore;
use std::path::Path;

/// Shows which projects require the given project.
///
/// This is the advisory check to run before removing a project: a
/// non-empty answer means removal leaves dependents behind.
pub fn deps(store_path: &Path, slug: &str) -> Result<(), CliError> {
    let store = GraphStore::load(store_path)?;
    let project = store
        .find_by_slug(slug)
        .ok_or_else(|| CliError::UnknownProject {
            slug: slug.to_string(),
        })?;

    let Some(id) = project.graph_id.clone() else {
        println!("{} is not linked into the graph.", project.primary_slug());
        return Ok(());
    };

    let dependents = store.dependents_of(&id);
    if dependents.is_empty() {
        println!("Nothing requires {}; safe to remove.", project.primary_slug());
    } else {
        println!("{} is required by:", project.primary_slug());
        for dependent in dependents {
            println!("  {}", dependent.primary_slug());
        }
    }
    Ok(())
}
