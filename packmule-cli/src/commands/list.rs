//! The `list` subcommand.

use crate::error::CliError;
use packmule::store::GraphStore;
use std::path::Path;

/// Prints the store's projects, sorted by slug.
pub fn list(store_path: &Path, detailed: bool) -> Result<(), CliError> {
    let store = GraphStore::load(store_path)?;

    println!(
        "{} ({} projects, game {}, loaders {})",
        store.pack_name(),
        store.len(),
        store.mc_versions().join(", "),
        store.loaders().join(", "),
    );

    for project in store.all_projects() {
        println!(
            "  {} [{}] {} ({} files)",
            project.primary_slug(),
            project.kind,
            project.update_strategy,
            project.files.len(),
        );
        if detailed {
            for artifact in &project.files {
                match &artifact.url {
                    Some(url) => println!("    {} ({} bytes) <- {}", artifact.file_name, artifact.size, url),
                    None => println!("    {} (no file on platform)", artifact.file_name),
                }
                for (algorithm, digest) in &artifact.hashes {
                    println!("      {}: {}", algorithm, digest);
                }
            }
        }
    }
    Ok(())
}
