//! Output layout configuration.
//!
//! Maps project types to directories under the bundle working directory
//! and carries the constants the orphan sweep needs: which directories
//! are never swept and which file extensions the tool considers managed.

use crate::project::ProjectType;
use std::path::{Path, PathBuf};

/// Directories the orphan sweep must never descend into, even when a
/// project type outputs there. Save games and screenshots hold
/// irreplaceable user data.
pub const PROTECTED_DIRECTORIES: &[&str] = &["saves", "screenshots"];

/// File extensions the tool manages. Files with other extensions are
/// left untouched by the orphan sweep.
pub const MANAGED_EXTENSIONS: &[&str] = &["jar", "zip", "litemod"];

/// All project types, in output-directory order.
const ALL_PROJECT_TYPES: [ProjectType; 5] = [
    ProjectType::Mod,
    ProjectType::ResourcePack,
    ProjectType::ShaderPack,
    ProjectType::World,
    ProjectType::DataPack,
];

/// Resolves artifact destinations under a bundle working directory.
///
/// # Example
///
/// ```
/// use packmule::config::OutputLayout;
/// use packmule::project::ProjectType;
/// use std::path::PathBuf;
///
/// let layout = OutputLayout::new("/bundle");
/// assert_eq!(
///     layout.destination_for(ProjectType::Mod, "sodium.jar"),
///     PathBuf::from("/bundle/mods/sodium.jar")
/// );
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    working_dir: PathBuf,
}

impl OutputLayout {
    /// Creates a layout rooted at the bundle working directory.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    /// The bundle working directory.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Output directory for a project type.
    pub fn directory_for(&self, kind: ProjectType) -> PathBuf {
        self.working_dir.join(kind.directory())
    }

    /// Destination path for an artifact of the given project type.
    pub fn destination_for(&self, kind: ProjectType, file_name: &str) -> PathBuf {
        self.directory_for(kind).join(file_name)
    }

    /// The distinct project-type output directories the orphan sweep may
    /// reconcile: every type directory that is not protected.
    pub fn sweepable_directories(&self) -> Vec<PathBuf> {
        ALL_PROJECT_TYPES
            .iter()
            .filter(|kind| !is_protected(kind.directory()))
            .map(|kind| self.directory_for(*kind))
            .collect()
    }
}

/// Whether a directory name is on the protected list.
pub fn is_protected(dir_name: &str) -> bool {
    PROTECTED_DIRECTORIES.contains(&dir_name)
}

/// Whether a file path carries a managed extension.
pub fn is_managed(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MANAGED_EXTENSIONS
                .iter()
                .any(|managed| managed.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_joins_type_directory() {
        let layout = OutputLayout::new("/pack");
        assert_eq!(
            layout.destination_for(ProjectType::ShaderPack, "bsl.zip"),
            PathBuf::from("/pack/shaderpacks/bsl.zip")
        );
    }

    #[test]
    fn test_sweepable_directories_exclude_protected() {
        let layout = OutputLayout::new("/pack");
        let dirs = layout.sweepable_directories();
        assert!(dirs.contains(&PathBuf::from("/pack/mods")));
        assert!(!dirs.iter().any(|d| d.ends_with("saves")));
        assert!(!dirs.iter().any(|d| d.ends_with("screenshots")));
    }

    #[test]
    fn test_is_managed_by_extension() {
        assert!(is_managed(Path::new("mods/sodium.jar")));
        assert!(is_managed(Path::new("resourcepacks/pack.ZIP")));
        assert!(!is_managed(Path::new("mods/readme.txt")));
        assert!(!is_managed(Path::new("mods/noext")));
    }
}
