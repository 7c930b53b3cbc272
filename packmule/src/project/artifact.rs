//! Artifact records.

use crate::integrity::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One concrete downloadable file belonging to a project version.
///
/// An artifact with a populated `url` must advertise at least one hash;
/// platform clients that find no downloadable file for a project emit an
/// artifact with `url: None` instead, which marks the project as having
/// no files on that platform.
///
/// Field names follow the persisted lock-file layout and must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Remote location of the file, if the platform provides one.
    pub url: Option<String>,

    /// File name the artifact is written under in the output tree.
    pub file_name: String,

    /// Advertised size in bytes.
    pub size: u64,

    /// Advertised digests, keyed by algorithm, lowercase hex values.
    #[serde(default)]
    pub hashes: BTreeMap<HashAlgorithm, String>,

    /// Game versions this file is compatible with.
    #[serde(default)]
    pub mc_versions: BTreeSet<String>,

    /// Loaders this file is compatible with.
    #[serde(default)]
    pub loaders: BTreeSet<String>,
}

impl Artifact {
    /// Whether the platform provides a downloadable file for this artifact.
    pub fn is_downloadable(&self) -> bool {
        self.url.is_some()
    }

    /// The artifact's primary hash: the strongest advertised digest.
    ///
    /// Preference order is sha512, sha1, sha256, md5. A mismatch against
    /// the primary hash is a permanent integrity failure; mismatches
    /// against the remaining digests are advisory.
    pub fn primary_hash(&self) -> Option<(HashAlgorithm, &str)> {
        HashAlgorithm::PREFERENCE
            .iter()
            .find_map(|algo| self.hashes.get(algo).map(|hex| (*algo, hex.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact_with(hashes: &[(HashAlgorithm, &str)]) -> Artifact {
        Artifact {
            url: Some("https://cdn.example/a.jar".to_string()),
            file_name: "a.jar".to_string(),
            size: 10,
            hashes: hashes
                .iter()
                .map(|(a, h)| (*a, h.to_string()))
                .collect(),
            mc_versions: BTreeSet::new(),
            loaders: BTreeSet::new(),
        }
    }

    #[test]
    fn test_primary_hash_prefers_strongest() {
        let artifact = artifact_with(&[
            (HashAlgorithm::Md5, "aa"),
            (HashAlgorithm::Sha1, "bb"),
            (HashAlgorithm::Sha512, "cc"),
        ]);
        assert_eq!(artifact.primary_hash(), Some((HashAlgorithm::Sha512, "cc")));
    }

    #[test]
    fn test_primary_hash_falls_back_to_sha1() {
        let artifact = artifact_with(&[(HashAlgorithm::Sha1, "bb"), (HashAlgorithm::Md5, "aa")]);
        assert_eq!(artifact.primary_hash(), Some((HashAlgorithm::Sha1, "bb")));
    }

    #[test]
    fn test_primary_hash_empty() {
        let artifact = artifact_with(&[]);
        assert_eq!(artifact.primary_hash(), None);
    }
}
