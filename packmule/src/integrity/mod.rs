//! Content integrity utilities.
//!
//! Shared digest support for the fetch pipeline (verifying downloaded
//! artifacts against their advertised hashes) and the orphan sweep
//! (content-addressing files already on disk).

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

/// Digest algorithms advertised by content platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha512,
    Md5,
}

impl HashAlgorithm {
    /// Algorithms ordered strongest-first, used to pick an artifact's
    /// primary hash when several are advertised.
    pub const PREFERENCE: [HashAlgorithm; 4] = [
        HashAlgorithm::Sha512,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Md5,
    ];
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha1 => write!(f, "sha1"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Sha512 => write!(f, "sha512"),
            HashAlgorithm::Md5 => write!(f, "md5"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "md5" => Ok(HashAlgorithm::Md5),
            other => Err(format!("unknown hash algorithm: {}", other)),
        }
    }
}

/// Digest `bytes` with the given algorithm.
///
/// Returns the digest as a lowercase hex string.
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Sha1 => format!("{:x}", Sha1::digest(bytes)),
        HashAlgorithm::Sha256 => format!("{:x}", Sha256::digest(bytes)),
        HashAlgorithm::Sha512 => format!("{:x}", Sha512::digest(bytes)),
        HashAlgorithm::Md5 => format!("{:x}", Md5::digest(bytes)),
    }
}

/// Digest a file's contents with the given algorithm.
///
/// Reads the file in 8 KiB chunks so large archives are never held in
/// memory whole. Returns the digest as a lowercase hex string.
///
/// # Errors
///
/// Returns error if the file cannot be opened or read.
pub fn hash_file(algorithm: HashAlgorithm, path: &Path) -> io::Result<String> {
    match algorithm {
        HashAlgorithm::Sha1 => hash_reader::<Sha1>(path),
        HashAlgorithm::Sha256 => hash_reader::<Sha256>(path),
        HashAlgorithm::Sha512 => hash_reader::<Sha512>(path),
        HashAlgorithm::Md5 => hash_reader::<Md5>(path),
    }
}

fn hash_reader<D>(path: &Path) -> io::Result<String>
where
    D: Digest,
    sha2::digest::Output<D>: fmt::LowerHex,
{
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bytes_known_vectors() {
        assert_eq!(
            hash_bytes(HashAlgorithm::Sha1, b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            hash_bytes(HashAlgorithm::Sha256, b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            hash_bytes(HashAlgorithm::Sha512, b"abc"),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
        assert_eq!(
            hash_bytes(HashAlgorithm::Md5, b"abc"),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[test]
    fn test_hash_file_matches_hash_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, b"hello world").unwrap();

        let from_file = hash_file(HashAlgorithm::Sha256, &path).unwrap();
        assert_eq!(from_file, hash_bytes(HashAlgorithm::Sha256, b"hello world"));
    }

    #[test]
    fn test_hash_file_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = hash_file(HashAlgorithm::Sha1, &dir.path().join("nope.jar"));
        assert!(result.is_err());
    }

    #[test]
    fn test_algorithm_round_trips_through_display() {
        for algo in HashAlgorithm::PREFERENCE {
            assert_eq!(algo.to_string().parse::<HashAlgorithm>(), Ok(algo));
        }
    }
}
