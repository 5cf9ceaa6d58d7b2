//! Content hashing for produced artifacts.
//!
//! Every file a step writes is recorded with its SHA-256 digest, so two runs
//! over unchanged inputs can be compared artifact by artifact.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// A full 64-character SHA-256 hash of some content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl ContentHash {
  /// First 12 characters, for display.
  pub fn short(&self) -> &str {
    &self.0[..self.0.len().min(12)]
  }
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> std::io::Result<ContentHash> {
  let mut file = fs::File::open(path)?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

/// Compute a deterministic hash of a directory tree.
///
/// Covers relative paths and file contents, not timestamps or permissions.
/// Entries are visited in file-name order.
pub fn hash_directory(path: &Path) -> std::io::Result<ContentHash> {
  let mut hasher = Sha256::new();

  for entry in WalkDir::new(path).sort_by_file_name() {
    let entry = entry.map_err(std::io::Error::other)?;
    let rel_path = entry.path().strip_prefix(path).unwrap_or(entry.path());
    if rel_path.as_os_str().is_empty() {
      continue;
    }
    let rel_path = rel_path.to_string_lossy().replace('\\', "/");

    let line = if entry.file_type().is_file() {
      format!("F:{}:{}", rel_path, hash_file(entry.path())?.0)
    } else if entry.file_type().is_dir() {
      format!("D:{}", rel_path)
    } else {
      continue;
    };
    hasher.update(line.as_bytes());
    hasher.update(b"\n");
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}
