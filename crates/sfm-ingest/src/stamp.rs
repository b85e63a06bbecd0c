//! Data-file change detection.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sha2::{Digest, Sha256};

use crate::error::{IngestError, Result};

/// Modification time and content hash of a data file at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFileStamp {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
    pub content_hash: String,
}

impl DataFileStamp {
    pub fn capture(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| IngestError::read(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: metadata.modified().ok(),
            len: metadata.len(),
            content_hash: hash_file(path)?,
        })
    }

    /// True when the file's modification time or content differs.
    ///
    /// A matching modification time and length short-circuits hashing.
    pub fn has_changed(&self) -> Result<bool> {
        let metadata = std::fs::metadata(&self.path).map_err(|e| IngestError::Metadata {
            path: self.path.clone(),
            source: e,
        })?;
        let modified = metadata.modified().ok();
        if modified.is_some() && modified == self.modified && metadata.len() == self.len {
            return Ok(false);
        }
        Ok(hash_file(&self.path)? != self.content_hash)
    }
}

fn hash_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| IngestError::read(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|e| IngestError::read(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_file_reports_no_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.db");
        std::fs::write(&path, "\\lx a\n").unwrap();
        let stamp = DataFileStamp::capture(&path).unwrap();
        assert!(!stamp.has_changed().unwrap());
    }

    #[test]
    fn edited_content_reports_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.db");
        std::fs::write(&path, "\\lx a\n").unwrap();
        let mut stamp = DataFileStamp::capture(&path).unwrap();
        std::fs::write(&path, "\\lx b\n").unwrap();
        // Force the hash comparison even if the clock did not move.
        stamp.modified = None;
        assert!(stamp.has_changed().unwrap());
    }
}
