//! Local cache mapping issue ids to the run id created at submission.
//!
//! Stored as a single JSON object on disk. A missing, unreadable or
//! corrupt file reads as empty; writes go through a temp file in the same
//! directory and are renamed into place.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::domain::{DecideError, Result};

/// Cache location relative to the working directory.
pub const DEFAULT_PATH: &str = ".decide/issue_runs.json";

#[derive(Debug, Clone)]
pub struct RunCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl RunCache {
    /// Load the cache at `path`.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "run cache unreadable, starting empty");
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "run cache unreadable, starting empty");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn open_default() -> Self {
        Self::open(DEFAULT_PATH)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, issue_id: &str) -> Option<&str> {
        self.entries.get(issue_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Remember `run_id` for `issue_id` and persist the whole map.
    pub fn record(&mut self, issue_id: &str, run_id: &str) -> Result<()> {
        self.entries.insert(issue_id.to_string(), run_id.to_string());
        self.save()
    }

    fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let data = serde_json::to_vec_pretty(&self.entries)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&data)?;
        tmp.persist(&self.path)
            .map_err(|e| DecideError::RunCache(format!("{}: {}", self.path.display(), e.error)))?;
        tracing::debug!(path = %self.path.display(), entries = self.entries.len(), "run cache saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RunCache::open(dir.path().join("nope.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(RunCache::open(&path).is_empty());
    }

    #[test]
    fn record_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("runs.json");
        let mut cache = RunCache::open(&path);
        cache.record("iss-1", "run-1").unwrap();
        cache.record("iss-2", "run-2").unwrap();
        cache.record("iss-1", "run-3").unwrap();

        let reopened = RunCache::open(&path);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("iss-1"), Some("run-3"));
        assert_eq!(reopened.get("iss-2"), Some("run-2"));
        assert_eq!(reopened.get("iss-9"), None);
    }
}
