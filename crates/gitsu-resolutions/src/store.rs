//! Atomic, lock-protected persistence for the `rId -> target` resolutions
//! table (spec §6): the core only ever touches this map in memory, so
//! whatever embeds the engine is responsible for loading it before
//! `resolve()` and saving it back after, matched here by
//! [`ResolutionsStore::load`] / [`ResolutionsStore::save`].
//!
//! Writes follow the same crash-safe shape as the teacher's lock-file
//! writer: acquire an exclusive advisory lock, write to a sibling temp
//! file, `fsync`, then rename into place so a reader never observes a
//! half-written file.

use crate::error::{ResolutionsError, Result};
use fs2::FileExt;
use gitsu_core::AHashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Loads and atomically persists a resolutions table at a fixed path.
#[derive(Debug, Clone)]
pub struct ResolutionsStore {
    path: PathBuf,
}

impl ResolutionsStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the table, returning an empty one if the file does not exist.
    pub fn load(&self) -> Result<AHashMap<String, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AHashMap::new()),
            Err(e) => return Err(ResolutionsError::io(&self.path, e)),
        };
        sonic_rs::from_str(&content).map_err(|e| ResolutionsError::InvalidJson {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Persist the table, replacing the previous contents in one atomic step.
    pub fn save(&self, resolutions: &AHashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ResolutionsError::io(parent, e))?;
            }
        }

        let lock_path = self.path.with_extension("json.lock");
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| ResolutionsError::io(&lock_path, e))?;
        FileExt::lock_exclusive(&lock_file)
            .map_err(|e| ResolutionsError::Lock { path: lock_path.clone(), source: e })?;

        let json = gitsu_core::to_json_pretty(resolutions)
            .map_err(|e| ResolutionsError::InvalidJson { path: self.path.clone(), message: e.to_string() })?;

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut temp_file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| ResolutionsError::io(&temp_path, e))?;
            temp_file.write_all(json.as_bytes()).map_err(|e| ResolutionsError::io(&temp_path, e))?;
            temp_file.sync_all().map_err(|e| ResolutionsError::io(&temp_path, e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| ResolutionsError::io(&self.path, e))?;

        #[cfg(unix)]
        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        FileExt::unlock(&lock_file).map_err(|e| ResolutionsError::Lock { path: lock_path.clone(), source: e })?;
        let _ = fs::remove_file(&lock_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ResolutionsStore::new(tmp.path().join("resolutions.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ResolutionsStore::new(tmp.path().join("resolutions.json"));
        let mut table = AHashMap::new();
        table.insert("jquery".to_string(), ">=1.9.0 <2.0.0".to_string());
        store.save(&table).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.get("jquery").map(String::as_str), Some(">=1.9.0 <2.0.0"));
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("resolutions.json");
        let store = ResolutionsStore::new(&path);
        store.save(&AHashMap::new()).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert!(!path.with_extension("json.lock").exists());
    }

    #[test]
    fn corrupt_file_surfaces_as_invalid_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("resolutions.json");
        fs::write(&path, b"not json").unwrap();
        let store = ResolutionsStore::new(&path);
        assert!(matches!(store.load(), Err(ResolutionsError::InvalidJson { .. })));
    }
}
