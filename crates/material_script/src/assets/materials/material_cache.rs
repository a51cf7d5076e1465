//! Material cache for deduplicating and managing loaded script files
//!
//! Provides a caching layer on top of [`MaterialLoader`] so a script file is
//! parsed once and re-parsed only when its modification time changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use super::material::Material;
use super::material_loader::MaterialLoader;
use crate::MaterialError;

/// Cache entry with parsed materials and metadata
#[derive(Clone)]
struct CacheEntry {
    /// Materials in declaration order
    materials: Arc<[Material]>,
    /// File modification time when loaded
    modified_time: Option<SystemTime>,
}

/// Thread-safe cache of parsed material script files
#[derive(Default)]
pub struct MaterialCache {
    /// Cache storage: canonical path -> materials
    cache: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl MaterialCache {
    /// Create a new empty material cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a script file, using the cached parse if the file is unchanged
    ///
    /// # Returns
    /// The file's materials, shared with the cache
    pub fn load_or_get(&self, path: impl AsRef<Path>) -> Result<Arc<[Material]>, MaterialError> {
        let key = Self::make_cache_key(path.as_ref());

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = cache.get(&key) {
                if !Self::is_stale(&key, entry) {
                    return Ok(Arc::clone(&entry.materials));
                }
            }
        }

        self.reload(&key)
    }

    /// Look up one material by name within a script file
    pub fn get_material(&self, path: impl AsRef<Path>, name: &str) -> Result<Material, MaterialError> {
        self.load_or_get(path)?
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| MaterialError::NotFound(name.to_string()))
    }

    /// Get a cached file without loading
    pub fn get_cached(&self, path: impl AsRef<Path>) -> Option<Arc<[Material]>> {
        let key = Self::make_cache_key(path.as_ref());
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.get(&key).map(|entry| Arc::clone(&entry.materials))
    }

    /// Check every cached file for changes and reload the ones that changed
    ///
    /// Files that fail to reload keep their previous entry.
    ///
    /// # Returns
    /// Number of files reloaded
    pub fn check_for_updates(&self) -> usize {
        let stale: Vec<PathBuf> = {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            cache
                .iter()
                .filter(|(path, entry)| Self::is_stale(path, entry))
                .map(|(path, _)| path.clone())
                .collect()
        };

        let mut reloaded = 0;
        for path in stale {
            match self.reload(&path) {
                Ok(materials) => {
                    log::info!("Hot-reloaded {} material(s) from {:?}", materials.len(), path);
                    reloaded += 1;
                }
                Err(e) => log::warn!("Keeping cached materials for {:?}: {}", path, e),
            }
        }
        reloaded
    }

    /// Drop one file from the cache
    ///
    /// # Returns
    /// Whether the file was cached
    pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
        let key = Self::make_cache_key(path.as_ref());
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.remove(&key).is_some()
    }

    /// Drop every cached file
    pub fn clear(&self) {
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Number of cached files
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn reload(&self, key: &Path) -> Result<Arc<[Material]>, MaterialError> {
        let modified_time = Self::modified_time(key);
        let materials: Arc<[Material]> = MaterialLoader::load_file(key)?.into();

        let entry = CacheEntry {
            materials: Arc::clone(&materials),
            modified_time,
        };
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_path_buf(), entry);

        Ok(materials)
    }

    fn is_stale(path: &Path, entry: &CacheEntry) -> bool {
        match (entry.modified_time, Self::modified_time(path)) {
            (Some(cached), Some(current)) => current != cached,
            // Deleted or unreadable: keep serving the cached parse
            (_, None) => false,
            (None, Some(_)) => true,
        }
    }

    fn modified_time(path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).ok().and_then(|m| m.modified().ok())
    }

    fn make_cache_key(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
    }
}
