use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::types::IndicatorTable;

/// Configuration for dataset caching
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool, // false when --no-cache
    /// Entries older than this are reloaded even if the file is unchanged
    pub max_age: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age: None,
        }
    }
}

/// Get the platform-appropriate cache directory for district-rank
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("district-rank/datasets"))
        .unwrap_or_else(|| std::env::temp_dir().join("district-rank/datasets"))
}

/// Clear the on-disk dataset cache
pub fn clear_cache(cache_path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// Identity of a file's contents at load time: length plus modification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub len: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl Fingerprint {
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

/// Where a table handed out by the cache came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Memory,
    Disk,
    Loaded,
}

#[derive(Clone)]
struct CacheEntry {
    fingerprint: Fingerprint,
    stored_at: DateTime<Utc>,
    table: Arc<IndicatorTable>,
}

/// Serializable representation of a cache entry for disk storage
#[derive(Serialize, Deserialize)]
struct DiskCacheEntry {
    fingerprint: Fingerprint,
    stored_at: DateTime<Utc>,
    table: IndicatorTable,
}

impl DiskCacheEntry {
    fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            fingerprint: entry.fingerprint.clone(),
            stored_at: entry.stored_at,
            table: IndicatorTable::clone(&entry.table),
        }
    }

    fn into_entry(self) -> CacheEntry {
        CacheEntry {
            fingerprint: self.fingerprint,
            stored_at: self.stored_at,
            table: Arc::new(self.table),
        }
    }
}

/// Dataset cache keyed by canonical file path and validated by [`Fingerprint`].
///
/// Entries live in memory for the life of the cache and on disk (cacache) across
/// runs. A fingerprint mismatch or an expired entry invalidates the entry.
#[derive(Clone)]
pub struct DatasetCache {
    inner: Arc<Mutex<HashMap<String, CacheEntry>>>,
    cache_path: PathBuf,
    config: CacheConfig,
}

impl DatasetCache {
    pub fn new(cache_path: PathBuf, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            cache_path,
            config,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn key_for(path: &Path) -> String {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        format!("dataset:{}", canonical.display())
    }

    /// Return the cached table for `path` if it is still valid, otherwise run
    /// `load` and cache its result.
    pub fn get_or_load<F>(&self, path: &Path, load: F) -> Result<(Arc<IndicatorTable>, CacheSource)>
    where
        F: FnOnce(&Path) -> Result<IndicatorTable>,
    {
        if !self.config.enabled {
            return Ok((Arc::new(load(path)?), CacheSource::Loaded));
        }

        let key = Self::key_for(path);
        let fingerprint = Fingerprint::of(path)?;

        if let Some(entry) = self.entries().get(&key) {
            if self.is_valid(entry, &fingerprint) {
                return Ok((entry.table.clone(), CacheSource::Memory));
            }
        }

        if let Some(entry) = self.load_from_disk(&key) {
            if self.is_valid(&entry, &fingerprint) {
                let table = entry.table.clone();
                self.entries().insert(key, entry);
                return Ok((table, CacheSource::Disk));
            }
        }

        self.invalidate(path);
        let table = Arc::new(load(path)?);
        let entry = CacheEntry {
            fingerprint,
            stored_at: Utc::now(),
            table: table.clone(),
        };
        if let Err(e) = self.write_to_disk(&key, &entry) {
            crate::buffered_eprintln!("Warning: failed to write dataset cache: {:#}", e);
        }
        self.entries().insert(key, entry);

        Ok((table, CacheSource::Loaded))
    }

    /// Drop the entry for `path` from memory and disk.
    pub fn invalidate(&self, path: &Path) {
        let key = Self::key_for(path);
        self.entries().remove(&key);
        // Missing entries are fine
        let _ = cacache::remove_sync(&self.cache_path, &key);
    }

    /// Clear the in-memory cache to force a disk lookup on next load
    pub fn clear_memory(&self) {
        self.entries().clear();
    }

    fn is_valid(&self, entry: &CacheEntry, fingerprint: &Fingerprint) -> bool {
        if &entry.fingerprint != fingerprint {
            return false;
        }
        match self.config.max_age {
            Some(max_age) => chrono::Duration::from_std(max_age)
                .map(|max| Utc::now() - entry.stored_at < max)
                .unwrap_or(true),
            None => true,
        }
    }

    fn load_from_disk(&self, key: &str) -> Option<CacheEntry> {
        let bytes = cacache::read_sync(&self.cache_path, key).ok()?;
        let entry: DiskCacheEntry = serde_json::from_slice(&bytes).ok()?;
        Some(entry.into_entry())
    }

    fn write_to_disk(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        let json = serde_json::to_vec(&DiskCacheEntry::from_entry(entry))?;
        cacache::write_sync(&self.cache_path, key, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::env;

    fn temp_paths(name: &str) -> (PathBuf, PathBuf) {
        let dir = env::temp_dir().join(format!("district_rank_cache_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        (dir.join("data.csv"), dir.join("cache"))
    }

    fn counting_loader(calls: &Cell<u32>) -> impl FnOnce(&Path) -> Result<IndicatorTable> + '_ {
        move |path| {
            calls.set(calls.get() + 1);
            crate::data::load_indicators(path)
        }
    }

    #[test]
    fn test_second_load_hits_memory() {
        let (csv, cache_dir) = temp_paths("memory");
        std::fs::write(&csv, "ADM2_EN,rain\nGalle,2100\n").unwrap();
        let cache = DatasetCache::new(cache_dir, CacheConfig::default());
        let calls = Cell::new(0);

        let (_, first) = cache.get_or_load(&csv, counting_loader(&calls)).unwrap();
        let (table, second) = cache.get_or_load(&csv, counting_loader(&calls)).unwrap();

        assert_eq!(first, CacheSource::Loaded);
        assert_eq!(second, CacheSource::Memory);
        assert_eq!(calls.get(), 1);
        assert_eq!(table.records[0].values, vec![2100.0]);
    }

    #[test]
    fn test_disk_survives_memory_clear() {
        let (csv, cache_dir) = temp_paths("disk");
        std::fs::write(&csv, "ADM2_EN,rain\nGalle,2100\n").unwrap();
        let cache = DatasetCache::new(cache_dir.clone(), CacheConfig::default());
        let calls = Cell::new(0);

        cache.get_or_load(&csv, counting_loader(&calls)).unwrap();
        cache.clear_memory();
        let (_, source) = cache.get_or_load(&csv, counting_loader(&calls)).unwrap();
        assert_eq!(source, CacheSource::Disk);

        // A fresh cache over the same directory sees the entry too
        let other = DatasetCache::new(cache_dir, CacheConfig::default());
        let (_, source) = other.get_or_load(&csv, counting_loader(&calls)).unwrap();
        assert_eq!(source, CacheSource::Disk);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_changed_file_is_reloaded() {
        let (csv, cache_dir) = temp_paths("changed");
        std::fs::write(&csv, "ADM2_EN,rain\nGalle,2100\n").unwrap();
        let cache = DatasetCache::new(cache_dir, CacheConfig::default());
        let calls = Cell::new(0);

        cache.get_or_load(&csv, counting_loader(&calls)).unwrap();
        // Different length guarantees a different fingerprint
        std::fs::write(&csv, "ADM2_EN,rain\nGalle,2100\nMatara,2300\n").unwrap();
        let (table, source) = cache.get_or_load(&csv, counting_loader(&calls)).unwrap();

        assert_eq!(source, CacheSource::Loaded);
        assert_eq!(table.len(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_explicit_invalidate() {
        let (csv, cache_dir) = temp_paths("invalidate");
        std::fs::write(&csv, "ADM2_EN,rain\nGalle,2100\n").unwrap();
        let cache = DatasetCache::new(cache_dir, CacheConfig::default());
        let calls = Cell::new(0);

        cache.get_or_load(&csv, counting_loader(&calls)).unwrap();
        cache.invalidate(&csv);
        let (_, source) = cache.get_or_load(&csv, counting_loader(&calls)).unwrap();
        assert_eq!(source, CacheSource::Loaded);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_disabled_cache_always_loads() {
        let (csv, cache_dir) = temp_paths("disabled");
        std::fs::write(&csv, "ADM2_EN,rain\nGalle,2100\n").unwrap();
        let config = CacheConfig {
            enabled: false,
            max_age: None,
        };
        let cache = DatasetCache::new(cache_dir.clone(), config);
        let calls = Cell::new(0);

        cache.get_or_load(&csv, counting_loader(&calls)).unwrap();
        let (_, source) = cache.get_or_load(&csv, counting_loader(&calls)).unwrap();
        assert_eq!(source, CacheSource::Loaded);
        assert_eq!(calls.get(), 2);
        assert!(!cache_dir.exists());
    }

    #[test]
    fn test_expired_entry_is_reloaded() {
        let (csv, cache_dir) = temp_paths("expired");
        std::fs::write(&csv, "ADM2_EN,rain\nGalle,2100\n").unwrap();
        let config = CacheConfig {
            enabled: true,
            max_age: Some(Duration::ZERO),
        };
        let cache = DatasetCache::new(cache_dir, config);
        let calls = Cell::new(0);

        cache.get_or_load(&csv, counting_loader(&calls)).unwrap();
        let (_, source) = cache.get_or_load(&csv, counting_loader(&calls)).unwrap();
        assert_eq!(source, CacheSource::Loaded);
    }

    #[test]
    fn test_load_error_is_not_cached() {
        let (csv, cache_dir) = temp_paths("error");
        std::fs::write(&csv, "ADM2_EN,rain\nGalle,wet\n").unwrap();
        let cache = DatasetCache::new(cache_dir, CacheConfig::default());
        let calls = Cell::new(0);

        assert!(cache.get_or_load(&csv, counting_loader(&calls)).is_err());
        assert!(cache.get_or_load(&csv, counting_loader(&calls)).is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_fingerprint_missing_file() {
        let path = env::temp_dir().join("district_rank_no_such_file.csv");
        let _ = std::fs::remove_file(&path);
        assert!(Fingerprint::of(&path).is_err());
    }

    #[test]
    fn test_clear_cache_missing_dir_is_ok() {
        let dir = env::temp_dir().join("district_rank_cache_never_created");
        let _ = std::fs::remove_dir_all(&dir);
        assert!(clear_cache(&dir).is_ok());
    }
}
