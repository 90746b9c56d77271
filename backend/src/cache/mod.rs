//! Table Cache - keep parsed source tables for the life of the process
//!
//! Source files are static per deployment, so a table is read once per file
//! identity (canonical path, modification time, length). Entries only go
//! away on [`TableCache::clear`] or process restart.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use crate::error::ParseResult;
use crate::parser::{read_table, RawTable};

/// Process-wide table cache.
pub static TABLE_CACHE: Lazy<TableCache> = Lazy::new(TableCache::new);

/// Identity of a file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl FileKey {
    /// Build the key from current file metadata.
    pub fn for_path(path: &Path) -> std::io::Result<Self> {
        let path = path.canonicalize()?;
        let metadata = std::fs::metadata(&path)?;
        Ok(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
            path,
        })
    }
}

/// A cached table with metadata
#[derive(Debug, Clone)]
struct CachedTable {
    table: Arc<RawTable>,
    loaded_at: String,
}

/// Summary of one cache entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryInfo {
    pub path: String,
    pub rows: usize,
    pub loaded_at: String,
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Cache of parsed tables keyed by [`FileKey`].
pub struct TableCache {
    entries: Mutex<HashMap<FileKey, CachedTable>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TableCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<FileKey, CachedTable>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the cached table for `path`, reading it with `load` on a miss.
    ///
    /// The file is read outside the lock; if two callers race on the same
    /// miss, the first insert wins and both get the same table.
    pub fn get_or_load<F>(&self, path: &Path, load: F) -> ParseResult<Arc<RawTable>>
    where
        F: FnOnce(&Path) -> ParseResult<RawTable>,
    {
        let key = FileKey::for_path(path)?;

        if let Some(cached) = self.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(&cached.table));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let table = Arc::new(load(path)?);
        let mut entries = self.lock();
        let cached = entries.entry(key).or_insert_with(|| CachedTable {
            table,
            loaded_at: chrono::Utc::now().to_rfc3339(),
        });
        Ok(Arc::clone(&cached.table))
    }

    /// Cached read of any supported table format.
    pub fn get_or_read(&self, path: &Path) -> ParseResult<Arc<RawTable>> {
        self.get_or_load(path, |p| read_table(p))
    }

    /// Drop every entry and reset counters.
    pub fn clear(&self) {
        self.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Describe every cached table, sorted by path.
    pub fn entries(&self) -> Vec<CacheEntryInfo> {
        let mut infos: Vec<CacheEntryInfo> = self
            .lock()
            .iter()
            .map(|(key, cached)| CacheEntryInfo {
                path: key.path.display().to_string(),
                rows: cached.table.row_count(),
                loaded_at: cached.loaded_at.clone(),
            })
            .collect();
        infos.sort_by(|a, b| a.path.cmp(&b.path));
        infos
    }
}

impl Default for TableCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_second_read_hits_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saldo.csv");
        fs::write(&path, "uf,pop\nSC,1\n").unwrap();

        let cache = TableCache::new();
        let first = cache.get_or_read(&path).unwrap();
        let second = cache.get_or_read(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), CacheStats { entries: 1, hits: 1, misses: 1 });
    }

    #[test]
    fn test_changed_file_is_a_new_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saldo.csv");
        fs::write(&path, "uf,pop\nSC,1\n").unwrap();

        let cache = TableCache::new();
        cache.get_or_read(&path).unwrap();
        fs::write(&path, "uf,pop\nSC,1\nPR,2\n").unwrap();
        let reloaded = cache.get_or_read(&path).unwrap();

        assert_eq!(reloaded.row_count(), 2);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_load_error_is_not_cached() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vazio.csv");
        fs::write(&path, "").unwrap();

        let cache = TableCache::new();
        assert!(matches!(cache.get_or_read(&path), Err(ParseError::EmptyFile)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let cache = TableCache::new();
        let result = cache.get_or_read(&dir.path().join("nao_existe.csv"));
        assert!(matches!(result, Err(ParseError::Io(_))));
    }

    #[test]
    fn test_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saldo.csv");
        fs::write(&path, "uf\nSC\n").unwrap();

        let cache = TableCache::new();
        cache.get_or_read(&path).unwrap();
        assert_eq!(cache.entries().len(), 1);
        assert_eq!(cache.entries()[0].rows, 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats { entries: 0, hits: 0, misses: 0 });
    }
}
