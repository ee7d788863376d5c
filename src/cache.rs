//! Content-addressed cache of tick-label recognition results.
//!
//! Entries are keyed by backend name plus an MD5 digest of the image buffer
//! the recognizer saw. The store is shared process-wide and
//! non-transactional: concurrent writers to one key overwrite each other, and
//! an unreadable entry is simply a miss. Write failures are logged and
//! otherwise ignored.

use crate::error::{Error, Result};
use crate::ocr::TickSet;
use image::GrayImage;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// One cached recognition result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Recognized ticks
    pub result: TickSet,
    /// Recognition confidence
    pub confidence: f64,
    /// Backend that produced the result
    pub backend: String,
}

/// Hex MD5 digest of an image's dimensions and raw pixel buffer.
///
/// # Examples
///
/// ```
/// use chart_oxide::cache::content_hash;
/// use image::{GrayImage, Luma};
///
/// let a = GrayImage::from_pixel(4, 4, Luma([7]));
/// let b = GrayImage::from_pixel(4, 4, Luma([8]));
/// assert_eq!(content_hash(&a), content_hash(&a.clone()));
/// assert_ne!(content_hash(&a), content_hash(&b));
/// assert_eq!(content_hash(&a).len(), 32);
/// ```
pub fn content_hash(image: &GrayImage) -> String {
    let mut hasher = Md5::new();
    hasher.update(image.width().to_le_bytes());
    hasher.update(image.height().to_le_bytes());
    hasher.update(image.as_raw());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Key-value store for recognition results.
pub trait CacheStore: Send + Sync {
    /// Look up an entry; any read or decode problem is a miss.
    fn get(&self, backend: &str, key: &str) -> Option<CacheEntry>;

    /// Store an entry under its backend and `key`; failures are swallowed.
    fn put(&self, key: &str, entry: &CacheEntry);

    /// Remove every entry, returning how many were removed.
    fn clear(&self) -> usize;
}

/// JSON files `{backend}_{key}.json` in one directory.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Open (creating if needed) a cache directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open the per-user default directory.
    ///
    /// # Errors
    ///
    /// [`Error::BackendUnavailable`] when no home or cache directory is known.
    pub fn open_default() -> Result<Self> {
        let dir = Self::default_dir().ok_or_else(|| {
            Error::BackendUnavailable("neither XDG_CACHE_HOME nor HOME is set".to_string())
        })?;
        Self::new(dir)
    }

    /// `$XDG_CACHE_HOME/chart2csv/ocr`, else `$HOME/.cache/chart2csv/ocr`.
    pub fn default_dir() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CACHE_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| Path::new(&home).join(".cache")))?;
        Some(base.join("chart2csv").join("ocr"))
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, backend: &str, key: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.json", backend, key))
    }
}

impl CacheStore for DiskCache {
    fn get(&self, backend: &str, key: &str) -> Option<CacheEntry> {
        let path = self.entry_path(backend, key);
        let text = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::debug!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                None
            },
        }
    }

    fn put(&self, key: &str, entry: &CacheEntry) {
        let path = self.entry_path(&entry.backend, key);
        let written = serde_json::to_string(entry)
            .map_err(Error::from)
            .and_then(|json| fs::write(&path, json).map_err(Error::from));
        if let Err(e) = written {
            log::warn!("Cache write to {} failed: {}", path.display(), e);
        }
    }

    fn clear(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter(|path| fs::remove_file(path).is_ok())
            .count()
    }
}

/// In-process cache, for tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, backend: &str, key: &str) -> Option<CacheEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&format!("{}_{}", backend, key))
            .cloned()
    }

    fn put(&self, key: &str, entry: &CacheEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(format!("{}_{}", entry.backend, key), entry.clone());
    }

    fn clear(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let count = entries.len();
        entries.clear();
        count
    }
}
