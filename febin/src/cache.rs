//! This module implements an opt-in parse cache. Entries are keyed by the
//! canonical path and modification time of the file they came from, so an
//! edited file is parsed again. Nothing is cached unless a caller owns a
//! cache and goes through it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use log::{debug, trace};

use crate::error::{FebinError, Result};

/// Cache key: canonical path and modification time.
type CacheKey = (PathBuf, SystemTime);

/// A shareable cache of parse outputs. Clones share the same entries.
pub struct ParseCache<T> {
  /// The entries.
  entries: Arc<Mutex<HashMap<CacheKey, Arc<T>>>>
}

impl<T> Default for ParseCache<T> {
  fn default() -> Self {
    return Self { entries: Arc::new(Mutex::new(HashMap::new())) };
  }
}

impl<T> Clone for ParseCache<T> {
  fn clone(&self) -> Self {
    return Self { entries: Arc::clone(&self.entries) };
  }
}

impl<T> ParseCache<T> {
  /// Creates an empty cache.
  pub fn new() -> Self {
    return Self::default();
  }

  /// Returns the cached output for a file, parsing it first if the file is
  /// new or changed since it was cached. Failed parses aren't cached.
  pub fn get_or_parse<P, F>(&self, path: P, parse: F) -> Result<Arc<T>>
    where P: AsRef<Path>, F: FnOnce(&Path) -> Result<T> {
    let canonical = fs::canonicalize(path.as_ref())?;
    let modified = fs::metadata(&canonical)?.modified()?;
    let key = (canonical, modified);
    {
      let entries = self.entries.lock().map_err(|_| FebinError::LockPoisoned)?;
      if let Some(hit) = entries.get(&key) {
        trace!("Cache hit for {}.", key.0.display());
        return Ok(Arc::clone(hit));
      }
    }
    // parse without holding the lock; a racing parse of the same file just
    // gets overwritten by an equal value
    debug!("Cache miss for {}, parsing.", key.0.display());
    let parsed = Arc::new(parse(&key.0)?);
    let mut entries = self.entries.lock()
      .map_err(|_| FebinError::LockPoisoned)?;
    entries.retain(|(p, _), _| *p != key.0);
    entries.insert(key, Arc::clone(&parsed));
    return Ok(parsed);
  }

  /// Returns the number of cached entries.
  pub fn len(&self) -> Result<usize> {
    let entries = self.entries.lock().map_err(|_| FebinError::LockPoisoned)?;
    return Ok(entries.len());
  }

  /// Checks whether the cache is empty.
  pub fn is_empty(&self) -> Result<bool> {
    return self.len().map(|n| n == 0);
  }

  /// Drops every entry.
  pub fn clear(&self) -> Result<()> {
    self.entries.lock().map_err(|_| FebinError::LockPoisoned)?.clear();
    return Ok(());
  }
}
