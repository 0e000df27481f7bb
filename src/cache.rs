//! # TTL Cache
//!
//! Small thread-safe cache with per-entry expiry, owned by a single service
//! instance rather than living as module-level global state. Entries are
//! populated on first read and dropped on TTL expiry or explicit
//! invalidation.

use log::debug;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Thread-safe cache mapping keys to `(value, inserted_at)` pairs
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, (V, Instant)>>,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a value if present and not expired; expired entries are removed
    /// on access
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, inserted)) if inserted.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key, (value, Instant::now()));
    }

    /// Drop a single entry (force-refresh)
    pub fn invalidate(&self, key: &K) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
    }

    /// Drop everything
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        let count = entries.len();
        entries.clear();
        if count > 0 {
            debug!("Cleared {} cached entries", count);
        }
    }

    /// Remove all expired entries
    pub fn sweep(&self) {
        let mut entries = self.entries.lock().unwrap();
        let ttl = self.ttl;
        entries.retain(|_, (_, inserted)| inserted.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
