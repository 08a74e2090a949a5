//! Read-through TTL cache shared across requests.
//!
//! Lookups against the store and the normalizer repeat heavily between
//! requests (category expansions especially), so the expensive repository
//! methods read through named caches held on the application context.
//! Writes are last-writer-wins; two requests populating the same key with
//! equivalent values is fine.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// A concurrent key/value cache where entries expire after a fixed TTL.
///
/// Cheap to clone - clones share the same underlying map.
pub struct TtlCache<K, V> {
    entries: Arc<RwLock<HashMap<K, (V, Instant)>>>,
    ttl: Duration,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Returns the cached value if present and not expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some((value, inserted)) if inserted.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    /// Inserts a value, overwriting any existing entry.
    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;
        entries.insert(key, (value, Instant::now()));
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries
            .values()
            .filter(|(_, inserted)| inserted.elapsed() < self.ttl)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }
}
