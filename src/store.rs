//! Idle-expiring key/value store
//!
//! This module implements the map backing the session store: each entry
//! carries a deadline that is pushed forward on every read or write, and
//! entries past their deadline are dropped lazily on access. No timer
//! thread is involved.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A key/value map whose entries expire after a fixed idle duration
///
/// Every successful `get` or `set` refreshes the entry's deadline to
/// now + TTL. Expired entries are swept lazily: an access checks the
/// deadline of the entry it touches, and bulk accessors skip entries that
/// are past due. With a TTL of zero or less the store behaves as a plain
/// unbounded map.
///
/// The store itself is not synchronized; callers wrap it in a lock
/// (see [`crate::session::SessionManager`]).
///
/// # Examples
///
/// ```
/// use chatgate::store::ExpiringStore;
///
/// let mut store: ExpiringStore<String> = ExpiringStore::new(0);
/// store.set("a".to_string(), "hello".to_string());
/// assert_eq!(store.get("a"), Some("hello".to_string()));
/// assert_eq!(store.get("b"), None);
/// ```
#[derive(Debug)]
pub struct ExpiringStore<V> {
    entries: HashMap<String, Entry<V>>,
    ttl: Option<Duration>,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    deadline: Option<Instant>,
}

impl<V: Clone> ExpiringStore<V> {
    /// Create a store with the given idle TTL in seconds
    ///
    /// A TTL of zero or less disables expiry entirely.
    pub fn new(ttl_seconds: i64) -> Self {
        let ttl = if ttl_seconds > 0 {
            Some(Duration::from_secs(ttl_seconds as u64))
        } else {
            None
        };
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Look up a key, refreshing its deadline on a hit
    ///
    /// Returns `None` for absent keys and for entries whose deadline has
    /// passed; an expired entry is removed on the spot.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Insert or replace a value, setting its deadline to now + TTL
    pub fn set(&mut self, key: String, value: V) {
        self.set_at(key, value, Instant::now());
    }

    /// Remove a single entry, returning its value if it was present and live
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.entries
            .remove(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value)
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.values().filter(|e| e.is_live(now)).count()
    }

    /// True if the store holds no live entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        let live = self.entries.get(key)?.is_live(now);
        if !live {
            tracing::debug!("Expiring idle entry: {}", key);
            self.entries.remove(key);
            return None;
        }

        let ttl = self.ttl;
        let entry = self.entries.get_mut(key)?;
        entry.deadline = ttl.map(|ttl| now + ttl);
        Some(entry.value.clone())
    }

    fn set_at(&mut self, key: String, value: V, now: Instant) {
        let deadline = self.ttl.map(|ttl| now + ttl);
        self.entries.insert(key, Entry { value, deadline });
    }
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) => now < deadline,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut store: ExpiringStore<u32> = ExpiringStore::new(60);
        store.set("k".to_string(), 7);
        assert_eq!(store.get("k"), Some(7));
    }

    #[test]
    fn test_get_absent_key() {
        let mut store: ExpiringStore<u32> = ExpiringStore::new(60);
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_entry_expires_after_idle_ttl() {
        let mut store: ExpiringStore<u32> = ExpiringStore::new(10);
        let start = Instant::now();
        store.set_at("k".to_string(), 7, start);

        // Just inside the deadline
        assert_eq!(store.get_at("k", start + Duration::from_secs(9)), Some(7));
        // The hit above refreshed the deadline, so 9 more seconds is fine
        assert_eq!(store.get_at("k", start + Duration::from_secs(18)), Some(7));
        // Past the refreshed deadline
        assert_eq!(store.get_at("k", start + Duration::from_secs(40)), None);
    }

    #[test]
    fn test_set_refreshes_deadline() {
        let mut store: ExpiringStore<u32> = ExpiringStore::new(10);
        let start = Instant::now();
        store.set_at("k".to_string(), 1, start);
        store.set_at("k".to_string(), 2, start + Duration::from_secs(9));

        assert_eq!(store.get_at("k", start + Duration::from_secs(15)), Some(2));
    }

    #[test]
    fn test_expired_entry_removed_on_access() {
        let mut store: ExpiringStore<u32> = ExpiringStore::new(1);
        let start = Instant::now();
        store.set_at("k".to_string(), 7, start);

        assert_eq!(store.get_at("k", start + Duration::from_secs(5)), None);
        assert!(!store.entries.contains_key("k"));
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let mut store: ExpiringStore<u32> = ExpiringStore::new(0);
        let start = Instant::now();
        store.set_at("k".to_string(), 7, start);

        assert_eq!(
            store.get_at("k", start + Duration::from_secs(1_000_000)),
            Some(7)
        );
    }

    #[test]
    fn test_negative_ttl_never_expires() {
        let mut store: ExpiringStore<u32> = ExpiringStore::new(-5);
        let start = Instant::now();
        store.set_at("k".to_string(), 7, start);

        assert_eq!(
            store.get_at("k", start + Duration::from_secs(1_000_000)),
            Some(7)
        );
    }

    #[test]
    fn test_remove() {
        let mut store: ExpiringStore<u32> = ExpiringStore::new(60);
        store.set("k".to_string(), 7);
        assert_eq!(store.remove("k"), Some(7));
        assert_eq!(store.get("k"), None);
        assert_eq!(store.remove("k"), None);
    }

    #[test]
    fn test_clear() {
        let mut store: ExpiringStore<u32> = ExpiringStore::new(60);
        store.set("a".to_string(), 1);
        store.set("b".to_string(), 2);
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_len_skips_expired_entries() {
        let mut store: ExpiringStore<u32> = ExpiringStore::new(1);
        let past = Instant::now() - Duration::from_secs(10);
        store.set_at("old".to_string(), 1, past);
        store.set("fresh".to_string(), 2);

        assert_eq!(store.len(), 1);
    }
}
