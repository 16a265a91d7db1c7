//! Concurrent per-key entry storage with last-writer-wins admission and
//! TTL-on-read eviction.
//!
//! Values are treated as opaque byte strings; the store never interprets
//! their contents. A single `parking_lot::RwLock` guards the whole map —
//! mirroring the teacher's `LruCache`, which favors one map-wide lock over
//! per-key sharding at this scale — so the last-writer-wins timestamp
//! check and the write it gates happen in one atomic critical section.

use crate::clock::SharedClock;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Outcome of a `put` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// No resident entry existed, or the incoming write was at least as
    /// new as the resident one: the store now holds the new value.
    Stored,
    /// A newer resident entry exists; the write was rejected and the
    /// resident value is untouched.
    RejectedStale,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: Vec<u8>,
    /// 0 means no TTL. Tracked in milliseconds, not seconds, so a 1s TTL
    /// set partway through a wall-clock second still expires at the
    /// right sub-second boundary instead of rounding down to it.
    expiration_ms: i64,
    last_updated_ms: i64,
}

/// A value read back from the store, with the timestamp it was written at.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReadEntry {
    pub value: Vec<u8>,
    pub last_updated_ms: i64,
}

pub struct EntryStore {
    clock: SharedClock,
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl EntryStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store `value` under `key` if no resident entry exists, or if the
    /// incoming `last_updated_ms` is `>=` the resident entry's. Ties admit
    /// the new write, matching replica fan-out resending the same
    /// timestamp to multiple replicas.
    pub fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: i64,
        last_updated_ms: i64,
    ) -> PutOutcome {
        let expiration_ms = if ttl_seconds > 0 {
            self.clock.now_ms() + ttl_seconds * 1000
        } else {
            0
        };

        let mut entries = self.entries.write();
        if let Some(resident) = entries.get(key) {
            if last_updated_ms < resident.last_updated_ms {
                return PutOutcome::RejectedStale;
            }
        }

        entries.insert(
            key.to_string(),
            StoredEntry {
                value,
                expiration_ms,
                last_updated_ms,
            },
        );
        PutOutcome::Stored
    }

    /// Read the entry for `key`, lazily evicting it in the same critical
    /// section if its TTL has passed.
    pub fn get(&self, key: &str) -> Option<ReadEntry> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.write();

        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => entry.expiration_ms > 0 && now > entry.expiration_ms,
        };

        if expired {
            entries.remove(key);
            return None;
        }

        entries.get(key).map(|entry| ReadEntry {
            value: entry.value.clone(),
            last_updated_ms: entry.last_updated_ms,
        })
    }

    /// Unconditionally remove the entry for `key`, if any.
    pub fn delete(&self, key: &str) {
        self.entries.write().remove(key);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use std::sync::Arc;

    fn store_with_clock(start_ms: i64) -> (EntryStore, FixedClock) {
        let clock = FixedClock::new(start_ms);
        let store = EntryStore::new(Arc::new(clock.clone()));
        (store, clock)
    }

    #[test]
    fn put_on_empty_key_stores() {
        let (store, _clock) = store_with_clock(1_000);
        let outcome = store.put("a", b"1".to_vec(), 0, 100);
        assert_eq!(outcome, PutOutcome::Stored);
        let read = store.get("a").unwrap();
        assert_eq!(read.value, b"1");
        assert_eq!(read.last_updated_ms, 100);
    }

    #[test]
    fn stale_write_is_rejected_and_resident_value_kept() {
        let (store, _clock) = store_with_clock(1_000);
        assert_eq!(store.put("a", b"new".to_vec(), 0, 100), PutOutcome::Stored);
        assert_eq!(
            store.put("a", b"old".to_vec(), 0, 50),
            PutOutcome::RejectedStale
        );
        let read = store.get("a").unwrap();
        assert_eq!(read.value, b"new");
        assert_eq!(read.last_updated_ms, 100);
    }

    #[test]
    fn equal_timestamp_admits_the_new_write() {
        // P1/P6: replica fan-out resends the same last_updated_ms; a
        // retry must not be rejected, and the latest write at a given
        // timestamp wins.
        let (store, _clock) = store_with_clock(1_000);
        assert_eq!(store.put("a", b"first".to_vec(), 0, 100), PutOutcome::Stored);
        assert_eq!(
            store.put("a", b"second".to_vec(), 0, 100),
            PutOutcome::Stored
        );
        assert_eq!(store.get("a").unwrap().value, b"second");
    }

    #[test]
    fn delete_removes_unconditionally() {
        let (store, _clock) = store_with_clock(1_000);
        store.put("a", b"1".to_vec(), 0, 100);
        store.delete("a");
        assert!(store.get("a").is_none());
        // idempotent
        store.delete("a");
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn ttl_zero_means_no_expiry() {
        let (store, clock) = store_with_clock(0);
        store.put("a", b"1".to_vec(), 0, 100);
        clock.advance_ms(1_000_000_000);
        assert!(store.get("a").is_some());
    }

    #[test]
    fn ttl_expiry_removes_entry_on_read() {
        // P2: readable up to t0+T, absent and removed after.
        let (store, clock) = store_with_clock(0);
        store.put("a", b"v".to_vec(), 1, 100);

        clock.set_ms(500);
        assert!(store.get("a").is_some());

        clock.set_ms(1_500);
        assert!(store.get("a").is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn monotone_writes_converge_on_the_max_timestamp() {
        // P1: final last_updated_ms is the max of the supplied writes,
        // with the value that carried it.
        let (store, _clock) = store_with_clock(0);
        let writes = [(10, "a"), (50, "c"), (30, "b")];
        for (ts, v) in writes {
            store.put("k", v.as_bytes().to_vec(), 0, ts);
        }
        let read = store.get("k").unwrap();
        assert_eq!(read.last_updated_ms, 50);
        assert_eq!(read.value, b"c");
    }
}
