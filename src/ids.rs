//! # Per-key monotonic identifiers.
//!
//! [`IdRegistry`] hands out `0, 1, 2, ...` independently for every key. Tasks
//! use their name as the key, so two tasks named `"fetch"` become `fetch#0`
//! and `fetch#1`.
//!
//! The registry is an ordinary value: pass the same `Arc<IdRegistry>` to
//! every builder that should share a numbering, or a fresh one to isolate a
//! test. Builders that are not given a registry draw from
//! [`IdRegistry::shared`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

/// Identifier of a task: its key and the sequence number drawn for that key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    key: Arc<str>,
    seq: u64,
}

impl TaskId {
    /// Key the id was drawn for.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Sequence number within the key.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.key, self.seq)
    }
}

/// Registry of per-key counters.
#[derive(Debug, Default)]
pub struct IdRegistry {
    counters: Mutex<HashMap<Arc<str>, Arc<AtomicU64>>>,
}

impl IdRegistry {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Process-wide registry used when a builder is not given one.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<IdRegistry>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(IdRegistry::new))
    }

    /// Draws the next id for `key`.
    pub fn next(&self, key: &str) -> TaskId {
        let (key, counter) = {
            let mut counters = self.counters.lock();
            match counters.get_key_value(key) {
                Some((k, c)) => (Arc::clone(k), Arc::clone(c)),
                None => {
                    let k: Arc<str> = Arc::from(key);
                    let c = Arc::new(AtomicU64::new(0));
                    counters.insert(Arc::clone(&k), Arc::clone(&c));
                    (k, c)
                }
            }
        };
        let seq = counter.fetch_add(1, Ordering::Relaxed);
        TaskId { key, seq }
    }

    /// Number of ids drawn so far for `key`.
    pub fn count(&self, key: &str) -> u64 {
        self.counters
            .lock()
            .get(key)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_key() {
        let ids = IdRegistry::new();
        assert_eq!(ids.next("fetch").to_string(), "fetch#0");
        assert_eq!(ids.next("fetch").to_string(), "fetch#1");
        assert_eq!(ids.next("parse").to_string(), "parse#0");
        assert_eq!(ids.count("fetch"), 2);
        assert_eq!(ids.count("missing"), 0);
    }

    #[test]
    fn registries_are_isolated() {
        let a = IdRegistry::new();
        let b = IdRegistry::new();
        a.next("k");
        assert_eq!(b.next("k").seq(), 0);
    }

    #[test]
    fn concurrent_draws_are_unique() {
        let ids = IdRegistry::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..100).map(|_| ids.next("k").seq()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 800);
    }
}
