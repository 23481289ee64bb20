//! A generic capacity-bounded key→value cache with pluggable paging
//! behavior.
//!
//! Capacity is expressed as a memory budget in MB divided by a fixed
//! per-line size, so the number of resident lines stays small even though
//! the key space is enormous. Eviction picks the single oldest line by a
//! linear scan; with tens-of-MB lines and a few-GB budget the scan never
//! sees more than a handful of entries.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

/// Paging strategy backing a [`BoundedCache`]: how big a line is, which of
/// two lines is older, how to produce a missing value and what to do with
/// an evicted one.
pub trait CacheStore<K, V> {
    type Error;

    /// Fixed approximate memory footprint of one resident value, in MB.
    fn line_size_mb(&self) -> usize;

    /// Whether `a` was used less recently than `b`.
    fn is_older_than(&self, a: &V, b: &V) -> bool;

    /// Produces the value for a missing key (e.g. reads it from disk or
    /// creates it empty).
    fn load(&mut self, key: &K) -> Result<V, Self::Error>;

    /// Receives a value that is being dropped from the cache (e.g. to
    /// persist it if it holds unsaved changes).
    fn on_evict(&mut self, key: &K, value: V) -> Result<(), Self::Error>;
}

/// Key→value cache bounded by a mutable memory budget.
pub struct BoundedCache<K, V, S> {
    store: S,
    lines: FxHashMap<K, V>,
    max_size_mb: usize,
}

impl<K, V, S> BoundedCache<K, V, S>
where
    K: Copy + Eq + Hash + Debug,
    S: CacheStore<K, V>,
{
    pub fn new(store: S, max_size_mb: usize) -> Self {
        Self {
            store,
            lines: FxHashMap::default(),
            max_size_mb,
        }
    }

    /// The current memory budget in MB.
    pub fn max_size_mb(&self) -> usize {
        self.max_size_mb
    }

    /// Changes the memory budget and immediately evicts down to fit.
    ///
    /// No room is reserved for a future insert here; that happens on the
    /// next miss.
    pub fn set_max_size_mb(&mut self, max_size_mb: usize) -> Result<(), S::Error> {
        self.max_size_mb = max_size_mb;
        self.reduce(false)
    }

    /// Returns the resident value for `key`, loading it through the store
    /// on a miss. Before inserting a freshly loaded value, old lines are
    /// evicted until there is room for one more.
    pub fn get(&mut self, key: K) -> Result<&mut V, S::Error> {
        if !self.lines.contains_key(&key) {
            self.reduce(true)?;
            let value = self.store.load(&key)?;
            self.lines.insert(key, value);
            debug!(?key, resident = self.lines.len(), "loaded cache line");
        }
        Ok(self.lines.get_mut(&key).expect("line is resident after load"))
    }

    /// Number of resident lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Keys of all resident lines, in no particular order.
    pub fn resident_keys(&self) -> impl Iterator<Item = &K> {
        self.lines.keys()
    }

    /// Shared access to the paging strategy.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Visits every resident line without evicting anything, handing the
    /// closure the paging strategy as well (a flush persists through it).
    pub fn for_each_resident_mut<F>(&mut self, mut action: F) -> Result<(), S::Error>
    where
        F: FnMut(&mut S, &K, &mut V) -> Result<(), S::Error>,
    {
        for (key, value) in self.lines.iter_mut() {
            action(&mut self.store, key, value)?;
        }
        Ok(())
    }

    /// Evicts until at most `max_lines` lines are resident, where
    /// `max_lines` is the budget divided by the line size (clamped to one:
    /// the cache cannot be disabled down to zero).
    fn reduce(&mut self, room_for_new_line: bool) -> Result<(), S::Error> {
        let mut max_lines = self.max_size_mb / self.store.line_size_mb();
        if max_lines == 0 {
            warn!(
                max_size_mb = self.max_size_mb,
                line_size_mb = self.store.line_size_mb(),
                "cache budget below one line; keeping one line resident anyway"
            );
            max_lines = 1;
        }
        if room_for_new_line {
            max_lines -= 1;
        }
        while self.lines.len() > max_lines {
            self.evict_oldest()?;
        }
        Ok(())
    }

    fn evict_oldest(&mut self) -> Result<(), S::Error> {
        let mut oldest: Option<(&K, &V)> = None;
        for entry in self.lines.iter() {
            oldest = match oldest {
                Some(best) if !self.store.is_older_than(entry.1, best.1) => Some(best),
                _ => Some(entry),
            };
        }
        let Some((&key, _)) = oldest else {
            return Ok(());
        };
        let value = self
            .lines
            .remove(&key)
            .expect("oldest key is resident");
        debug!(?key, resident = self.lines.len(), "evicting cache line");
        self.store.on_evict(&key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::convert::Infallible;

    /// One resident test line: a payload plus an age stamp the fake store
    /// orders evictions by.
    struct Line {
        payload: u32,
        stamp: u64,
    }

    /// Fake backing store: a HashMap stands in for the disk, a counter
    /// stands in for the clock, and every load/evict is recorded.
    struct TestStore {
        line_size_mb: usize,
        disk: HashMap<u32, u32>,
        clock: u64,
        loads: Vec<u32>,
        evicts: Vec<u32>,
    }

    impl TestStore {
        fn new(line_size_mb: usize) -> Self {
            Self {
                line_size_mb,
                disk: HashMap::new(),
                clock: 0,
                loads: Vec::new(),
                evicts: Vec::new(),
            }
        }
    }

    impl CacheStore<u32, Line> for TestStore {
        type Error = Infallible;

        fn line_size_mb(&self) -> usize {
            self.line_size_mb
        }

        fn is_older_than(&self, a: &Line, b: &Line) -> bool {
            a.stamp < b.stamp
        }

        fn load(&mut self, key: &u32) -> Result<Line, Infallible> {
            self.clock += 1;
            self.loads.push(*key);
            Ok(Line {
                payload: self.disk.get(key).copied().unwrap_or(0),
                stamp: self.clock,
            })
        }

        fn on_evict(&mut self, key: &u32, value: Line) -> Result<(), Infallible> {
            self.evicts.push(*key);
            self.disk.insert(*key, value.payload);
            Ok(())
        }
    }

    #[test]
    fn test_budget_bounds_resident_lines() {
        // 256 MB budget over 64 MB lines: at most 4 resident.
        let mut cache = BoundedCache::new(TestStore::new(64), 256);
        for key in 0..20 {
            cache.get(key).unwrap();
            assert!(cache.len() <= 4);
        }
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_hit_does_not_reload() {
        let mut cache = BoundedCache::new(TestStore::new(64), 256);
        cache.get(7).unwrap();
        cache.get(7).unwrap();
        assert_eq!(cache.store().loads, vec![7]);
    }

    #[test]
    fn test_evicts_least_recently_stamped_first() {
        let mut cache = BoundedCache::new(TestStore::new(64), 128);
        cache.get(1).unwrap();
        cache.get(2).unwrap();
        // Capacity 2: loading a third line pushes out the oldest.
        cache.get(3).unwrap();
        assert_eq!(cache.store().evicts, vec![1]);

        // Refresh line 2 so line 3 becomes the oldest.
        cache.get(2).unwrap().stamp = 100;
        cache.get(4).unwrap();
        assert_eq!(cache.store().evicts, vec![1, 3]);
    }

    #[test]
    fn test_budget_below_one_line_clamps_to_one() {
        let mut cache = BoundedCache::new(TestStore::new(64), 10);
        cache.get(1).unwrap();
        assert_eq!(cache.len(), 1);
        // Still functional, just thrashing between keys.
        cache.get(2).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.store().evicts, vec![1]);
    }

    #[test]
    fn test_shrinking_budget_evicts_immediately() {
        let mut cache = BoundedCache::new(TestStore::new(64), 256);
        for key in 0..4 {
            cache.get(key).unwrap();
        }
        assert_eq!(cache.len(), 4);

        cache.set_max_size_mb(128).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.store().evicts, vec![0, 1]);

        // Re-applying the same budget reserves no extra room.
        cache.set_max_size_mb(128).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_eviction_round_trips_through_store() {
        let mut cache = BoundedCache::new(TestStore::new(64), 64);
        cache.get(1).unwrap().payload = 42;
        cache.get(2).unwrap(); // evicts 1, persisting its payload
        assert_eq!(cache.store().disk.get(&1), Some(&42));
        // Reloading brings the persisted payload back.
        assert_eq!(cache.get(1).unwrap().payload, 42);
    }

    #[test]
    fn test_for_each_resident_visits_all_without_evicting() {
        let mut cache = BoundedCache::new(TestStore::new(64), 256);
        for key in 0..3 {
            cache.get(key).unwrap();
        }
        let mut seen = Vec::new();
        cache
            .for_each_resident_mut(|_, key, _| {
                seen.push(*key);
                Ok(())
            })
            .unwrap();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(cache.len(), 3);

        let mut keys: Vec<u32> = cache.resident_keys().copied().collect();
        keys.sort();
        assert_eq!(keys, vec![0, 1, 2]);
    }
}
