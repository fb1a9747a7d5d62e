//! The session-wide shove-to-handle cache.
//!
//! A fixed open-addressed array mapping tree shoves to open engine
//! handles. Probing is linear from `shove mod size`; empty slots carry a
//! zero handle. There are no tombstones: removal clears the slot, and the
//! probe sequences of insert and miss stop at the first empty slot.
//!
//! `peek` runs without any lock. Writers publish the handle before the
//! shove (release), readers load the shove first (acquire), so a hinted
//! reader that observes a matching shove always observes the handle that
//! was published with it. `lookup`, `insert`, and `remove` must run under
//! the session's DBI mutex.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering as AtomicOrdering};

use tessera_common::constants::DBI_CACHE_SIZE;
use tessera_engine::Dbi;

use crate::shove::Shove;

struct Slot {
    shove: AtomicU64,
    handle: AtomicU32,
}

/// Open-addressed cache of `(shove, handle)` pairs.
pub struct DbiCache {
    slots: Box<[Slot]>,
}

impl Default for DbiCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DbiCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbiCache")
            .field("size", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl DbiCache {
    /// Creates an empty cache with every slot zeroed.
    #[must_use]
    pub fn new() -> Self {
        let slots = (0..DBI_CACHE_SIZE)
            .map(|_| Slot {
                shove: AtomicU64::new(0),
                handle: AtomicU32::new(0),
            })
            .collect();
        Self { slots }
    }

    fn home(&self, shove: Shove) -> usize {
        (shove.as_raw() % self.slots.len() as u64) as usize
    }

    /// Lock-free hinted probe: returns the cached handle when the hinted
    /// slot still holds this shove, otherwise an invalid handle.
    #[must_use]
    pub fn peek(&self, shove: Shove, hint: Option<usize>) -> Dbi {
        let Some(at) = hint else {
            return Dbi::INVALID;
        };
        let Some(slot) = self.slots.get(at) else {
            return Dbi::INVALID;
        };
        if slot.shove.load(AtomicOrdering::Acquire) == shove.as_raw() {
            return Dbi::from_raw(slot.handle.load(AtomicOrdering::Acquire));
        }
        Dbi::INVALID
    }

    /// Full lookup: hinted fast path, then a linear probe from the home
    /// slot. On a hit the hint is updated; on a miss it is cleared.
    ///
    /// Caller must hold the session's DBI mutex.
    #[must_use]
    pub fn lookup(&self, shove: Shove, hint: &mut Option<usize>) -> Dbi {
        if let Some(at) = *hint {
            if let Some(slot) = self.slots.get(at) {
                if slot.shove.load(AtomicOrdering::Acquire) == shove.as_raw() {
                    return Dbi::from_raw(slot.handle.load(AtomicOrdering::Acquire));
                }
            }
            *hint = None;
        }

        let home = self.home(shove);
        let mut at = home;
        loop {
            if self.slots[at].shove.load(AtomicOrdering::Acquire) == shove.as_raw() {
                *hint = Some(at);
                return Dbi::from_raw(self.slots[at].handle.load(AtomicOrdering::Acquire));
            }
            at = (at + 1) % self.slots.len();
            if at == home || self.slots[at].shove.load(AtomicOrdering::Acquire) == 0 {
                return Dbi::INVALID;
            }
        }
    }

    /// Installs a pair at the first empty slot reachable from its home
    /// and returns the slot index, or `None` if the cache is full (the
    /// handle then simply stays uncached).
    ///
    /// Caller must hold the session's DBI mutex, and the shove must not
    /// already be present.
    pub fn insert(&self, shove: Shove, handle: Dbi) -> Option<usize> {
        debug_assert!(shove.as_raw() != 0);
        debug_assert!(handle.is_valid());

        let home = self.home(shove);
        let mut at = home;
        loop {
            let slot = &self.slots[at];
            debug_assert!(slot.shove.load(AtomicOrdering::Acquire) != shove.as_raw());
            if slot.shove.load(AtomicOrdering::Acquire) == 0 {
                // Handle first, then the shove with release ordering, so a
                // concurrent hinted peek never sees the pair half-written.
                slot.handle.store(handle.as_raw(), AtomicOrdering::Relaxed);
                slot.shove.store(shove.as_raw(), AtomicOrdering::Release);
                return Some(at);
            }
            at = (at + 1) % self.slots.len();
            if at == home {
                return None;
            }
        }
    }

    /// Clears the pair for this shove, if present.
    ///
    /// Caller must hold the session's DBI mutex.
    pub fn remove(&self, shove: Shove) {
        debug_assert!(shove.as_raw() != 0);

        let home = self.home(shove);
        let mut at = home;
        loop {
            let slot = &self.slots[at];
            if slot.shove.load(AtomicOrdering::Acquire) == shove.as_raw() {
                // Shove first so concurrent peeks miss instead of pairing
                // the old shove with a cleared handle.
                slot.shove.store(0, AtomicOrdering::Release);
                slot.handle.store(0, AtomicOrdering::Relaxed);
                return;
            }
            at = (at + 1) % self.slots.len();
            if at == home || self.slots[at].shove.load(AtomicOrdering::Acquire) == 0 {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shove(raw: u64) -> Shove {
        Shove::from_raw(raw)
    }

    #[test]
    fn test_insert_lookup_remove() {
        let cache = DbiCache::new();
        let mut hint = None;

        assert!(!cache.lookup(shove(17), &mut hint).is_valid());

        let at = cache.insert(shove(17), Dbi::from_raw(3)).unwrap();
        let found = cache.lookup(shove(17), &mut hint);
        assert_eq!(found.as_raw(), 3);
        assert_eq!(hint, Some(at));

        cache.remove(shove(17));
        let mut fresh = None;
        assert!(!cache.lookup(shove(17), &mut fresh).is_valid());
    }

    #[test]
    fn test_peek_needs_matching_hint() {
        let cache = DbiCache::new();
        let at = cache.insert(shove(17), Dbi::from_raw(3)).unwrap();

        assert_eq!(cache.peek(shove(17), Some(at)).as_raw(), 3);
        assert!(!cache.peek(shove(17), None).is_valid());
        assert!(!cache.peek(shove(18), Some(at)).is_valid());
        assert!(!cache.peek(shove(17), Some(usize::MAX)).is_valid());
    }

    #[test]
    fn test_collision_chain() {
        let cache = DbiCache::new();
        let size = DBI_CACHE_SIZE as u64;

        // Three shoves with the same home slot probe into consecutive
        // slots.
        let a = shove(5);
        let b = shove(5 + size);
        let c = shove(5 + 2 * size);
        let at_a = cache.insert(a, Dbi::from_raw(1)).unwrap();
        let at_b = cache.insert(b, Dbi::from_raw(2)).unwrap();
        let at_c = cache.insert(c, Dbi::from_raw(3)).unwrap();
        assert_eq!(at_b, (at_a + 1) % DBI_CACHE_SIZE);
        assert_eq!(at_c, (at_a + 2) % DBI_CACHE_SIZE);

        let mut hint = None;
        assert_eq!(cache.lookup(c, &mut hint).as_raw(), 3);
        assert_eq!(hint, Some(at_c));

        // Removing the middle entry leaves the chain walkable up to the
        // hole: the tail entry is reachable only through its hint now,
        // which is exactly the no-tombstone contract.
        cache.remove(b);
        let mut fresh = None;
        assert_eq!(cache.lookup(a, &mut fresh).as_raw(), 1);
        assert_eq!(cache.peek(c, hint).as_raw(), 3);
    }

    #[test]
    fn test_stale_hint_recovers() {
        let cache = DbiCache::new();
        let at = cache.insert(shove(99), Dbi::from_raw(7)).unwrap();

        let mut hint = Some(at + 1);
        assert_eq!(cache.lookup(shove(99), &mut hint).as_raw(), 7);
        assert_eq!(hint, Some(at));
    }

    #[test]
    fn test_full_cache_insert_declines() {
        let cache = DbiCache::new();
        for raw in 0..DBI_CACHE_SIZE as u64 {
            assert!(cache.insert(shove(raw + 1), Dbi::from_raw(1)).is_some());
        }
        assert!(cache
            .insert(shove(DBI_CACHE_SIZE as u64 + 1), Dbi::from_raw(1))
            .is_none());
    }
}
