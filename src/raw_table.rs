//! RawTable: the open-addressing core shared by every set and table.
//!
//! Layout
//! - One contiguous `Vec` of slots, each `Empty`, `Tombstone` or `Filled`.
//!   Filled slots cache their key's 32-bit hash so growth and set algebra
//!   never call back into the adapter to re-hash.
//! - Linear probing from `hash % capacity`, stepping by one and wrapping.
//!
//! Invariants
//! - `size + tombstones <= capacity` and `capacity >= MIN_CAPACITY`.
//! - Before any insertion probes, `size / capacity < MAX_LOAD_FACTOR` is
//!   restored by growing by `MAX_LOAD_FACTOR / MIN_LOAD_FACTOR`.
//! - Keys are unique: insertion is add-if-absent. `upsert` is the only
//!   operation that replaces an existing value.
//! - Removal leaves a tombstone; capacity never shrinks. Growth drops all
//!   tombstones.

use crate::adapter::KeyAdapter;
use crate::error::{AllocError, InsertError};
use crate::reentrancy::DebugReentrancy;
use core::fmt;
use core::mem;
use log::{debug, warn};

/// Smallest slot count a container is ever created with.
pub const MIN_CAPACITY: usize = 8;

/// Target density right after a grow.
pub const MIN_LOAD_FACTOR: f64 = 0.5;

/// Density at which the next insertion grows the table first.
pub const MAX_LOAD_FACTOR: f64 = 0.75;

enum Slot<K, V> {
    Empty,
    Tombstone,
    Filled(Filled<K, V>),
}

struct Filled<K, V> {
    hash: u32,
    key: K,
    value: V,
}

/// A view of one filled slot.
#[derive(Debug)]
pub struct Entry<'a, K, V> {
    /// Hash cached at insertion time.
    pub hash: u32,
    pub key: &'a K,
    pub value: &'a V,
}

impl<K, V> Clone for Entry<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Entry<'_, K, V> {}

/// Slot storage and counters. Kept apart from the adapter so the table can
/// hold its reentrancy guard while mutating this.
struct Slots<K, V> {
    slots: Vec<Slot<K, V>>,
    size: usize,
    tombstones: usize,
}

impl<K, V> Slots<K, V> {
    fn allocate(capacity: usize) -> Result<Vec<Slot<K, V>>, AllocError> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| AllocError { capacity })?;
        slots.resize_with(capacity, || Slot::Empty);
        Ok(slots)
    }

    fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Ok(Self {
            slots: Self::allocate(capacity.max(MIN_CAPACITY))?,
            size: 0,
            tombstones: 0,
        })
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn probe(&self, hash: u32) -> impl Iterator<Item = usize> {
        let cap = self.capacity();
        let start = hash as usize % cap;
        (start..cap).chain(0..start)
    }

    fn at_max_load(&self) -> bool {
        self.size as f64 / self.capacity() as f64 >= MAX_LOAD_FACTOR
    }

    fn grow(&mut self) -> Result<(), AllocError> {
        let old_capacity = self.capacity();
        let new_capacity =
            ((old_capacity as f64 * MAX_LOAD_FACTOR / MIN_LOAD_FACTOR) as usize).max(old_capacity);
        self.grow_to(new_capacity)
    }

    fn grow_to(&mut self, new_capacity: usize) -> Result<(), AllocError> {
        let old_capacity = self.capacity();

        // Allocation is the only failure point; nothing is touched before it.
        let fresh = Self::allocate(new_capacity)?;
        let old = mem::replace(&mut self.slots, fresh);
        let dropped = mem::take(&mut self.tombstones);

        for slot in old {
            if let Slot::Filled(entry) = slot {
                self.place(entry);
            }
        }

        debug!(
            "grew table from {} to {} slots ({} entries, {} tombstones dropped)",
            old_capacity, new_capacity, self.size, dropped
        );
        Ok(())
    }

    /// Reinsert an entry known to be absent. The caller guarantees fewer
    /// filled slots than capacity, so a vacant slot exists.
    fn place(&mut self, entry: Filled<K, V>) {
        let cap = self.capacity();
        let mut i = entry.hash as usize % cap;
        while matches!(self.slots[i], Slot::Filled(_)) {
            i = (i + 1) % cap;
        }
        self.slots[i] = Slot::Filled(entry);
    }

    fn quick_add<A>(&mut self, adapter: &A, hash: u32, key: K, value: V) -> Result<usize, InsertError>
    where
        A: KeyAdapter<Key = K>,
    {
        if self.at_max_load() {
            self.grow()?;
        }

        // Land on the first free slot, but keep probing to the end of the
        // chain so a live duplicate past a tombstone is still rejected.
        let mut landing = None;
        for i in self.probe(hash) {
            match &self.slots[i] {
                Slot::Empty => {
                    landing.get_or_insert(i);
                    break;
                }
                Slot::Tombstone => {
                    landing.get_or_insert(i);
                }
                Slot::Filled(e) => {
                    if e.hash == hash && adapter.equal(A::as_query(&e.key), A::as_query(&key)) {
                        return Err(InsertError::DuplicateKey);
                    }
                }
            }
        }

        let Some(i) = landing else {
            let capacity = self.capacity();
            warn!("probed all {} slots without finding a free one", capacity);
            return Err(InsertError::CapacityExhausted { capacity });
        };

        if matches!(self.slots[i], Slot::Tombstone) {
            self.tombstones -= 1;
        }
        self.slots[i] = Slot::Filled(Filled { hash, key, value });
        self.size += 1;
        Ok(i)
    }

    fn find_index<A>(&self, adapter: &A, hash: u32, query: &A::Query) -> Option<usize>
    where
        A: KeyAdapter<Key = K>,
    {
        for i in self.probe(hash) {
            match &self.slots[i] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Filled(e) => {
                    if e.hash == hash && adapter.equal(A::as_query(&e.key), query) {
                        return Some(i);
                    }
                }
            }
        }
        None
    }

    fn entry(&self, i: usize) -> Option<Entry<'_, K, V>> {
        match &self.slots[i] {
            Slot::Filled(e) => Some(Entry {
                hash: e.hash,
                key: &e.key,
                value: &e.value,
            }),
            _ => None,
        }
    }

    fn value_mut(&mut self, i: usize) -> Option<&mut V> {
        match &mut self.slots[i] {
            Slot::Filled(e) => Some(&mut e.value),
            _ => None,
        }
    }

    fn remove_at(&mut self, i: usize) -> Option<(K, V)> {
        match mem::replace(&mut self.slots[i], Slot::Tombstone) {
            Slot::Filled(e) => {
                self.size -= 1;
                self.tombstones += 1;
                Some((e.key, e.value))
            }
            other => {
                self.slots[i] = other;
                None
            }
        }
    }
}

/// Open-addressing container parameterized by a key adapter and a value
/// slot. Sets use `V = ()`.
pub struct RawTable<A: KeyAdapter, V = ()> {
    adapter: A,
    store: Slots<A::Key, V>,
    reentrancy: DebugReentrancy,
}

impl<A: KeyAdapter, V> RawTable<A, V> {
    /// Create a table with at least `capacity` slots (never fewer than
    /// [`MIN_CAPACITY`]).
    pub fn with_capacity(adapter: A, capacity: usize) -> Result<Self, AllocError> {
        Ok(Self {
            adapter,
            store: Slots::with_capacity(capacity)?,
            reentrancy: DebugReentrancy::new(),
        })
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Number of filled slots.
    pub fn len(&self) -> usize {
        self.store.size
    }

    pub fn is_empty(&self) -> bool {
        self.store.size == 0
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Number of tombstone slots left by removals since the last grow.
    pub fn tombstones(&self) -> usize {
        self.store.tombstones
    }

    /// Hash `query` the way this table hashes its keys.
    pub fn hash(&self, query: &A::Query) -> u32 {
        let _g = self.reentrancy.enter();
        self.adapter.hash(query)
    }

    /// Rehash into `capacity * MAX_LOAD_FACTOR / MIN_LOAD_FACTOR` slots,
    /// dropping tombstones. On error the table is unchanged.
    pub fn grow(&mut self) -> Result<(), AllocError> {
        self.store.grow()
    }

    /// Insert with a precomputed hash, which must equal `self.hash` of the
    /// key. Fails with [`InsertError::DuplicateKey`] if the key is present.
    pub fn quick_add(&mut self, hash: u32, key: A::Key, value: V) -> Result<(), InsertError> {
        let _g = self.reentrancy.enter();
        self.store.quick_add(&self.adapter, hash, key, value).map(drop)
    }

    /// Hash `key` and insert it unless an equal key is present.
    pub fn add(&mut self, key: A::Key, value: V) -> Result<(), InsertError> {
        let _g = self.reentrancy.enter();
        let hash = self.adapter.hash(A::as_query(&key));
        self.store.quick_add(&self.adapter, hash, key, value).map(drop)
    }

    /// Insert, or replace the value of an equal key already present and
    /// return the previous value. The stored key is kept.
    pub fn upsert(&mut self, key: A::Key, value: V) -> Result<Option<V>, InsertError> {
        let _g = self.reentrancy.enter();
        let hash = self.adapter.hash(A::as_query(&key));
        if let Some(i) = self.store.find_index(&self.adapter, hash, A::as_query(&key)) {
            if let Some(slot) = self.store.value_mut(i) {
                return Ok(Some(mem::replace(slot, value)));
            }
        }
        self.store.quick_add(&self.adapter, hash, key, value)?;
        Ok(None)
    }

    pub fn find(&self, query: &A::Query) -> Option<Entry<'_, A::Key, V>> {
        let _g = self.reentrancy.enter();
        let hash = self.adapter.hash(query);
        let i = self.store.find_index(&self.adapter, hash, query)?;
        self.store.entry(i)
    }

    /// Lookup with a precomputed hash, which must equal `self.hash(query)`.
    pub fn find_hashed(&self, hash: u32, query: &A::Query) -> Option<Entry<'_, A::Key, V>> {
        let _g = self.reentrancy.enter();
        let i = self.store.find_index(&self.adapter, hash, query)?;
        self.store.entry(i)
    }

    pub fn contains(&self, query: &A::Query) -> bool {
        self.find(query).is_some()
    }

    pub fn get_mut(&mut self, query: &A::Query) -> Option<&mut V> {
        let _g = self.reentrancy.enter();
        let hash = self.adapter.hash(query);
        let i = self.store.find_index(&self.adapter, hash, query)?;
        self.store.value_mut(i)
    }

    /// Remove `query`'s entry, leaving a tombstone. Absent keys are a no-op.
    pub fn remove(&mut self, query: &A::Query) -> Option<(A::Key, V)> {
        let _g = self.reentrancy.enter();
        let hash = self.adapter.hash(query);
        let i = self.store.find_index(&self.adapter, hash, query)?;
        self.store.remove_at(i)
    }

    /// Filled entries in slot order.
    pub fn iter(&self) -> Iter<'_, A::Key, V> {
        Iter {
            it: self.store.slots.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, A::Key, V> {
        IterMut {
            it: self.store.slots.iter_mut(),
        }
    }
}

impl<A, V> fmt::Debug for RawTable<A, V>
where
    A: KeyAdapter,
    A::Key: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|e| (e.key, e.value)))
            .finish()
    }
}

/// Iterator over the filled entries of a [`RawTable`].
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = Entry<'a, K, V>;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.find_map(|slot| match slot {
            Slot::Filled(e) => Some(Entry {
                hash: e.hash,
                key: &e.key,
                value: &e.value,
            }),
            _ => None,
        })
    }
}

/// Iterator over the filled entries of a [`RawTable`] with mutable values.
pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.find_map(|slot| match slot {
            Slot::Filled(e) => Some((&e.key, &mut e.value)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{bytes_equal, Bytes, Fixed, Pointer};
    use std::cell::Cell;
    use std::collections::BTreeSet;

    fn fixed(capacity: usize) -> RawTable<Fixed<u32>, u32> {
        RawTable::with_capacity(Fixed::new(), capacity).unwrap()
    }

    /// Invariant: requested capacities are clamped up to `MIN_CAPACITY`.
    #[test]
    fn capacity_floor() {
        assert_eq!(fixed(0).capacity(), MIN_CAPACITY);
        assert_eq!(fixed(3).capacity(), MIN_CAPACITY);
        assert_eq!(fixed(100).capacity(), 100);
        let t = fixed(0);
        assert!(t.is_empty());
        assert_eq!(t.tombstones(), 0);
    }

    /// Invariant: a fresh key is stored and found with its value.
    #[test]
    fn add_then_find() {
        let mut t = fixed(8);
        t.add(1, 10).unwrap();
        t.add(2, 20).unwrap();
        let e = t.find(&1).expect("1 present");
        assert_eq!((*e.key, *e.value), (1, 10));
        assert_eq!(e.hash, t.hash(&1));
        assert!(t.contains(&2));
        assert!(!t.contains(&3));
        assert_eq!(t.len(), 2);
    }

    /// Invariant: insertion is add-if-absent; a duplicate leaves size and value unchanged.
    #[test]
    fn duplicate_add_rejected() {
        let mut t = fixed(8);
        t.add(5, 1).unwrap();
        assert_eq!(t.add(5, 2), Err(InsertError::DuplicateKey));
        let h = t.hash(&5);
        assert_eq!(t.quick_add(h, 5, 3), Err(InsertError::DuplicateKey));
        assert_eq!(t.len(), 1);
        assert_eq!(t.find(&5).map(|e| *e.value), Some(1));
    }

    /// Invariant: `upsert` replaces an existing value and reports the old one.
    #[test]
    fn upsert_replaces_value() {
        let mut t = fixed(8);
        assert_eq!(t.upsert(9, 1), Ok(None));
        assert_eq!(t.upsert(9, 2), Ok(Some(1)));
        assert_eq!(t.len(), 1);
        assert_eq!(t.find(&9).map(|e| *e.value), Some(2));
    }

    /// Invariant: removal tombstones the slot; removing an absent key is a no-op.
    #[test]
    fn remove_leaves_tombstone() {
        let mut t = fixed(8);
        t.add(1, 10).unwrap();
        t.add(2, 20).unwrap();
        assert_eq!(t.remove(&1), Some((1, 10)));
        assert_eq!((t.len(), t.tombstones()), (1, 1));
        assert!(!t.contains(&1));
        assert!(t.contains(&2));

        assert_eq!(t.remove(&1), None);
        assert_eq!(t.remove(&42), None);
        assert_eq!((t.len(), t.tombstones()), (1, 1));
        assert_eq!(t.capacity(), 8);
    }

    /// Invariant: crossing the max load factor grows before inserting, keeps every
    /// entry findable, and resets tombstones.
    #[test]
    fn grow_on_load_factor() {
        let mut t = fixed(8);
        for k in 0..6 {
            t.add(k, k * 10).unwrap();
        }
        assert_eq!(t.capacity(), 8);
        t.remove(&0).unwrap();
        t.add(100, 0).unwrap();
        assert_eq!(t.capacity(), 8, "5/8 is below the max load factor");

        // 6/8 reaches the threshold: the next add grows first.
        t.add(101, 0).unwrap();
        assert_eq!(t.capacity(), 12);
        assert_eq!(t.tombstones(), 0);
        assert_eq!(t.len(), 7);
        for k in (1..6).chain([100, 101]) {
            assert!(t.contains(&k), "{k} must survive the rehash");
        }
        assert!(!t.contains(&0));
    }

    /// Invariant: explicit grow multiplies capacity by 1.5 and keeps cached hashes.
    #[test]
    fn explicit_grow() {
        let mut t = fixed(8);
        t.add(7, 70).unwrap();
        let before = t.find(&7).unwrap().hash;
        t.grow().unwrap();
        assert_eq!(t.capacity(), 12);
        t.grow().unwrap();
        assert_eq!(t.capacity(), 18);
        assert_eq!(t.find(&7).unwrap().hash, before);
    }

    /// Invariant: an unallocatable initial capacity is reported, not aborted on.
    #[test]
    fn init_alloc_failure_reported() {
        let res = RawTable::<Fixed<u64>, u64>::with_capacity(Fixed::new(), usize::MAX);
        assert_eq!(res.err(), Some(AllocError { capacity: usize::MAX }));
    }

    /// Invariant: growth is all-or-nothing; a failed allocation leaves size,
    /// capacity, tombstones and membership untouched.
    #[test]
    fn failed_grow_leaves_table_unchanged() {
        let mut t = fixed(8);
        for k in 0..5 {
            t.add(k, k * 10).unwrap();
        }
        t.remove(&1).unwrap();
        let before: BTreeSet<(u32, u32)> = t.iter().map(|e| (*e.key, *e.value)).collect();

        assert_eq!(t.store.grow_to(usize::MAX), Err(AllocError { capacity: usize::MAX }));
        assert_eq!((t.len(), t.capacity(), t.tombstones()), (4, 8, 1));
        let after: BTreeSet<(u32, u32)> = t.iter().map(|e| (*e.key, *e.value)).collect();
        assert_eq!(after, before);
        assert!((0..5).filter(|&k| k != 1).all(|k| t.contains(&k)));

        // The table stays usable, and a pending grow still happens on demand.
        t.add(1, 11).unwrap();
        t.add(5, 50).unwrap();
        t.add(6, 60).unwrap();
        assert_eq!(t.capacity(), 12);
        assert_eq!(t.tombstones(), 0);
    }

    /// Invariant: a probe cycle with no empty or tombstone slot reports
    /// exhaustion instead of overwriting a live entry.
    #[test]
    fn full_cycle_reports_exhaustion() {
        let mut store: Slots<u32, ()> = Slots {
            slots: (0..8)
                .map(|k| Slot::Filled(Filled { hash: k, key: k, value: () }))
                .collect(),
            size: 0,
            tombstones: 0,
        };
        let res = store.quick_add(&Fixed::<u32>::new(), 1000, 1000, ());
        assert_eq!(res, Err(InsertError::CapacityExhausted { capacity: 8 }));
        assert_eq!(store.capacity(), 8);
        assert!(store.find_index(&Fixed::<u32>::new(), 3, &3).is_some());
    }

    /// Invariant: landing on a tombstone reuses it and keeps
    /// `size + tombstones <= capacity`.
    #[test]
    fn tombstone_slot_is_reused() {
        let mut t = fixed(8);
        t.add(3, 0).unwrap();
        t.remove(&3).unwrap();
        assert_eq!(t.tombstones(), 1);
        t.add(3, 1).unwrap();
        assert_eq!((t.len(), t.tombstones()), (1, 0));
        assert_eq!(t.find(&3).map(|e| *e.value), Some(1));
    }

    /// Invariant: with every key colliding, lookups resolve by equality and a
    /// duplicate behind a tombstone is still rejected.
    #[test]
    fn collisions_and_duplicate_past_tombstone() {
        let adapter = Bytes::<String>::with_callables(|_| 0, bytes_equal);
        let mut t: RawTable<Bytes<String>, i32> = RawTable::with_capacity(adapter, 8).unwrap();
        t.add("a".to_string(), 1).unwrap();
        t.add("b".to_string(), 2).unwrap();
        t.add("c".to_string(), 3).unwrap();
        assert_eq!(t.find(b"b").map(|e| *e.value), Some(2));

        t.remove(b"a").unwrap();
        assert_eq!(t.add("c".to_string(), 9), Err(InsertError::DuplicateKey));
        assert_eq!(t.len(), 2);
        assert_eq!(t.find(b"c").map(|e| *e.value), Some(3));
        assert!(t.find(b"a").is_none());
    }

    /// Invariant: lookups never continue past an empty slot, so an absent key
    /// whose chain is empty is reported missing immediately.
    #[test]
    fn empty_slot_ends_probe() {
        let t = fixed(8);
        assert!(t.find(&1).is_none());
        assert!(t.find_hashed(t.hash(&1), &1).is_none());
    }

    /// Invariant: iteration yields each filled entry once; `iter_mut` updates values.
    #[test]
    fn iteration_and_mutation() {
        let mut t = fixed(8);
        for k in 1..=4 {
            t.add(k, k).unwrap();
        }
        t.remove(&2).unwrap();
        let keys: BTreeSet<u32> = t.iter().map(|e| *e.key).collect();
        assert_eq!(keys, BTreeSet::from([1, 3, 4]));

        for (_k, v) in t.iter_mut() {
            *v *= 100;
        }
        *t.get_mut(&4).unwrap() += 1;
        assert_eq!(t.find(&3).map(|e| *e.value), Some(300));
        assert_eq!(t.find(&4).map(|e| *e.value), Some(401));
        assert!(t.get_mut(&2).is_none());
    }

    fn str_span(s: &str) -> &[u8] {
        s.as_bytes()
    }

    type Probed = RawTable<Pointer<'static, str>>;

    thread_local! {
        static TARGET: Cell<*const Probed> = const { Cell::new(core::ptr::null()) };
    }

    fn reentrant_eq(a: &str, b: &str) -> bool {
        let target = TARGET.with(Cell::get);
        if !target.is_null() {
            // Calls back into the table that is currently probing.
            unsafe {
                let _ = (*target).contains("zzz");
            }
        }
        a == b
    }

    /// Invariant (debug-only): an adapter callable re-entering its table panics.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_key_equal() {
        let mut t: Probed = RawTable::with_capacity(Pointer::new(str_span, reentrant_eq), 8).unwrap();
        t.add("a", ()).unwrap();

        TARGET.with(|c| c.set(&t as *const _));
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| t.contains("a")));
        TARGET.with(|c| c.set(core::ptr::null()));

        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
        assert!(t.contains("a"), "guard is released after the panic");
    }
}
