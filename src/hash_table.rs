//! HashTable: the open-addressing core with a value slot.

use crate::adapter::{Bytes, Fixed, KeyAdapter, Pointer};
use crate::error::{AllocError, InsertError};
use crate::raw_table::{Entry, Iter, IterMut, RawTable};
use core::fmt;

/// Table keyed by fixed-width values.
pub type FixedHashTable<K, V> = HashTable<Fixed<K>, V>;

/// Table keyed by owned variable-length keys, looked up by `&[u8]`.
pub type BytesHashTable<K, V> = HashTable<Bytes<K>, V>;

/// Table keyed by borrowed keys; the keys must outlive the table.
pub type PointerHashTable<'a, K, V> = HashTable<Pointer<'a, K>, V>;

/// Map from unique keys (hashed and compared through `A`) to values.
pub struct HashTable<A: KeyAdapter, V> {
    raw: RawTable<A, V>,
}

impl<A: KeyAdapter + Default, V> HashTable<A, V> {
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Self::with_adapter(A::default(), capacity)
    }
}

impl<A: KeyAdapter, V> HashTable<A, V> {
    pub fn with_adapter(adapter: A, capacity: usize) -> Result<Self, AllocError> {
        Ok(Self {
            raw: RawTable::with_capacity(adapter, capacity)?,
        })
    }

    pub fn adapter(&self) -> &A {
        self.raw.adapter()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    pub fn tombstones(&self) -> usize {
        self.raw.tombstones()
    }

    pub fn hash(&self, key: &A::Query) -> u32 {
        self.raw.hash(key)
    }

    pub fn grow(&mut self) -> Result<(), AllocError> {
        self.raw.grow()
    }

    /// Insert `key -> value` unless `key` is present; an existing value is
    /// never overwritten. See [`HashTable::upsert`] for that.
    pub fn add(&mut self, key: A::Key, value: V) -> Result<(), InsertError> {
        self.raw.add(key, value)
    }

    pub fn quick_add(&mut self, hash: u32, key: A::Key, value: V) -> Result<(), InsertError> {
        self.raw.quick_add(hash, key, value)
    }

    /// Insert or overwrite; returns the replaced value.
    pub fn upsert(&mut self, key: A::Key, value: V) -> Result<Option<V>, InsertError> {
        self.raw.upsert(key, value)
    }

    pub fn remove(&mut self, key: &A::Query) -> Option<(A::Key, V)> {
        self.raw.remove(key)
    }

    pub fn contains(&self, key: &A::Query) -> bool {
        self.raw.contains(key)
    }

    pub fn find(&self, key: &A::Query) -> Option<Entry<'_, A::Key, V>> {
        self.raw.find(key)
    }

    pub fn get(&self, key: &A::Query) -> Option<&V> {
        self.raw.find(key).map(|e| e.value)
    }

    pub fn get_mut(&mut self, key: &A::Query) -> Option<&mut V> {
        self.raw.get_mut(key)
    }

    pub fn iter(&self) -> Iter<'_, A::Key, V> {
        self.raw.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, A::Key, V> {
        self.raw.iter_mut()
    }
}

impl<A, V> fmt::Debug for HashTable<A, V>
where
    A: KeyAdapter,
    A::Key: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.raw, f)
    }
}
