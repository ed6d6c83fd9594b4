//! HashSet: the open-addressing core with no value slot.

use crate::adapter::{Bytes, Fixed, KeyAdapter, Pointer};
use crate::error::{AllocError, InsertError};
use crate::raw_table::{self, RawTable};
use core::fmt;

/// Set of fixed-width keys (integers, `char`, `bool`).
pub type FixedHashSet<K> = HashSet<Fixed<K>>;

/// Set of owned variable-length keys, looked up by `&[u8]`.
pub type BytesHashSet<K> = HashSet<Bytes<K>>;

/// Set of borrowed keys; the keys must outlive the set.
pub type PointerHashSet<'a, K> = HashSet<Pointer<'a, K>>;

/// Set of unique keys hashed and compared through the adapter `A`.
pub struct HashSet<A: KeyAdapter> {
    pub(crate) raw: RawTable<A, ()>,
}

impl<A: KeyAdapter + Default> HashSet<A> {
    /// Create an empty set with the adapter's default configuration.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Self::with_adapter(A::default(), capacity)
    }
}

impl<A: KeyAdapter> HashSet<A> {
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

    /// Insert `key` unless an equal key is present.
    pub fn add(&mut self, key: A::Key) -> Result<(), InsertError> {
        self.raw.add(key, ())
    }

    /// Insert with a hash previously obtained from [`HashSet::hash`].
    pub fn quick_add(&mut self, hash: u32, key: A::Key) -> Result<(), InsertError> {
        self.raw.quick_add(hash, key, ())
    }

    /// Remove and return the stored key equal to `key`.
    pub fn remove(&mut self, key: &A::Query) -> Option<A::Key> {
        self.raw.remove(key).map(|(k, ())| k)
    }

    pub fn contains(&self, key: &A::Query) -> bool {
        self.raw.contains(key)
    }

    /// The stored key equal to `key`.
    pub fn find(&self, key: &A::Query) -> Option<&A::Key> {
        self.raw.find(key).map(|e| e.key)
    }

    pub fn iter(&self) -> Iter<'_, A::Key> {
        Iter {
            it: self.raw.iter(),
        }
    }
}

impl<A> fmt::Debug for HashSet<A>
where
    A: KeyAdapter,
    A::Key: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, A: KeyAdapter> IntoIterator for &'a HashSet<A> {
    type Item = &'a A::Key;
    type IntoIter = Iter<'a, A::Key>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the keys of a [`HashSet`].
pub struct Iter<'a, K> {
    it: raw_table::Iter<'a, K, ()>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| e.key)
    }
}
