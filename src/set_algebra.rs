//! Union, intersection and difference over [`HashSet`]s.
//!
//! Built only from the core's iteration and `quick_add`: entries are copied
//! with their cached hashes, so results never re-hash keys. Operands must
//! share one adapter configuration; otherwise no result is produced.

use crate::adapter::KeyAdapter;
use crate::error::{InsertError, SetOpError};
use crate::hash_set::HashSet;
use crate::raw_table::Entry;
use log::trace;

impl<A> HashSet<A>
where
    A: KeyAdapter,
    A::Key: Clone,
{
    fn check_compatible(&self, other: &Self) -> Result<(), SetOpError> {
        if self.adapter().same_config(other.adapter()) {
            Ok(())
        } else {
            Err(SetOpError::AdapterMismatch)
        }
    }

    /// Copy an entry in; a key already present is the expected outcome for
    /// keys shared by both operands.
    fn copy_entry(&mut self, entry: Entry<'_, A::Key, ()>) -> Result<(), InsertError> {
        match self.raw.quick_add(entry.hash, entry.key.clone(), ()) {
            Ok(()) | Err(InsertError::DuplicateKey) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn contains_entry(&self, entry: Entry<'_, A::Key, ()>) -> bool {
        self.raw
            .find_hashed(entry.hash, A::as_query(entry.key))
            .is_some()
    }

    /// Keys in `self` or `other`.
    ///
    /// The result starts with `capacity(self) + capacity(other)` slots and
    /// grows like any other set if the combined keys cross the load factor.
    pub fn union(&self, other: &Self) -> Result<Self, SetOpError> {
        self.check_compatible(other)?;
        let capacity = self.capacity().saturating_add(other.capacity());
        let mut out = Self::with_adapter(self.adapter().clone(), capacity)?;
        for entry in self.raw.iter().chain(other.raw.iter()) {
            out.copy_entry(entry)?;
        }
        trace!("union of {} and {} keys has {}", self.len(), other.len(), out.len());
        Ok(out)
    }

    /// Keys in both `self` and `other`.
    ///
    /// Walks the operand with fewer slots and probes the other one.
    pub fn intersection(&self, other: &Self) -> Result<Self, SetOpError> {
        self.check_compatible(other)?;
        let (smaller, larger) = if self.capacity() < other.capacity() {
            (self, other)
        } else {
            (other, self)
        };
        let mut out = Self::with_adapter(self.adapter().clone(), smaller.capacity())?;
        for entry in smaller.raw.iter() {
            if larger.contains_entry(entry) {
                out.copy_entry(entry)?;
            }
        }
        trace!("intersection of {} and {} keys has {}", self.len(), other.len(), out.len());
        Ok(out)
    }

    /// Keys in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Result<Self, SetOpError> {
        self.check_compatible(other)?;
        let mut out = Self::with_adapter(self.adapter().clone(), self.capacity())?;
        for entry in self.raw.iter() {
            if !other.contains_entry(entry) {
                out.copy_entry(entry)?;
            }
        }
        trace!("difference of {} and {} keys has {}", self.len(), other.len(), out.len());
        Ok(out)
    }
}
