//! fnv-table: open-addressing hash sets and hash tables with FNV-1a
//! hashing, tombstone deletion and pluggable key adapters.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one probing/growth/tombstone engine serving every key kind, so
//!   sets and tables of integers, strings and borrowed descriptors share a
//!   single implementation.
//! - Layers:
//!   - `hash`: 32-bit FNV-1a, unseeded and deterministic.
//!   - `adapter`: `KeyAdapter` strategies deciding which bytes are hashed
//!     and how keys compare (`Fixed`, `Bytes`, `Pointer`).
//!   - `RawTable<A, V>`: the open-addressing core. Linear probing, cached
//!     per-slot hashes, add-if-absent insertion, tombstone removal and
//!     pre-insert growth.
//!   - `HashSet<A>` / `HashTable<A, V>`: the core without and with a value
//!     slot. Sets add union, intersection and difference.
//!   - `StateMachine`: a consumer of the pointer-keyed table mapping state
//!     descriptors to transition functions.
//!
//! Constraints
//! - Synchronous and single-threaded: containers are `Send` when their
//!   contents are, never `Sync`. Share them behind an external lock.
//! - Add-if-absent: `add`/`quick_add` reject an existing key and leave the
//!   container unchanged. `HashTable::upsert` is the separate replace path.
//! - Growth is all-or-nothing: the new slot array is allocated before the
//!   old one is touched, and allocation failure is reported as an error.
//! - Capacity never shrinks; removal leaves tombstones that the next grow
//!   drops.
//! - Pointer-keyed containers borrow their keys and never free them.
//!
//! Hash caching
//! - Each filled slot stores the key's 32-bit hash. Growth and set algebra
//!   reinsert with the cached hash (`quick_add`) and never re-run adapter
//!   callables for that.
//!
//! Reentrancy policy
//! - Adapter callables run during probing and must not call back into the
//!   container. A debug-only guard panics if they do; release builds carry
//!   no check.

mod adapter;
mod error;
pub mod hash;
pub mod hash_set;
pub mod hash_table;
pub mod raw_table;
mod raw_table_proptest;
mod reentrancy;
mod set_algebra;
pub mod state_machine;

// Public surface
pub use adapter::{bytes_equal, full_len, Bytes, BytesEqual, Fixed, FixedWidth, KeyAdapter, KeySize, Pointer};
pub use error::{AllocError, InsertError, RunError, SetOpError};
pub use hash::fnv1a;
pub use hash_set::{BytesHashSet, FixedHashSet, HashSet, PointerHashSet};
pub use hash_table::{BytesHashTable, FixedHashTable, HashTable, PointerHashTable};
pub use raw_table::{Entry, RawTable, MAX_LOAD_FACTOR, MIN_CAPACITY, MIN_LOAD_FACTOR};
pub use state_machine::{State, StateKind, StateMachine, Transition};
