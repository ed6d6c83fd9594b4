//! Key adapters: how a container hashes and compares its keys.
//!
//! One open-addressing core serves every key kind; what differs is captured
//! by a [`KeyAdapter`]:
//! - [`Fixed`]: fixed-width keys stored by value and hashed over their
//!   native byte representation.
//! - [`Bytes`]: owned variable-length keys (strings, byte vectors) whose
//!   hashed length and equality come from two function pointers fixed at
//!   construction.
//! - [`Pointer`]: borrowed keys the container never owns. The byte span to
//!   hash and the equality test are function pointers fixed at construction.
//!
//! Adapter callables must be pure: equal keys must produce equal hashes, and
//! they must not touch the container they are invoked from.

use crate::hash::fnv1a;
use core::fmt;
use core::marker::PhantomData;

/// Hashing and equality strategy for one container.
///
/// `Key` is what a slot stores; `Query` is the borrowed form used for
/// lookups, so that `find`/`remove` never need an owned key.
pub trait KeyAdapter: Clone {
    type Key;
    type Query: ?Sized;

    /// Borrow a stored key as a query.
    fn as_query(key: &Self::Key) -> &Self::Query;

    /// FNV-1a over the key's hashable bytes.
    fn hash(&self, query: &Self::Query) -> u32;

    /// Key equality. Only called on keys whose hashes already match.
    fn equal(&self, a: &Self::Query, b: &Self::Query) -> bool;

    /// Whether `other` hashes and compares keys exactly like `self`.
    ///
    /// Set algebra refuses to combine containers for which this is false.
    fn same_config(&self, other: &Self) -> bool;
}

/// Keys with a fixed in-memory width, hashed over their native bytes.
pub trait FixedWidth: Eq {
    fn fnv1a(&self) -> u32;
}

macro_rules! impl_fixed_width {
    ($($t:ty),* $(,)?) => {
        $(
            impl FixedWidth for $t {
                #[inline]
                fn fnv1a(&self) -> u32 {
                    fnv1a(&self.to_ne_bytes())
                }
            }
        )*
    };
}

impl_fixed_width!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl FixedWidth for char {
    #[inline]
    fn fnv1a(&self) -> u32 {
        fnv1a(&u32::from(*self).to_ne_bytes())
    }
}

impl FixedWidth for bool {
    #[inline]
    fn fnv1a(&self) -> u32 {
        fnv1a(&[u8::from(*self)])
    }
}

/// Adapter for fixed-width keys stored by value.
pub struct Fixed<K>(PhantomData<fn() -> K>);

impl<K> Fixed<K> {
    pub const fn new() -> Self {
        Fixed(PhantomData)
    }
}

impl<K> Default for Fixed<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for Fixed<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Fixed<K> {}

impl<K> fmt::Debug for Fixed<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Fixed")
    }
}

impl<K: FixedWidth> KeyAdapter for Fixed<K> {
    type Key = K;
    type Query = K;

    #[inline]
    fn as_query(key: &K) -> &K {
        key
    }

    #[inline]
    fn hash(&self, query: &K) -> u32 {
        query.fnv1a()
    }

    #[inline]
    fn equal(&self, a: &K, b: &K) -> bool {
        a == b
    }

    fn same_config(&self, _other: &Self) -> bool {
        true
    }
}

/// Number of leading bytes of a key that participate in hashing.
pub type KeySize = fn(&[u8]) -> usize;

/// Equality over two keys' byte representations.
pub type BytesEqual = fn(&[u8], &[u8]) -> bool;

/// Default [`KeySize`]: the whole key.
pub fn full_len(bytes: &[u8]) -> usize {
    bytes.len()
}

/// Default [`BytesEqual`]: byte-wise equality.
pub fn bytes_equal(a: &[u8], b: &[u8]) -> bool {
    a == b
}

/// Adapter for owned variable-length keys such as `String` or `Vec<u8>`.
///
/// Lookups take `&[u8]`. A `key_size` that hashes fewer bytes than
/// `key_equal` compares is allowed (it only costs collisions); the reverse
/// breaks lookups.
pub struct Bytes<K> {
    key_size: KeySize,
    key_equal: BytesEqual,
    _pd: PhantomData<fn() -> K>,
}

impl<K> Bytes<K> {
    /// Full-length hashing and byte equality.
    pub fn new() -> Self {
        Self::with_callables(full_len, bytes_equal)
    }

    pub fn with_callables(key_size: KeySize, key_equal: BytesEqual) -> Self {
        Self {
            key_size,
            key_equal,
            _pd: PhantomData,
        }
    }
}

impl<K> Default for Bytes<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for Bytes<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Bytes<K> {}

impl<K> fmt::Debug for Bytes<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bytes")
            .field("key_size", &(self.key_size as *const ()))
            .field("key_equal", &(self.key_equal as *const ()))
            .finish()
    }
}

impl<K: AsRef<[u8]>> KeyAdapter for Bytes<K> {
    type Key = K;
    type Query = [u8];

    #[inline]
    fn as_query(key: &K) -> &[u8] {
        key.as_ref()
    }

    #[inline]
    fn hash(&self, query: &[u8]) -> u32 {
        let n = (self.key_size)(query).min(query.len());
        fnv1a(&query[..n])
    }

    #[inline]
    fn equal(&self, a: &[u8], b: &[u8]) -> bool {
        (self.key_equal)(a, b)
    }

    fn same_config(&self, other: &Self) -> bool {
        core::ptr::fn_addr_eq(self.key_size, other.key_size)
            && core::ptr::fn_addr_eq(self.key_equal, other.key_equal)
    }
}

/// Adapter for borrowed keys owned outside the container.
///
/// The container stores `&'a K` and never frees what it points to; the
/// borrow guarantees the keys outlive it.
pub struct Pointer<'a, K: ?Sized> {
    key_span: fn(&K) -> &[u8],
    key_equal: fn(&K, &K) -> bool,
    _pd: PhantomData<&'a K>,
}

impl<'a, K: ?Sized> Pointer<'a, K> {
    /// `key_span` returns the bytes to hash (its length is the key size);
    /// `key_equal` decides key identity.
    pub fn new(key_span: fn(&K) -> &[u8], key_equal: fn(&K, &K) -> bool) -> Self {
        Self {
            key_span,
            key_equal,
            _pd: PhantomData,
        }
    }
}

impl<K: ?Sized> Clone for Pointer<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: ?Sized> Copy for Pointer<'_, K> {}

impl<K: ?Sized> fmt::Debug for Pointer<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pointer")
            .field("key_span", &(self.key_span as *const ()))
            .field("key_equal", &(self.key_equal as *const ()))
            .finish()
    }
}

impl<'a, K: ?Sized> KeyAdapter for Pointer<'a, K> {
    type Key = &'a K;
    type Query = K;

    #[inline]
    fn as_query<'k>(key: &'k &'a K) -> &'k K {
        key
    }

    #[inline]
    fn hash(&self, query: &K) -> u32 {
        fnv1a((self.key_span)(query))
    }

    #[inline]
    fn equal(&self, a: &K, b: &K) -> bool {
        (self.key_equal)(a, b)
    }

    fn same_config(&self, other: &Self) -> bool {
        core::ptr::fn_addr_eq(self.key_span, other.key_span)
            && core::ptr::fn_addr_eq(self.key_equal, other.key_equal)
    }
}
