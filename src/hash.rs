//! FNV-1a, 32-bit.
//!
//! Unseeded and deterministic: the same bytes hash to the same value across
//! runs and processes. It is not resistant to adversarial inputs; callers
//! that need that must not feed untrusted keys to these containers.

/// FNV-1a 32-bit offset basis.
pub const FNV32_BASIS: u32 = 0x811c_9dc5;

/// FNV-1a 32-bit prime.
pub const FNV32_PRIME: u32 = 0x0100_0193;

/// Hash `bytes` in a single pass.
#[inline]
pub fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV32_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV32_PRIME)
    })
}
