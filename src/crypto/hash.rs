//! Cryptographic hashing utilities for the chain
//!
//! Provides the double SHA-256 commitment used for candidate and block hashes,
//! plus the hex/big-integer helpers the proof-of-work check is built on.

use num_bigint::BigUint;
use num_traits::Zero;
use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
/// Used for candidate and block hashes in Bitcoin-style chains
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Computes double SHA-256 hash and returns it as a lowercase hex string
pub fn double_sha256_hex(data: &[u8]) -> String {
    hex::encode(double_sha256(data))
}

/// Interprets a hex string as a big-endian unsigned integer.
///
/// An optional `0x` prefix is stripped and an empty string is zero.
/// Returns `None` if the remaining text is not valid hex.
pub fn hex_to_biguint(hex: &str) -> Option<BigUint> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    if digits.is_empty() {
        return Some(BigUint::zero());
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
}

/// Truncates an integer to its low 32 bits
pub fn wrap_to_u32(value: i128) -> u32 {
    (value & 0xffff_ffff) as u32
}

/// Checks if a hex-encoded hash is numerically at or below the target.
/// Hashes that are not valid hex never meet a target.
pub fn meets_target(hash_hex: &str, target: &BigUint) -> bool {
    hex_to_biguint(hash_hex).is_some_and(|value| &value <= target)
}
