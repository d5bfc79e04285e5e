//! Cryptographic utilities for the chain
//!
//! This module provides:
//! - Double SHA-256 hashing
//! - Hex and big-integer conversions for proof-of-work checks

pub mod hash;

pub use hash::{
    double_sha256, double_sha256_hex, hex_to_biguint, meets_target, sha256, wrap_to_u32,
};
