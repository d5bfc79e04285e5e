//! Core chain components
//!
//! This module contains the consensus engine:
//! - Difficulty parameters and the compact target codec
//! - Candidates (normalization, dedup, canonical order)
//! - Blocks (hash formulas, genesis, single-attempt construction)
//! - Blockchain (the chain under construction)
//! - Validation (full replay of every rule)

pub mod block;
pub mod blockchain;
pub mod candidate;
pub mod difficulty;
pub mod params;
pub mod validation;

pub use block::{
    compute_block_hash, compute_candidate_hash, compute_genesis_candidate_hash, Block, Winner,
    GENESIS_TAG, ZERO_HASH,
};
pub use blockchain::Blockchain;
pub use candidate::{
    dedupe_and_order, normalize_all, parse_timestamp, Candidate, CandidateError, RawCandidate,
    RawTimestamp, UNKNOWN_SOURCE,
};
pub use difficulty::{
    decode_target, encode_target, format_bits, required_bits, retarget, target_hex,
    MAX_ADJUSTMENT_FACTOR,
};
pub use params::{
    parse_bits, ConfigError, DifficultyParams, DEFAULT_POW_LIMIT_BITS,
    DIFFICULTY_ADJUSTMENT_INTERVAL, TARGET_SPACING_SECONDS,
};
pub use validation::{validate_chain, ChainIntegrityError};
