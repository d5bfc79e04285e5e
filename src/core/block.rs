//! Block implementation for the chain
//!
//! A block commits to its predecessor, the candidate it was built from, the
//! compact bits in force and its time. Blocks are created once and never
//! mutated; validation re-derives every hash instead of trusting them.

use crate::core::candidate::Candidate;
use crate::core::difficulty::{decode_target, format_bits, target_hex};
use crate::crypto::{double_sha256_hex, meets_target};
use serde::{Deserialize, Serialize};

/// Previous-hash sentinel of the genesis block
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Provenance tag used for every genesis field
pub const GENESIS_TAG: &str = "genesis";

/// Author of the lucky commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub name: Option<String>,
    pub email: Option<String>,
    pub login: Option<String>,
}

/// A block in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block height (0 for genesis)
    pub height: u64,
    /// Hash of the previous block
    pub prev_hash: String,
    /// Hash of this block's header fields
    pub block_hash: String,
    /// Commitment to the previous block and the originating candidate
    pub candidate_hash: String,
    /// Compact difficulty in force for this block
    pub bits: u32,
    /// Target decoded from `bits`
    pub target_hex: String,
    /// Unix seconds
    pub time: i64,
    pub source: String,
    pub repo: String,
    pub commit_sha: String,
    pub commit_time: i64,
    pub winner: Winner,
    pub message: Option<String>,
}

/// Hash binding the previous block to a candidate's identity
pub fn compute_candidate_hash(prev_hash: &str, repo: &str, sha: &str, timestamp: i64) -> String {
    let payload = format!("{}|{}|{}|{}", prev_hash, repo, sha, timestamp);
    double_sha256_hex(payload.as_bytes())
}

/// Hash of the genesis pseudo-candidate
pub fn compute_genesis_candidate_hash(bits: u32, time: i64) -> String {
    let payload = format!("{}|{}|{}", GENESIS_TAG, time, format_bits(bits));
    double_sha256_hex(payload.as_bytes())
}

/// Hash of a block's header fields
pub fn compute_block_hash(
    height: u64,
    prev_hash: &str,
    candidate_hash: &str,
    bits: u32,
    time: i64,
) -> String {
    let header = format!(
        "{}|{}|{}|{}|{}",
        height,
        prev_hash,
        candidate_hash,
        format_bits(bits),
        time
    );
    double_sha256_hex(header.as_bytes())
}

impl Block {
    /// Create the genesis block
    pub fn genesis(bits: u32, time: i64) -> Self {
        let candidate_hash = compute_genesis_candidate_hash(bits, time);

        Self {
            height: 0,
            prev_hash: ZERO_HASH.to_string(),
            block_hash: compute_block_hash(0, ZERO_HASH, &candidate_hash, bits, time),
            candidate_hash,
            bits,
            target_hex: target_hex(&decode_target(bits)),
            time,
            source: GENESIS_TAG.to_string(),
            repo: GENESIS_TAG.to_string(),
            commit_sha: GENESIS_TAG.to_string(),
            commit_time: time,
            winner: Winner::default(),
            message: None,
        }
    }

    /// Try to build the block following `prev` from a candidate.
    ///
    /// The candidate hash is computed exactly once; if it is above the
    /// target the candidate is not lucky and `None` is returned.
    pub fn try_build(prev: &Block, candidate: &Candidate, bits: u32) -> Option<Self> {
        let candidate_hash = compute_candidate_hash(
            &prev.block_hash,
            candidate.repo(),
            candidate.sha(),
            candidate.timestamp(),
        );
        let target = decode_target(bits);

        if !meets_target(&candidate_hash, &target) {
            return None;
        }

        let height = prev.height + 1;
        let time = candidate.timestamp();

        Some(Self {
            height,
            prev_hash: prev.block_hash.clone(),
            block_hash: compute_block_hash(height, &prev.block_hash, &candidate_hash, bits, time),
            candidate_hash,
            bits,
            target_hex: target_hex(&target),
            time,
            source: candidate.source().to_string(),
            repo: candidate.repo().to_string(),
            commit_sha: candidate.sha().to_string(),
            commit_time: candidate.timestamp(),
            winner: Winner {
                name: candidate.author_name().map(str::to_string),
                email: candidate.author_email().map(str::to_string),
                login: candidate.author_login().map(str::to_string),
            },
            message: candidate.message().map(str::to_string),
        })
    }

    /// Recalculate the block hash from the stored header fields
    pub fn compute_hash(&self) -> String {
        compute_block_hash(
            self.height,
            &self.prev_hash,
            &self.candidate_hash,
            self.bits,
            self.time,
        )
    }

    /// Verify the block hash
    pub fn verify_hash(&self) -> bool {
        self.block_hash == self.compute_hash()
    }

    /// Check if the candidate hash meets the target of the stored bits
    pub fn is_valid_pow(&self) -> bool {
        meets_target(&self.candidate_hash, &decode_target(self.bits))
    }

    /// Whether this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.prev_hash == ZERO_HASH
    }

    /// Display name of the winner: login, then name
    pub fn winner_label(&self) -> &str {
        self.winner
            .login
            .as_deref()
            .or(self.winner.name.as_deref())
            .unwrap_or("unknown")
    }
}
