//! Chain validation
//!
//! Replays the difficulty engine and every hash rule over a chain. The
//! chain is the only input besides the parameters; nothing stored in a
//! block is trusted without being recomputed.

use crate::core::block::{compute_candidate_hash, compute_genesis_candidate_hash, Block, ZERO_HASH};
use crate::core::difficulty::{decode_target, required_bits, target_hex};
use crate::core::params::DifficultyParams;
use crate::crypto::meets_target;
use log::debug;
use thiserror::Error;

/// Chain integrity errors. Heights are chain positions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainIntegrityError {
    #[error("Chain cannot be empty")]
    EmptyChain,
    #[error("Invalid genesis block")]
    InvalidGenesis,
    #[error("Broken link at height {0}")]
    BrokenLink(u64),
    #[error("Unexpected bits at height {0}")]
    UnexpectedBits(u64),
    #[error("Candidate hash mismatch at height {0}")]
    CandidateHashMismatch(u64),
    #[error("PoW mismatch at height {0}")]
    PowMismatch(u64),
    #[error("Block hash mismatch at height {0}")]
    BlockHashMismatch(u64),
    #[error("Unexpected height {found} at height {expected}")]
    UnexpectedHeight { expected: u64, found: u64 },
    #[error("Target mismatch at height {0}")]
    TargetMismatch(u64),
}

impl ChainIntegrityError {
    /// Height of the offending block, if the error names one
    pub fn height(&self) -> Option<u64> {
        match self {
            ChainIntegrityError::EmptyChain => None,
            ChainIntegrityError::InvalidGenesis => Some(0),
            ChainIntegrityError::BrokenLink(h)
            | ChainIntegrityError::UnexpectedBits(h)
            | ChainIntegrityError::CandidateHashMismatch(h)
            | ChainIntegrityError::PowMismatch(h)
            | ChainIntegrityError::BlockHashMismatch(h)
            | ChainIntegrityError::TargetMismatch(h) => Some(*h),
            ChainIntegrityError::UnexpectedHeight { expected, .. } => Some(*expected),
        }
    }
}

/// Validate the entire chain, stopping at the lowest failing height
pub fn validate_chain(chain: &[Block], params: &DifficultyParams) -> Result<(), ChainIntegrityError> {
    let genesis = chain.first().ok_or(ChainIntegrityError::EmptyChain)?;
    validate_genesis(genesis, params)?;

    for (index, pair) in chain.windows(2).enumerate() {
        let (previous, block) = (&pair[0], &pair[1]);
        let height = index as u64 + 1;

        if block.prev_hash != previous.block_hash {
            return Err(ChainIntegrityError::BrokenLink(height));
        }

        if block.bits != required_bits(&chain[..=index], params) {
            return Err(ChainIntegrityError::UnexpectedBits(height));
        }

        let expected_candidate_hash = compute_candidate_hash(
            &previous.block_hash,
            &block.repo,
            &block.commit_sha,
            block.commit_time,
        );
        if block.candidate_hash != expected_candidate_hash {
            return Err(ChainIntegrityError::CandidateHashMismatch(height));
        }

        let target = decode_target(block.bits);
        if !meets_target(&block.candidate_hash, &target) {
            return Err(ChainIntegrityError::PowMismatch(height));
        }

        if !block.verify_hash() {
            return Err(ChainIntegrityError::BlockHashMismatch(height));
        }

        if block.height != height {
            return Err(ChainIntegrityError::UnexpectedHeight {
                expected: height,
                found: block.height,
            });
        }

        if block.target_hex != target_hex(&target) {
            return Err(ChainIntegrityError::TargetMismatch(height));
        }
    }

    debug!("Validated {} blocks", chain.len());
    Ok(())
}

fn validate_genesis(genesis: &Block, params: &DifficultyParams) -> Result<(), ChainIntegrityError> {
    if genesis.height != 0 || genesis.prev_hash != ZERO_HASH {
        return Err(ChainIntegrityError::InvalidGenesis);
    }
    if genesis.bits != required_bits(&[], params) {
        return Err(ChainIntegrityError::UnexpectedBits(0));
    }
    if genesis.candidate_hash != compute_genesis_candidate_hash(genesis.bits, genesis.time) {
        return Err(ChainIntegrityError::CandidateHashMismatch(0));
    }
    if !genesis.verify_hash() {
        return Err(ChainIntegrityError::BlockHashMismatch(0));
    }
    if genesis.target_hex != target_hex(&decode_target(genesis.bits)) {
        return Err(ChainIntegrityError::TargetMismatch(0));
    }
    Ok(())
}
