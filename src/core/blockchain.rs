//! Blockchain implementation
//!
//! The chain under construction: a genesis block followed by every lucky
//! candidate, each tested against the bits the chain so far requires.

use crate::core::block::Block;
use crate::core::candidate::Candidate;
use crate::core::difficulty::required_bits;
use crate::core::params::DifficultyParams;
use crate::core::validation::{validate_chain, ChainIntegrityError};
use log::debug;

/// The main blockchain structure
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks, genesis first
    blocks: Vec<Block>,
    /// Consensus parameters the chain is built and validated under
    params: DifficultyParams,
}

impl Blockchain {
    /// Create a new blockchain holding only a genesis block at `genesis_time`
    pub fn new(params: DifficultyParams, genesis_time: i64) -> Self {
        let genesis = Block::genesis(required_bits(&[], &params), genesis_time);
        Self {
            blocks: vec![genesis],
            params,
        }
    }

    /// Adopt existing blocks after validating them under `params`
    pub fn from_blocks(
        blocks: Vec<Block>,
        params: DifficultyParams,
    ) -> Result<Self, ChainIntegrityError> {
        validate_chain(&blocks, &params)?;
        Ok(Self { blocks, params })
    }

    /// Get the latest block
    pub fn latest_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Get a block by height
    pub fn get_block(&self, height: u64) -> Option<&Block> {
        self.blocks.get(height as usize)
    }

    /// Get blockchain height
    pub fn height(&self) -> u64 {
        self.blocks.len().saturating_sub(1) as u64
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Blocks built from candidates, genesis excluded
    pub fn lucky_blocks(&self) -> &[Block] {
        self.blocks.get(1..).unwrap_or_default()
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn params(&self) -> &DifficultyParams {
        &self.params
    }

    /// Bits the next block must carry
    pub fn next_bits(&self) -> u32 {
        required_bits(&self.blocks, &self.params)
    }

    /// Test a candidate against the current target and append it if lucky.
    ///
    /// Returns the new block, or `None` if the candidate was skipped.
    pub fn try_append(&mut self, candidate: &Candidate) -> Option<&Block> {
        let bits = self.next_bits();
        let block = Block::try_build(self.latest_block()?, candidate, bits)?;

        debug!(
            "Lucky candidate {} {} at height {}",
            block.repo, block.commit_sha, block.height
        );

        self.blocks.push(block);
        self.blocks.last()
    }

    /// Validate the entire chain
    pub fn validate(&self) -> Result<(), ChainIntegrityError> {
        validate_chain(&self.blocks, &self.params)
    }

    /// Check whether the chain validates
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::ZERO_HASH;
    use crate::core::candidate::RawCandidate;

    const EASY_BITS: u32 = 0x2300_0001;

    fn candidate(sha: &str, timestamp: i64) -> Candidate {
        Candidate::try_from(RawCandidate::new("demo/repo", sha, timestamp)).unwrap()
    }

    #[test]
    fn test_new_blockchain() {
        let params = DifficultyParams::default();
        let blockchain = Blockchain::new(params, 1_000);

        assert_eq!(blockchain.len(), 1);
        assert!(!blockchain.is_empty());
        assert_eq!(blockchain.height(), 0);
        assert_eq!(blockchain.blocks()[0].prev_hash, ZERO_HASH);
        assert_eq!(blockchain.blocks()[0].bits, params.pow_limit_bits);
        assert!(blockchain.lucky_blocks().is_empty());
        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_try_append_lucky() {
        let params = DifficultyParams::new(EASY_BITS, 600, 10).unwrap();
        let mut blockchain = Blockchain::new(params, 1_000);

        let block = blockchain.try_append(&candidate("abc", 2_000)).cloned().unwrap();

        assert_eq!(block.height, 1);
        assert_eq!(blockchain.height(), 1);
        assert_eq!(blockchain.get_block(1), Some(&block));
        assert_eq!(blockchain.lucky_blocks().len(), 1);
        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_try_append_unlucky() {
        let params = DifficultyParams::new(0, 600, 10).unwrap();
        let mut blockchain = Blockchain::new(params, 1_000);

        assert!(blockchain.try_append(&candidate("abc", 2_000)).is_none());
        assert_eq!(blockchain.len(), 1);
    }

    #[test]
    fn test_from_blocks_validates() {
        let params = DifficultyParams::new(EASY_BITS, 600, 10).unwrap();
        let mut blockchain = Blockchain::new(params, 1_000);
        blockchain.try_append(&candidate("abc", 2_000));
        blockchain.try_append(&candidate("def", 2_060));

        let mut blocks = blockchain.clone().into_blocks();
        assert!(Blockchain::from_blocks(blocks.clone(), params).is_ok());

        blocks[2].time += 1;
        assert_eq!(
            Blockchain::from_blocks(blocks, params).unwrap_err(),
            ChainIntegrityError::BlockHashMismatch(2)
        );
    }
}
