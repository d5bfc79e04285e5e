//! Lucky-Chain: a Bitcoin-style proof-of-work chain built from commits
//!
//! Each commit is a candidate. A candidate's hash is tested once against the
//! target the chain so far requires; lucky candidates become blocks. This
//! crate provides:
//! - Compact target ("nBits") codec and epoch retargeting
//! - Double SHA-256 chain linking and block construction
//! - Full chain validation from the serialized chain alone
//! - Candidate sources, JSON persistence and a CLI
//!
//! # Example
//!
//! ```rust
//! use lucky_chain::core::{validate_chain, DifficultyParams, RawCandidate};
//! use lucky_chain::mining::{Miner, MiningOptions};
//!
//! let params = DifficultyParams::new(0x207fffff, 600, 20).unwrap();
//! let miner = Miner::new(MiningOptions {
//!     params,
//!     ..Default::default()
//! });
//!
//! let candidates = (0..50i64).map(|i| {
//!     RawCandidate::new("demo/repo", &format!("commit-{:06x}", i), 1_700_000_000 + i * 60)
//! });
//! let (blockchain, stats) = miner.build_chain(candidates).unwrap();
//!
//! println!("{} lucky blocks from {} candidates", stats.blocks, stats.candidates);
//! assert!(validate_chain(blockchain.blocks(), &params).is_ok());
//! ```

pub mod cli;
pub mod core;
pub mod crypto;
pub mod mining;
pub mod storage;

// Re-export commonly used types
pub use crate::core::{
    validate_chain, Block, Blockchain, Candidate, ChainIntegrityError, DifficultyParams,
    RawCandidate, DEFAULT_POW_LIMIT_BITS, DIFFICULTY_ADJUSTMENT_INTERVAL, TARGET_SPACING_SECONDS,
};
pub use crate::mining::{CandidateSource, Miner, MiningOptions, MiningStats};
pub use crate::storage::{ChainDocument, StorageError};
