//! Chain builder
//!
//! Folds an ordered candidate list into a chain. Each attempt depends on the
//! whole chain built so far, so candidates are processed strictly in order.

use crate::core::{
    dedupe_and_order, normalize_all, Blockchain, Candidate, ConfigError, DifficultyParams,
    RawCandidate,
};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Mining statistics, persisted with the chain document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningStats {
    /// Candidates left after normalization and dedup
    pub candidates: usize,
    /// Blocks found, genesis excluded
    pub blocks: usize,
}

/// Options for a chain build
#[derive(Debug, Clone, Default)]
pub struct MiningOptions {
    pub params: DifficultyParams,
    /// Explicit genesis time; otherwise derived from the first candidate
    pub genesis_time: Option<i64>,
    /// Stop once this many blocks are found (0 means no limit)
    pub max_blocks: Option<usize>,
}

/// Builds chains from candidate lists
pub struct Miner {
    options: MiningOptions,
}

impl Miner {
    /// Create a new miner
    pub fn new(options: MiningOptions) -> Self {
        Self { options }
    }

    /// Normalize, dedupe and order raw candidates, then build the chain
    pub fn build_chain<I>(&self, raw_candidates: I) -> Result<(Blockchain, MiningStats), ConfigError>
    where
        I: IntoIterator<Item = RawCandidate>,
    {
        let ordered = dedupe_and_order(normalize_all(raw_candidates));
        self.build_from_ordered(&ordered)
    }

    /// Build the chain from candidates already in canonical order
    pub fn build_from_ordered(
        &self,
        ordered: &[Candidate],
    ) -> Result<(Blockchain, MiningStats), ConfigError> {
        let params = self.options.params;
        params.validate()?;

        let start = Instant::now();
        let genesis_time = self.genesis_time(ordered);
        let max_blocks = self.options.max_blocks.filter(|&max| max > 0);

        info!(
            "Building chain from {} candidates (pow limit {:08x}, interval {}, spacing {}s)",
            ordered.len(),
            params.pow_limit_bits,
            params.difficulty_adjustment_interval,
            params.target_spacing_seconds
        );

        let mut blockchain = Blockchain::new(params, genesis_time);

        for candidate in ordered {
            if blockchain.try_append(candidate).is_none() {
                continue;
            }

            if max_blocks.is_some_and(|max| blockchain.lucky_blocks().len() >= max) {
                info!("Reached maximum of {} blocks", blockchain.lucky_blocks().len());
                break;
            }
        }

        let stats = MiningStats {
            candidates: ordered.len(),
            blocks: blockchain.lucky_blocks().len(),
        };

        info!(
            "Found {} lucky blocks among {} candidates in {}ms",
            stats.blocks,
            stats.candidates,
            start.elapsed().as_millis()
        );

        Ok((blockchain, stats))
    }

    /// Genesis sits one target spacing before the first candidate.
    ///
    /// With no candidates and no override this falls back to the clock,
    /// the only non-deterministic input to a build.
    fn genesis_time(&self, ordered: &[Candidate]) -> i64 {
        if let Some(time) = self.options.genesis_time {
            return time;
        }

        let anchor = ordered
            .first()
            .map(Candidate::timestamp)
            .unwrap_or_else(|| Utc::now().timestamp());
        anchor.saturating_sub(self.options.params.target_spacing_seconds)
    }
}
