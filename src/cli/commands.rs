//! CLI commands for the chain
//!
//! Implements the command handlers for the CLI interface.

use crate::core::{format_bits, Block, Blockchain, CandidateError, RawTimestamp};
use crate::mining::{CandidateSource, Miner, MiningOptions};
use crate::storage::{load_from_file, save_to_file, ChainDocument};
use chrono::{TimeZone, Utc};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Number of winners printed after mining
pub const DEFAULT_WINNER_COUNT: usize = 10;

/// Everything the `mine` command needs
#[derive(Debug, Clone)]
pub struct MineCommand {
    pub source: CandidateSource,
    /// Keep only the first N raw candidates
    pub max_candidates: Option<usize>,
    pub mining: MiningOptions,
    pub out: PathBuf,
}

/// Parse a time argument: epoch seconds or a date/time string
pub fn parse_time_arg(value: &str) -> Result<i64, CandidateError> {
    let raw = match value.trim().parse::<i64>() {
        Ok(seconds) => RawTimestamp::from(seconds),
        Err(_) => RawTimestamp::from(value),
    };
    raw.to_unix_seconds()
}

fn format_time(time: i64) -> String {
    Utc.timestamp_opt(time, 0)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| time.to_string())
}

fn short(hash: &str, len: usize) -> &str {
    hash.get(..len).unwrap_or(hash)
}

/// Build, validate and write a chain
pub fn cmd_mine(command: &MineCommand) -> CliResult<()> {
    let batch = command.source.load()?;
    let mut candidates = batch.candidates;
    if let Some(max) = command.max_candidates {
        candidates.truncate(max);
    }

    println!("⛏️  Mining from {} ({} raw candidates)", batch.source, candidates.len());

    let miner = Miner::new(command.mining.clone());
    let (blockchain, stats) = miner.build_chain(candidates)?;

    // Never write a chain that does not replay
    blockchain.validate()?;

    let document = ChainDocument::new(
        batch.source,
        blockchain.params(),
        stats,
        blockchain.blocks().to_vec(),
    );
    save_to_file(&document, &command.out)?;

    println!("   ├─ Candidates considered: {}", stats.candidates);
    println!("   ├─ Lucky blocks found: {}", stats.blocks);
    println!("   └─ Wrote chain to {:?}", command.out);

    print_top_winners(&blockchain, DEFAULT_WINNER_COUNT);

    Ok(())
}

/// Validate a chain document against its embedded config
pub fn cmd_validate(path: &Path) -> CliResult<()> {
    println!("🔍 Validating chain {:?}...", path);

    let document = load_from_file(path)?;
    let params = document.params()?;
    let blockchain = Blockchain::from_blocks(document.chain, params)?;

    println!("✅ Chain is valid!");
    println!("   {} blocks verified", blockchain.len());

    Ok(())
}

/// Print the first lucky blocks of a chain document
pub fn cmd_winners(path: &Path, count: usize) -> CliResult<()> {
    let document = load_from_file(path)?;
    let params = document.params()?;
    let blockchain = Blockchain::from_blocks(document.chain, params)?;

    print_top_winners(&blockchain, count);

    Ok(())
}

fn print_top_winners(blockchain: &Blockchain, count: usize) {
    let winners: Vec<&Block> = blockchain.lucky_blocks().iter().take(count).collect();
    if winners.is_empty() {
        println!("📭 No lucky commits found in this sample.");
        return;
    }

    println!("🏆 Top lucky commits:");
    for block in winners {
        println!(
            "   #{} {} {} winner={} time={} bits={}",
            block.height,
            block.repo,
            short(&block.commit_sha, 12),
            block.winner_label(),
            format_time(block.time),
            format_bits(block.bits)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChainIntegrityError, DifficultyParams};
    use crate::mining::SyntheticConfig;

    fn mine_command(out: PathBuf) -> MineCommand {
        MineCommand {
            source: CandidateSource::Synthetic(SyntheticConfig {
                count: 60,
                ..Default::default()
            }),
            max_candidates: None,
            mining: MiningOptions {
                params: DifficultyParams::new(0x207fffff, 600, 20).unwrap(),
                ..Default::default()
            },
            out,
        }
    }

    #[test]
    fn test_parse_time_arg() {
        assert_eq!(parse_time_arg("1700000000"), Ok(1_700_000_000));
        assert_eq!(parse_time_arg("2023-11-14T22:13:20Z"), Ok(1_700_000_000));
        assert!(parse_time_arg("soon").is_err());
    }

    #[test]
    fn test_mine_then_validate() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out = temp_dir.path().join("chain.json");

        cmd_mine(&mine_command(out.clone())).unwrap();
        cmd_validate(&out).unwrap();
        cmd_winners(&out, 3).unwrap();

        let document = load_from_file(&out).unwrap();
        assert_eq!(document.stats.candidates, 60);
        assert_eq!(document.chain.len(), document.stats.blocks + 1);
        assert_eq!(document.config.pow_limit_bits, "207fffff");
    }

    #[test]
    fn test_max_candidates_truncates_raw_list() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out = temp_dir.path().join("chain.json");
        let mut command = mine_command(out.clone());
        command.max_candidates = Some(7);

        cmd_mine(&command).unwrap();

        assert_eq!(load_from_file(&out).unwrap().stats.candidates, 7);
    }

    #[test]
    fn test_validate_rejects_tampered_document() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out = temp_dir.path().join("chain.json");
        cmd_mine(&mine_command(out.clone())).unwrap();

        let mut document = load_from_file(&out).unwrap();
        document.chain[0].time += 1;
        save_to_file(&document, &out).unwrap();

        let err = cmd_validate(&out).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ChainIntegrityError>(),
            Some(&ChainIntegrityError::CandidateHashMismatch(0))
        );
    }

    #[test]
    fn test_validate_uses_embedded_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out = temp_dir.path().join("chain.json");
        cmd_mine(&mine_command(out.clone())).unwrap();

        let mut document = load_from_file(&out).unwrap();
        document.config.pow_limit_bits = "1f00ffff".to_string();
        save_to_file(&document, &out).unwrap();

        assert!(cmd_validate(&out).is_err());
    }
}
