//! Lucky-Chain CLI Application
//!
//! Builds a proof-of-work chain from commit candidates, validates saved
//! chains and lists their lucky commits.

use clap::{Parser, Subcommand, ValueEnum};
use lucky_chain::cli::{self, CliResult, MineCommand, DEFAULT_WINNER_COUNT};
use lucky_chain::core::{parse_bits, DifficultyParams};
use lucky_chain::mining::{CandidateSource, GithubConfig, MiningOptions, RepoSlug, SyntheticConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "luckychain")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Turn commits into a Bitcoin-style proof-of-work chain", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// JSON array of candidate records
    File,
    /// Deterministic generated commits
    Synthetic,
    /// Push events from the public GitHub timeline
    PublicEvents,
    /// Commit history of one GitHub repository (needs --repo)
    Repo,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a chain from candidates and write it to disk
    Mine {
        /// Where candidates come from
        #[arg(long, value_enum, default_value = "synthetic")]
        source: SourceKind,

        /// Candidate file (required with --source file)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Repository as owner/name (synthetic commits default to demo/repo)
        #[arg(long)]
        repo: Option<String>,

        /// Maximum number of GitHub API pages to request
        #[arg(long, default_value = "3")]
        pages: u32,

        /// Items per GitHub API page
        #[arg(long, default_value = "100")]
        per_page: u32,

        /// Number of synthetic commits
        #[arg(long, default_value = "250")]
        count: usize,

        /// Time of the first synthetic commit (epoch seconds or date)
        #[arg(long, value_parser = cli::parse_time_arg, default_value = "1700000000")]
        start_time: i64,

        /// Seconds between synthetic commits
        #[arg(long, default_value = "60")]
        spacing: i64,

        /// Keep only the first N raw candidates
        #[arg(long)]
        max_candidates: Option<usize>,

        /// Stop after N lucky blocks (0 means no limit)
        #[arg(long)]
        max_blocks: Option<usize>,

        /// Easiest allowed target as compact bits (hex)
        #[arg(long, value_parser = parse_bits, default_value = "1f00ffff")]
        pow_limit_bits: u32,

        /// Target seconds between blocks
        #[arg(long, default_value = "600")]
        target_spacing_seconds: i64,

        /// Blocks per difficulty epoch
        #[arg(long, default_value = "2016")]
        difficulty_adjustment_interval: u64,

        /// Genesis time override (epoch seconds or date)
        #[arg(long, value_parser = cli::parse_time_arg)]
        genesis_time: Option<i64>,

        /// Output file path
        #[arg(short, long, default_value = "chain.json")]
        out: PathBuf,
    },

    /// Validate a saved chain
    Validate {
        /// Chain document path
        #[arg(long = "in", default_value = "chain.json")]
        input: PathBuf,
    },

    /// List the first lucky commits of a saved chain
    Winners {
        /// Chain document path
        #[arg(long = "in", default_value = "chain.json")]
        input: PathBuf,

        /// Number of winners to show
        #[arg(short, long, default_value_t = DEFAULT_WINNER_COUNT)]
        count: usize,
    },
}

fn run(command: Commands) -> CliResult<()> {
    match command {
        Commands::Mine {
            source,
            input,
            repo,
            pages,
            per_page,
            count,
            start_time,
            spacing,
            max_candidates,
            max_blocks,
            pow_limit_bits,
            target_spacing_seconds,
            difficulty_adjustment_interval,
            genesis_time,
            out,
        } => {
            let github = GithubConfig {
                token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
                pages,
                per_page,
                ..Default::default()
            };

            let source = match source {
                SourceKind::File => {
                    let path = input.ok_or("--input is required with --source file")?;
                    CandidateSource::File(path)
                }
                SourceKind::Synthetic => CandidateSource::Synthetic(SyntheticConfig {
                    repo: repo.unwrap_or_else(|| SyntheticConfig::default().repo),
                    count,
                    start_time,
                    spacing_seconds: spacing,
                }),
                SourceKind::PublicEvents => CandidateSource::PublicEvents(github),
                SourceKind::Repo => {
                    let repo = repo.ok_or("--repo owner/name is required with --source repo")?;
                    CandidateSource::Repo {
                        slug: RepoSlug::parse(&repo)?,
                        github,
                    }
                }
            };

            let params = DifficultyParams::new(
                pow_limit_bits,
                target_spacing_seconds,
                difficulty_adjustment_interval,
            )?;

            cli::cmd_mine(&MineCommand {
                source,
                max_candidates,
                mining: MiningOptions {
                    params,
                    genesis_time,
                    max_blocks,
                },
                out,
            })
        }
        Commands::Validate { input } => cli::cmd_validate(&input),
        Commands::Winners { input, count } => cli::cmd_winners(&input, count),
    }
}

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
