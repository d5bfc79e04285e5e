//! Mining module: candidate sources and the chain builder

pub mod github;
pub mod miner;
pub mod sources;

pub use github::{GithubClient, GithubConfig, RepoSlug, GITHUB_API_URL, PUBLIC_EVENTS_SOURCE};
pub use miner::{Miner, MiningOptions, MiningStats};
pub use sources::{
    load_candidates_file, synthetic_candidates, CandidateBatch, CandidateSource, SourceError,
    SyntheticConfig, SYNTHETIC_SOURCE,
};
