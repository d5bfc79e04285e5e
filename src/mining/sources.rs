//! Candidate sources
//!
//! Supplies raw candidate records to the builder. Records stay untyped here;
//! normalization happens in the builder.

use crate::core::RawCandidate;
use crate::mining::github::{GithubClient, GithubConfig, RepoSlug, PUBLIC_EVENTS_SOURCE};
use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Source tag of generated candidates
pub const SYNTHETIC_SOURCE: &str = "synthetic";

/// Source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid candidate file: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid source options: {0}")]
    InvalidOptions(String),
}

/// Settings for generated candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticConfig {
    pub repo: String,
    pub count: usize,
    /// Timestamp of the first candidate
    pub start_time: i64,
    /// Seconds between consecutive candidates
    pub spacing_seconds: i64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            repo: "demo/repo".to_string(),
            count: 250,
            start_time: 1_700_000_000,
            spacing_seconds: 60,
        }
    }
}

/// Where candidates come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    /// JSON array of candidate records
    File(PathBuf),
    /// Deterministic generated commits
    Synthetic(SyntheticConfig),
    /// Push events from the public GitHub timeline
    PublicEvents(GithubConfig),
    /// Commit history of one GitHub repository
    Repo { slug: RepoSlug, github: GithubConfig },
}

/// Raw candidates plus the label recorded in the chain document
#[derive(Debug, Clone)]
pub struct CandidateBatch {
    pub source: String,
    pub candidates: Vec<RawCandidate>,
}

impl CandidateSource {
    /// Label stored as the document's `source`
    pub fn label(&self) -> String {
        match self {
            CandidateSource::File(path) => format!("file:{}", path.display()),
            CandidateSource::Synthetic(config) => format!("{}:{}", SYNTHETIC_SOURCE, config.repo),
            CandidateSource::PublicEvents(_) => PUBLIC_EVENTS_SOURCE.to_string(),
            CandidateSource::Repo { slug, .. } => format!("repo:{}", slug),
        }
    }

    /// Load all raw candidates from this source
    pub fn load(&self) -> Result<CandidateBatch, SourceError> {
        let candidates = match self {
            CandidateSource::File(path) => load_candidates_file(path)?,
            CandidateSource::Synthetic(config) => synthetic_candidates(config)?,
            CandidateSource::PublicEvents(github) => {
                GithubClient::new(github.clone())?.public_event_candidates()?
            }
            CandidateSource::Repo { slug, github } => {
                GithubClient::new(github.clone())?.repo_commit_candidates(slug)?
            }
        };

        log::info!("Loaded {} raw candidates from {}", candidates.len(), self.label());

        Ok(CandidateBatch {
            source: self.label(),
            candidates,
        })
    }
}

/// Read a JSON array of candidate records
pub fn load_candidates_file(path: &Path) -> Result<Vec<RawCandidate>, SourceError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Generate `count` commits on one repo at a fixed spacing
pub fn synthetic_candidates(config: &SyntheticConfig) -> Result<Vec<RawCandidate>, SourceError> {
    if config.repo.is_empty() {
        return Err(SourceError::InvalidOptions(
            "synthetic source needs a repo".to_string(),
        ));
    }

    let candidates = (0..config.count)
        .map(|index| {
            let offset = (index as i64).saturating_mul(config.spacing_seconds);
            let mut raw = RawCandidate::new(
                &config.repo,
                &format!("commit-{:06x}", index),
                config.start_time.saturating_add(offset),
            );
            raw.source = Some(SYNTHETIC_SOURCE.to_string());
            raw.author_name = Some(format!("author-{}", index));
            raw
        })
        .collect();

    Ok(candidates)
}
