//! GitHub candidate sources
//!
//! Two paginated REST feeds: public push events (`GET /events`) and the
//! commit history of one repository (`GET /repos/{owner}/{repo}/commits`).
//! Responses are mapped to raw candidate records; parsing and dedup happen
//! in the builder like for every other source.

use crate::core::RawCandidate;
use crate::mining::sources::SourceError;
use log::{debug, info};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Public GitHub REST endpoint
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// REST API version sent with every request
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Source tag of candidates taken from public push events
pub const PUBLIC_EVENTS_SOURCE: &str = "public-events";

const USER_AGENT: &str = concat!("luckychain/", env!("CARGO_PKG_VERSION"));

/// Paging and auth settings shared by the GitHub sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubConfig {
    pub api_url: String,
    /// Optional token (PAT or app installation token)
    pub token: Option<String>,
    /// Maximum number of pages to request
    pub pages: u32,
    pub per_page: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: GITHUB_API_URL.to_string(),
            token: None,
            pages: 3,
            per_page: 100,
        }
    }
}

/// A `owner/name` repository slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    /// Parse `owner/name`; both halves must be present
    pub fn parse(value: &str) -> Result<Self, SourceError> {
        let invalid = || {
            SourceError::InvalidOptions(format!("expected a repo as owner/name, got {:?}", value))
        };
        let (owner, name) = value.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubActor {
    pub login: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubEventRepo {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubPerson {
    pub name: Option<String>,
    pub email: Option<String>,
    /// ISO 8601; only present on git signatures
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubPushCommit {
    pub sha: Option<String>,
    pub message: Option<String>,
    pub author: Option<GithubPerson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubPushPayload {
    #[serde(default)]
    pub commits: Vec<GithubPushCommit>,
    pub head: Option<String>,
}

/// One entry of `GET /events`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubEvent {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub created_at: Option<String>,
    pub repo: Option<GithubEventRepo>,
    pub actor: Option<GithubActor>,
    pub payload: Option<GithubPushPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubCommitDetail {
    pub author: Option<GithubPerson>,
    pub committer: Option<GithubPerson>,
    pub message: Option<String>,
}

/// One entry of `GET /repos/{owner}/{repo}/commits`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubCommit {
    pub sha: Option<String>,
    pub commit: Option<GithubCommitDetail>,
    /// The linked GitHub account, if any
    pub author: Option<GithubActor>,
}

/// Candidates carried by a push event.
///
/// Every listed commit becomes a candidate stamped with the event time; an
/// event without a commit list falls back to its `head` sha. Other event
/// types yield nothing.
pub fn event_candidates(event: &GithubEvent) -> Vec<RawCandidate> {
    if event.kind.as_deref() != Some("PushEvent") {
        return Vec::new();
    }

    let repo = event.repo.as_ref().and_then(|r| r.name.clone());
    let login = event.actor.as_ref().and_then(|a| a.login.clone());
    let base = RawCandidate {
        source: Some(PUBLIC_EVENTS_SOURCE.to_string()),
        repo,
        timestamp: event.created_at.as_deref().map(Into::into),
        author_login: login,
        ..Default::default()
    };

    let Some(payload) = &event.payload else {
        return Vec::new();
    };

    if payload.commits.is_empty() {
        return payload
            .head
            .iter()
            .map(|head| RawCandidate {
                sha: Some(head.clone()),
                ..base.clone()
            })
            .collect();
    }

    payload
        .commits
        .iter()
        .map(|commit| {
            let author = commit.author.clone().unwrap_or_default();
            RawCandidate {
                sha: commit.sha.clone(),
                author_name: author.name,
                author_email: author.email,
                message: commit.message.clone(),
                ..base.clone()
            }
        })
        .collect()
}

/// Candidate for one listed commit, timed by author date then committer date
pub fn commit_candidate(commit: &GithubCommit, slug: &RepoSlug) -> Option<RawCandidate> {
    let detail = commit.commit.clone().unwrap_or_default();
    let author = detail.author.unwrap_or_default();
    let timestamp = author
        .date
        .clone()
        .or_else(|| detail.committer.and_then(|c| c.date))?;

    Some(RawCandidate {
        source: Some(format!("repo:{}", slug)),
        repo: Some(slug.to_string()),
        sha: commit.sha.clone(),
        timestamp: Some(timestamp.as_str().into()),
        author_name: author.name,
        author_email: author.email,
        author_login: commit.author.as_ref().and_then(|a| a.login.clone()),
        message: detail.message,
    })
}

/// Request pages `1..=pages` until one comes back empty or short
pub fn paginate<T, F>(pages: u32, per_page: u32, mut fetch_page: F) -> Result<Vec<T>, SourceError>
where
    F: FnMut(u32) -> Result<Vec<T>, SourceError>,
{
    let mut items = Vec::new();

    for page in 1..=pages {
        let batch = fetch_page(page)?;
        let fetched = batch.len();
        debug!("Fetched page {} ({} items)", page, fetched);
        items.extend(batch);

        if fetched == 0 || fetched < per_page as usize {
            break;
        }
    }

    Ok(items)
}

/// Blocking GitHub REST client
pub struct GithubClient {
    client: Client,
    config: GithubConfig,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Result<Self, SourceError> {
        if config.per_page == 0 {
            return Err(SourceError::InvalidOptions(
                "per-page must be positive".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, config })
    }

    fn get_page<T: DeserializeOwned>(&self, path: &str, page: u32) -> Result<Vec<T>, SourceError> {
        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), path);
        let mut request = self
            .client
            .get(&url)
            .query(&[("page", page), ("per_page", self.config.per_page)])
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);

        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        Ok(request.send()?.error_for_status()?.json()?)
    }

    /// Push-event candidates from the public timeline
    pub fn public_event_candidates(&self) -> Result<Vec<RawCandidate>, SourceError> {
        let events: Vec<GithubEvent> =
            paginate(self.config.pages, self.config.per_page, |page| {
                self.get_page("/events", page)
            })?;

        let candidates: Vec<RawCandidate> = events.iter().flat_map(event_candidates).collect();
        info!(
            "Collected {} candidates from {} public events",
            candidates.len(),
            events.len()
        );

        Ok(candidates)
    }

    /// Commit candidates from one repository's history
    pub fn repo_commit_candidates(&self, slug: &RepoSlug) -> Result<Vec<RawCandidate>, SourceError> {
        let path = format!("/repos/{}/{}/commits", slug.owner, slug.name);
        let commits: Vec<GithubCommit> =
            paginate(self.config.pages, self.config.per_page, |page| {
                self.get_page(&path, page)
            })?;

        let candidates: Vec<RawCandidate> = commits
            .iter()
            .filter_map(|commit| commit_candidate(commit, slug))
            .collect();
        info!(
            "Collected {} candidates from {} commits of {}",
            candidates.len(),
            commits.len(),
            slug
        );

        Ok(candidates)
    }
}
