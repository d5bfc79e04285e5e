//! Candidate events
//!
//! Raw commit records arrive untyped from a source; normalization turns
//! them into immutable [`Candidate`]s, which are then deduplicated and put
//! into the canonical processing order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Source tag used when a record does not name one
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Candidate normalization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CandidateError {
    #[error("Candidate is missing a repo")]
    MissingRepo,
    #[error("Candidate is missing a sha")]
    MissingSha,
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// A timestamp as supplied by a source: epoch seconds or a date/time string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Seconds(f64),
    Text(String),
}

impl RawTimestamp {
    /// Convert to whole unix seconds
    pub fn to_unix_seconds(&self) -> Result<i64, CandidateError> {
        match self {
            RawTimestamp::Seconds(value) => {
                let floored = value.floor();
                // i64::MIN is exactly -2^63; i64::MAX rounds up to 2^63
                if floored >= i64::MIN as f64 && floored < i64::MAX as f64 {
                    Ok(floored as i64)
                } else {
                    Err(CandidateError::InvalidTimestamp(value.to_string()))
                }
            }
            RawTimestamp::Text(text) => parse_timestamp(text)
                .ok_or_else(|| CandidateError::InvalidTimestamp(text.clone())),
        }
    }
}

impl From<i64> for RawTimestamp {
    fn from(seconds: i64) -> Self {
        RawTimestamp::Seconds(seconds as f64)
    }
}

impl From<&str> for RawTimestamp {
    fn from(text: &str) -> Self {
        RawTimestamp::Text(text.to_string())
    }
}

/// Parse a date/time string into unix seconds.
///
/// Accepts RFC 3339, RFC 2822, and offset-less ISO forms (read as UTC).
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.timestamp());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp())
}

/// An unvalidated candidate record as read from a source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RawCandidate {
    /// Minimal record with just the identity fields
    pub fn new(repo: &str, sha: &str, timestamp: impl Into<RawTimestamp>) -> Self {
        Self {
            repo: Some(repo.to_string()),
            sha: Some(sha.to_string()),
            timestamp: Some(timestamp.into()),
            ..Default::default()
        }
    }
}

/// Empty strings count as absent
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// A normalized candidate, eligible for chain inclusion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    source: String,
    repo: String,
    sha: String,
    timestamp: i64,
    author_name: Option<String>,
    author_email: Option<String>,
    author_login: Option<String>,
    message: Option<String>,
}

impl TryFrom<RawCandidate> for Candidate {
    type Error = CandidateError;

    fn try_from(raw: RawCandidate) -> Result<Self, Self::Error> {
        let repo = non_empty(raw.repo).ok_or(CandidateError::MissingRepo)?;
        let sha = non_empty(raw.sha).ok_or(CandidateError::MissingSha)?;
        let timestamp = raw
            .timestamp
            .ok_or_else(|| CandidateError::InvalidTimestamp("missing".to_string()))?
            .to_unix_seconds()?;

        Ok(Self {
            source: non_empty(raw.source).unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            repo,
            sha,
            timestamp,
            author_name: non_empty(raw.author_name),
            author_email: non_empty(raw.author_email),
            author_login: non_empty(raw.author_login),
            message: non_empty(raw.message),
        })
    }
}

impl Candidate {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn sha(&self) -> &str {
        &self.sha
    }

    /// Unix seconds
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn author_name(&self) -> Option<&str> {
        self.author_name.as_deref()
    }

    pub fn author_email(&self) -> Option<&str> {
        self.author_email.as_deref()
    }

    pub fn author_login(&self) -> Option<&str> {
        self.author_login.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Normalize a batch, dropping records that cannot become candidates.
///
/// Missing identity fields are filtered quietly; bad timestamps are logged.
pub fn normalize_all<I>(raw_candidates: I) -> Vec<Candidate>
where
    I: IntoIterator<Item = RawCandidate>,
{
    raw_candidates
        .into_iter()
        .filter_map(|raw| match Candidate::try_from(raw) {
            Ok(candidate) => Some(candidate),
            Err(err @ CandidateError::InvalidTimestamp(_)) => {
                warn!("Skipping candidate: {}", err);
                None
            }
            Err(err) => {
                debug!("Dropping candidate: {}", err);
                None
            }
        })
        .collect()
}

/// Collapse duplicates and return candidates in canonical order.
///
/// Identity is `(repo, sha, timestamp)` and the last occurrence wins. The
/// map key puts the timestamp first, so iteration yields the processing
/// order: timestamp, then repo, then sha, all ascending.
pub fn dedupe_and_order(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut by_identity: BTreeMap<(i64, String, String), Candidate> = BTreeMap::new();

    for candidate in candidates {
        let key = (
            candidate.timestamp,
            candidate.repo.clone(),
            candidate.sha.clone(),
        );
        by_identity.insert(key, candidate);
    }

    by_identity.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(repo: &str, sha: &str, timestamp: i64) -> RawCandidate {
        RawCandidate::new(repo, sha, timestamp)
    }

    #[test]
    fn test_normalize_defaults() {
        let candidate = Candidate::try_from(raw("demo/repo", "abc", 1_700_000_000)).unwrap();

        assert_eq!(candidate.source(), UNKNOWN_SOURCE);
        assert_eq!(candidate.repo(), "demo/repo");
        assert_eq!(candidate.sha(), "abc");
        assert_eq!(candidate.timestamp(), 1_700_000_000);
        assert_eq!(candidate.author_name(), None);
        assert_eq!(candidate.message(), None);
    }

    #[test]
    fn test_normalize_empty_strings_are_absent() {
        let mut record = raw("demo/repo", "abc", 10);
        record.source = Some(String::new());
        record.author_login = Some(String::new());

        let candidate = Candidate::try_from(record).unwrap();
        assert_eq!(candidate.source(), UNKNOWN_SOURCE);
        assert_eq!(candidate.author_login(), None);
    }

    #[test]
    fn test_normalize_missing_identity() {
        let mut record = raw("demo/repo", "abc", 10);
        record.repo = None;
        assert_eq!(Candidate::try_from(record), Err(CandidateError::MissingRepo));

        let mut record = raw("demo/repo", "abc", 10);
        record.sha = Some(String::new());
        assert_eq!(Candidate::try_from(record), Err(CandidateError::MissingSha));
    }

    #[test]
    fn test_timestamp_parsing() {
        assert_eq!(RawTimestamp::Seconds(1_700_000_000.9).to_unix_seconds(), Ok(1_700_000_000));
        assert_eq!(
            RawTimestamp::from("2023-11-14T22:13:20Z").to_unix_seconds(),
            Ok(1_700_000_000)
        );
        assert_eq!(
            RawTimestamp::from("2023-11-14T23:13:20.000+01:00").to_unix_seconds(),
            Ok(1_700_000_000)
        );
        assert_eq!(
            RawTimestamp::from("Tue, 14 Nov 2023 22:13:20 +0000").to_unix_seconds(),
            Ok(1_700_000_000)
        );
        assert_eq!(
            RawTimestamp::from("2023-11-14T22:13:20").to_unix_seconds(),
            Ok(1_700_000_000)
        );
        assert_eq!(RawTimestamp::from("1970-01-02").to_unix_seconds(), Ok(86_400));
    }

    #[test]
    fn test_invalid_timestamp() {
        assert_eq!(
            RawTimestamp::from("yesterday-ish").to_unix_seconds(),
            Err(CandidateError::InvalidTimestamp("yesterday-ish".to_string()))
        );
        assert!(RawTimestamp::Seconds(f64::NAN).to_unix_seconds().is_err());
        assert!(RawTimestamp::Seconds(f64::INFINITY).to_unix_seconds().is_err());
        assert!(RawTimestamp::Seconds(-1e300).to_unix_seconds().is_err());
        assert!(RawTimestamp::Seconds(1e19).to_unix_seconds().is_err());
        assert_eq!(
            RawTimestamp::Seconds(-9_223_372_036_854_775_808.0).to_unix_seconds(),
            Ok(i64::MIN)
        );

        let mut record = raw("demo/repo", "abc", 0);
        record.timestamp = None;
        assert!(matches!(
            Candidate::try_from(record),
            Err(CandidateError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_normalize_all_filters() {
        let mut no_sha = raw("demo/repo", "abc", 10);
        no_sha.sha = None;
        let mut bad_time = raw("demo/repo", "def", 10);
        bad_time.timestamp = Some(RawTimestamp::from("not a date"));

        let candidates = normalize_all(vec![raw("demo/repo", "ok", 10), no_sha, bad_time]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].sha(), "ok");
    }

    #[test]
    fn test_dedupe_keeps_last() {
        let mut first = raw("demo/repo", "abc", 10);
        first.message = Some("first".to_string());
        let mut second = raw("demo/repo", "abc", 10);
        second.message = Some("second".to_string());

        let ordered = dedupe_and_order(normalize_all(vec![first, second]));
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].message(), Some("second"));
    }

    #[test]
    fn test_same_sha_different_time_is_distinct() {
        let ordered = dedupe_and_order(normalize_all(vec![
            raw("demo/repo", "abc", 10),
            raw("demo/repo", "abc", 11),
        ]));
        assert_eq!(ordered.len(), 2);
    }

    #[test]
    fn test_canonical_order() {
        let ordered = dedupe_and_order(normalize_all(vec![
            raw("b/repo", "2", 20),
            raw("b/repo", "1", 10),
            raw("a/repo", "9", 10),
            raw("a/repo", "3", 10),
        ]));

        let keys: Vec<(i64, &str, &str)> = ordered
            .iter()
            .map(|c| (c.timestamp(), c.repo(), c.sha()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (10, "a/repo", "3"),
                (10, "a/repo", "9"),
                (10, "b/repo", "1"),
                (20, "b/repo", "2"),
            ]
        );
    }

    #[test]
    fn test_raw_candidate_from_json() {
        let json = r#"[
            {"repo": "demo/repo", "sha": "a1", "timestamp": 1700000000, "eventId": "42"},
            {"source": "public-events", "repo": "demo/repo", "sha": "a2",
             "timestamp": "2023-11-14T22:13:20Z", "authorLogin": "octocat"}
        ]"#;

        let records: Vec<RawCandidate> = serde_json::from_str(json).unwrap();
        let candidates = normalize_all(records);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].source(), "public-events");
        assert_eq!(candidates[1].timestamp(), 1_700_000_000);
        assert_eq!(candidates[1].author_login(), Some("octocat"));
    }
}
