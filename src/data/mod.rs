pub mod api_football;
pub mod football_data;
pub mod history;
pub mod rate_limit;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::api_football::FixtureRecord;
use crate::data::football_data::{MatchRecord, TeamMatchesQuery};

/// Failure modes of a provider request. None of these abort a run.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("access denied")]
    AccessDenied,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("undecodable response: {0}")]
    Decode(String),
}

/// Map a provider response onto the error taxonomy, decoding the body on success.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited {
            retry_after: retry_after(response.headers()),
        }),
        StatusCode::FORBIDDEN => Err(ProviderError::AccessDenied),
        s if !s.is_success() => Err(ProviderError::Status(s.as_u16())),
        _ => {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
        }
    }
}

/// Seconds to wait from `Retry-After`, or football-data's own reset counter.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    ["retry-after", "x-requestcounter-reset"]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Where a team played, relative to that team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Home,
    Away,
}

impl Venue {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Away => "away",
        }
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled match in a tracked competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fixture {
    pub id: u64,
    pub league_name: String,
    pub competition_id: u64,
    pub home_team_id: u64,
    pub home_team: String,
    pub away_team_id: u64,
    pub away_team: String,
    pub kickoff: DateTime<Utc>,
}

/// A finished match, seen from the team whose history was queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoricalMatch {
    pub home_team_id: u64,
    pub away_team_id: u64,
    pub home_score: u32,
    pub away_score: u32,
    /// Venue of the queried team in this match.
    pub venue: Venue,
}

impl HistoricalMatch {
    /// Build from raw ids and scores; `None` when `team_id` took no part.
    pub fn new(
        team_id: u64,
        home_team_id: u64,
        away_team_id: u64,
        home_score: u32,
        away_score: u32,
    ) -> Option<Self> {
        let venue = if home_team_id == team_id {
            Venue::Home
        } else if away_team_id == team_id {
            Venue::Away
        } else {
            return None;
        };

        Some(Self {
            home_team_id,
            away_team_id,
            home_score,
            away_score,
            venue,
        })
    }

    pub fn involves(&self, team_id: u64) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }

    pub fn winner(&self) -> Option<u64> {
        use std::cmp::Ordering;
        match self.home_score.cmp(&self.away_score) {
            Ordering::Greater => Some(self.home_team_id),
            Ordering::Less => Some(self.away_team_id),
            Ordering::Equal => None,
        }
    }

    pub fn total_goals(&self) -> u32 {
        self.home_score + self.away_score
    }

    pub fn both_scored(&self) -> bool {
        self.home_score > 0 && self.away_score > 0
    }
}

/// Most-recent-first list of finished matches, never longer than its cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSample {
    matches: Vec<HistoricalMatch>,
}

impl MatchSample {
    pub fn new(mut matches: Vec<HistoricalMatch>, cap: usize) -> Self {
        matches.truncate(cap);
        Self { matches }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn matches(&self) -> &[HistoricalMatch] {
        &self.matches
    }

    pub fn count(&self, predicate: impl Fn(&HistoricalMatch) -> bool) -> usize {
        self.matches.iter().filter(|m| predicate(m)).count()
    }

    pub fn wins_for(&self, team_id: u64) -> usize {
        self.count(|m| m.winner() == Some(team_id))
    }
}

/// The primary provider: fixtures by date and team match history.
#[async_trait]
pub trait PrimarySource: Send + Sync {
    async fn matches_for_date(
        &self,
        date: NaiveDate,
        competition: &str,
    ) -> Result<Vec<MatchRecord>, ProviderError>;

    /// Minimal existence probe for a date and competition.
    async fn has_matches(&self, date: NaiveDate, competition: &str) -> Result<bool, ProviderError> {
        Ok(!self.matches_for_date(date, competition).await?.is_empty())
    }

    async fn team_matches(&self, query: &TeamMatchesQuery)
        -> Result<Vec<MatchRecord>, ProviderError>;
}

/// The secondary provider, used only when the primary history request fails.
#[async_trait]
pub trait FallbackSource: Send + Sync {
    async fn team_fixtures(
        &self,
        team_id: u64,
        venue: Venue,
        limit: usize,
    ) -> Result<Vec<FixtureRecord>, ProviderError>;
}

/// Nested `{ "id": .., "name": .. }` object shared by both providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub short_name: Option<String>,
}

impl TeamRef {
    pub fn display_name(&self) -> Option<&str> {
        self.short_name
            .as_deref()
            .or(self.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn result(home_id: u64, away_id: u64, home: u32, away: u32) -> HistoricalMatch {
        HistoricalMatch::new(home_id, home_id, away_id, home, away).unwrap()
    }

    #[test]
    fn test_venue_relative_to_queried_team() {
        let m = HistoricalMatch::new(7, 3, 7, 1, 2).unwrap();
        assert_eq!(m.venue, Venue::Away);
        assert_eq!(m.winner(), Some(7));
        assert!(HistoricalMatch::new(9, 3, 7, 1, 2).is_none());
    }

    #[test]
    fn test_draw_has_no_winner() {
        assert_eq!(result(1, 2, 1, 1).winner(), None);
    }

    #[test]
    fn test_sample_is_capped() {
        let matches = (0..8).map(|i| result(1, 10 + i, 1, 0)).collect();
        let sample = MatchSample::new(matches, 5);
        assert_eq!(sample.len(), 5);
        assert_eq!(sample.matches()[0].away_team_id, 10);
        assert_eq!(sample.wins_for(1), 5);
    }

    #[test]
    fn test_retry_after_header_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("x-requestcounter-reset", HeaderValue::from_static("42"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(42)));

        headers.insert("retry-after", HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));

        assert_eq!(retry_after(&HeaderMap::new()), None);
    }

    #[test]
    fn test_team_display_name_prefers_short_name() {
        let team = TeamRef {
            id: Some(1),
            name: Some("Arsenal FC".to_string()),
            short_name: Some("Arsenal".to_string()),
        };
        assert_eq!(team.display_name(), Some("Arsenal"));

        let blank = TeamRef {
            id: Some(1),
            name: Some("  ".to_string()),
            short_name: None,
        };
        assert_eq!(blank.display_name(), None);
    }
}
