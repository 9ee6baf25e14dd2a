//! football-data.org v4 client (primary provider).
//!
//! Serves both the per-date fixture lists and team match history. Every
//! request goes through the provider's shared [`RateLimiter`].

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use crate::config::{League, ProviderConfig};
use crate::data::rate_limit::RateLimiter;
use crate::data::{
    decode_response, Fixture, HistoricalMatch, PrimarySource, ProviderError, TeamRef,
};

const AUTH_HEADER: &str = "X-Auth-Token";

pub struct FootballDataClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    limiter: Arc<RateLimiter>,
}

/// Finished matches of one team inside a date window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMatchesQuery {
    pub team_id: u64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub limit: u32,
}

impl FootballDataClient {
    pub fn new(
        config: &ProviderConfig,
        api_key: SecretString,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create football-data HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            limiter,
        })
    }

    async fn get_matches(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<Vec<MatchRecord>, ProviderError> {
        self.limiter.acquire().await;

        let response = self
            .http
            .get(&url)
            .header(AUTH_HEADER, self.api_key.expose_secret())
            .query(query)
            .send()
            .await?;

        let body: MatchesResponse = decode_response(response).await?;
        Ok(body.matches)
    }
}

#[async_trait]
impl PrimarySource for FootballDataClient {
    #[instrument(skip(self))]
    async fn matches_for_date(
        &self,
        date: NaiveDate,
        competition: &str,
    ) -> Result<Vec<MatchRecord>, ProviderError> {
        let url = format!("{}/matches", self.base_url);
        let day = date.format("%Y-%m-%d").to_string();
        self.get_matches(
            url,
            &[
                ("competitions", competition.to_string()),
                ("dateFrom", day.clone()),
                ("dateTo", day),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn team_matches(
        &self,
        query: &TeamMatchesQuery,
    ) -> Result<Vec<MatchRecord>, ProviderError> {
        let url = format!("{}/teams/{}/matches", self.base_url, query.team_id);
        self.get_matches(
            url,
            &[
                ("status", "FINISHED".to_string()),
                ("dateFrom", query.date_from.format("%Y-%m-%d").to_string()),
                ("dateTo", query.date_to.format("%Y-%m-%d").to_string()),
                ("limit", query.limit.to_string()),
            ],
        )
        .await
    }
}

// --- football-data.org response types ---

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    matches: Vec<MatchRecord>,
}

/// One entry of a `matches` array. Every field is optional on the wire;
/// normalization decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: Option<u64>,
    pub utc_date: Option<String>,
    pub competition: Option<CompetitionRef>,
    pub home_team: Option<TeamRef>,
    pub away_team: Option<TeamRef>,
    pub score: Option<ScoreRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompetitionRef {
    pub id: Option<u64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub full_time: Option<ScoreLine>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ScoreLine {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

impl MatchRecord {
    pub fn kickoff(&self) -> Option<DateTime<Utc>> {
        let raw = self.utc_date.as_deref()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Normalize into a [`Fixture`]. `league` fills in a missing competition.
    pub fn to_fixture(&self, league: &League) -> Option<Fixture> {
        let home = self.home_team.as_ref()?;
        let away = self.away_team.as_ref()?;
        let competition = self.competition.as_ref();

        let league_name = competition
            .and_then(|c| c.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(league.name.as_str());

        Some(Fixture {
            id: self.id?,
            league_name: league_name.to_string(),
            competition_id: competition.and_then(|c| c.id).unwrap_or(league.id),
            home_team_id: home.id?,
            home_team: home.display_name()?.to_string(),
            away_team_id: away.id?,
            away_team: away.display_name()?.to_string(),
            kickoff: self.kickoff()?,
        })
    }

    /// Normalize a finished match from `team_id`'s point of view.
    pub fn to_historical(&self, team_id: u64) -> Option<HistoricalMatch> {
        let full_time = self.score.as_ref()?.full_time?;
        HistoricalMatch::new(
            team_id,
            self.home_team.as_ref()?.id?,
            self.away_team.as_ref()?.id?,
            full_time.home?,
            full_time.away?,
        )
    }
}
