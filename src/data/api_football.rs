//! API-Football (api-sports.io) client, the fallback history provider.
//!
//! Auth: `x-apisports-key` header.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use crate::config::ProviderConfig;
use crate::data::rate_limit::RateLimiter;
use crate::data::{decode_response, FallbackSource, HistoricalMatch, ProviderError, TeamRef, Venue};

const AUTH_HEADER: &str = "x-apisports-key";

pub struct ApiFootballClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    limiter: Arc<RateLimiter>,
}

impl ApiFootballClient {
    pub fn new(
        config: &ProviderConfig,
        api_key: SecretString,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create API-Football HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            limiter,
        })
    }
}

#[async_trait]
impl FallbackSource for ApiFootballClient {
    #[instrument(skip(self))]
    async fn team_fixtures(
        &self,
        team_id: u64,
        venue: Venue,
        limit: usize,
    ) -> Result<Vec<FixtureRecord>, ProviderError> {
        self.limiter.acquire().await;

        let response = self
            .http
            .get(format!("{}/fixtures", self.base_url))
            .header(AUTH_HEADER, self.api_key.expose_secret())
            .query(&[
                ("team", team_id.to_string()),
                ("venue", venue.as_str().to_string()),
                ("status", "FT".to_string()),
                ("last", limit.to_string()),
            ])
            .send()
            .await?;

        let body: FixturesResponse = decode_response(response).await?;
        Ok(body.response)
    }
}

// --- API-Football response types ---

#[derive(Debug, Deserialize)]
struct FixturesResponse {
    #[serde(default)]
    response: Vec<FixtureRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureRecord {
    pub teams: Option<FixtureTeams>,
    pub goals: Option<FixtureGoals>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureTeams {
    pub home: Option<TeamRef>,
    pub away: Option<TeamRef>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FixtureGoals {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

impl FixtureRecord {
    pub fn to_historical(&self, team_id: u64) -> Option<HistoricalMatch> {
        let teams = self.teams.as_ref()?;
        let goals = self.goals?;
        HistoricalMatch::new(
            team_id,
            teams.home.as_ref()?.id?,
            teams.away.as_ref()?.id?,
            goals.home?,
            goals.away?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_record_normalization() {
        let body: FixturesResponse = serde_json::from_str(
            r#"{
                "get": "fixtures",
                "results": 2,
                "response": [
                    {
                        "fixture": {"id": 1, "date": "2026-10-01T19:00:00+00:00"},
                        "teams": {"home": {"id": 33, "name": "Manchester United"},
                                  "away": {"id": 40, "name": "Liverpool"}},
                        "goals": {"home": 2, "away": 2}
                    },
                    {
                        "fixture": {"id": 2},
                        "teams": {"home": {"id": 33, "name": "Manchester United"},
                                  "away": {"id": 50, "name": "Manchester City"}},
                        "goals": {"home": null, "away": null}
                    }
                ]
            }"#,
        )
        .unwrap();

        let first = body.response[0].to_historical(33).unwrap();
        assert_eq!(first.venue, Venue::Home);
        assert!(first.both_scored());
        assert!(body.response[1].to_historical(33).is_none());
    }
}
