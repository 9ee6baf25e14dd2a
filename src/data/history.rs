//! Recent-form and head-to-head samples for one team.
//!
//! History is best-effort: every failure degrades to an empty sample.

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use crate::config::HistoryConfig;
use crate::data::football_data::TeamMatchesQuery;
use crate::data::{FallbackSource, MatchSample, PrimarySource, ProviderError, Venue};

/// Inclusive date range for finished matches: `lookback_days` back, ending yesterday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl HistoryWindow {
    pub fn ending_before(today: NaiveDate, lookback_days: u32) -> Self {
        Self {
            from: today - Duration::days(i64::from(lookback_days)),
            to: today - Duration::days(1),
        }
    }
}

pub struct HistoryProvider {
    primary: Arc<dyn PrimarySource>,
    fallback: Option<Arc<dyn FallbackSource>>,
    window: HistoryWindow,
    page_size: u32,
    sample_size: usize,
}

impl HistoryProvider {
    pub fn new(
        primary: Arc<dyn PrimarySource>,
        fallback: Option<Arc<dyn FallbackSource>>,
        config: &HistoryConfig,
        today: NaiveDate,
    ) -> Self {
        Self {
            primary,
            fallback,
            window: HistoryWindow::ending_before(today, config.lookback_days),
            page_size: config.page_size,
            sample_size: config.sample_size,
        }
    }

    /// Last matches of `team_id` at `venue`, optionally only those against `opponent`.
    pub async fn fetch(&self, team_id: u64, venue: Venue, opponent: Option<u64>) -> MatchSample {
        let query = TeamMatchesQuery {
            team_id,
            date_from: self.window.from,
            date_to: self.window.to,
            limit: self.page_size,
        };

        match self.primary.team_matches(&query).await {
            Ok(mut records) if !records.is_empty() => {
                records.sort_by_key(|r| Reverse(r.kickoff()));
                let matches = records
                    .iter()
                    .filter_map(|r| r.to_historical(team_id))
                    .filter(|m| m.venue == venue)
                    .filter(|m| opponent.map_or(true, |o| m.involves(o)))
                    .collect();
                MatchSample::new(matches, self.sample_size)
            }
            Ok(_) => {
                debug!(team_id, %venue, "Primary history empty, trying fallback");
                self.fetch_fallback(team_id, venue).await
            }
            Err(ProviderError::RateLimited { .. }) => {
                warn!(team_id, %venue, "Primary history rate limited, using empty sample");
                MatchSample::empty()
            }
            Err(e) => {
                warn!(team_id, %venue, error = %e, "Primary history failed, trying fallback");
                self.fetch_fallback(team_id, venue).await
            }
        }
    }

    /// Secondary provider filtered by venue on its side. Opponent filtering is not reapplied.
    async fn fetch_fallback(&self, team_id: u64, venue: Venue) -> MatchSample {
        let Some(fallback) = &self.fallback else {
            return MatchSample::empty();
        };

        match fallback.team_fixtures(team_id, venue, self.sample_size).await {
            Ok(records) => {
                let matches = records
                    .iter()
                    .filter_map(|r| r.to_historical(team_id))
                    .collect();
                MatchSample::new(matches, self.sample_size)
            }
            Err(e) => {
                warn!(team_id, %venue, error = %e, "Fallback history failed, using empty sample");
                MatchSample::empty()
            }
        }
    }
}
