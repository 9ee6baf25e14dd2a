//! Finds which days in the forward window actually have fixtures.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{League, ProviderConfig};
use crate::data::{PrimarySource, ProviderError};

pub struct DateDiscovery {
    source: Arc<dyn PrimarySource>,
    leagues: Vec<League>,
    provider: ProviderConfig,
    clock: Arc<dyn Clock>,
}

impl DateDiscovery {
    pub fn new(
        source: Arc<dyn PrimarySource>,
        leagues: Vec<League>,
        provider: ProviderConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            leagues,
            provider,
            clock,
        }
    }

    /// Days in `[today, today + window_days)` with at least one match, ascending.
    /// Falls back to `[today]` when nothing is found.
    pub async fn find_upcoming_dates(&self, today: NaiveDate, window_days: u32) -> Vec<NaiveDate> {
        let mut dates = Vec::new();

        for offset in 0..window_days {
            let date = today + Duration::days(i64::from(offset));
            if self.date_has_matches(date).await {
                dates.push(date);
            }
        }

        if dates.is_empty() {
            warn!(%today, window_days, "No fixtures found in window, scanning today only");
            dates.push(today);
        }

        info!(dates = dates.len(), "Upcoming dates discovered");
        dates
    }

    async fn date_has_matches(&self, date: NaiveDate) -> bool {
        for league in &self.leagues {
            match self.source.has_matches(date, &league.code).await {
                Ok(true) => {
                    debug!(%date, league = %league.code, "Date has fixtures");
                    return true;
                }
                Ok(false) => {}
                Err(ProviderError::RateLimited { retry_after }) => {
                    let wait = self.provider.retry_delay(retry_after);
                    warn!(%date, league = %league.code, wait_s = wait.as_secs(), "Rate limited during probe");
                    self.clock.sleep(wait).await;
                }
                Err(ProviderError::AccessDenied) => {
                    warn!(%date, league = %league.code, "Access denied during probe, skipping remaining leagues");
                    return false;
                }
                Err(e) => {
                    debug!(%date, league = %league.code, error = %e, "Probe failed");
                }
            }
        }
        false
    }
}
