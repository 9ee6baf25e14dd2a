//! Per-date fixture list across all tracked leagues.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::config::{League, ProviderConfig};
use crate::data::{Fixture, PrimarySource, ProviderError};

pub struct FixtureCatalog {
    source: Arc<dyn PrimarySource>,
    leagues: Vec<League>,
    provider: ProviderConfig,
    clock: Arc<dyn Clock>,
    max_fixtures: usize,
}

impl FixtureCatalog {
    pub fn new(
        source: Arc<dyn PrimarySource>,
        leagues: Vec<League>,
        provider: ProviderConfig,
        clock: Arc<dyn Clock>,
        max_fixtures: usize,
    ) -> Self {
        Self {
            source,
            leagues,
            provider,
            clock,
            max_fixtures,
        }
    }

    /// Position of a competition in the league priority list; unknown sorts last.
    fn priority(&self, competition_id: u64) -> usize {
        self.leagues
            .iter()
            .position(|l| l.id == competition_id)
            .unwrap_or(usize::MAX)
    }

    #[instrument(skip(self))]
    pub async fn fetch_for_date(&self, date: NaiveDate) -> Vec<Fixture> {
        let mut fixtures = Vec::new();
        let mut seen = HashSet::new();

        'leagues: for league in &self.leagues {
            let mut retried = false;

            loop {
                match self.source.matches_for_date(date, &league.code).await {
                    Ok(records) => {
                        let total = records.len();
                        let mut kept = 0usize;
                        for record in &records {
                            let Some(fixture) = record.to_fixture(league) else {
                                debug!(league = %league.code, id = ?record.id, "Skipping incomplete match record");
                                continue;
                            };
                            if seen.insert(fixture.id) {
                                fixtures.push(fixture);
                                kept += 1;
                            }
                        }
                        debug!(league = %league.code, total, kept, "League fixtures fetched");
                        break;
                    }
                    Err(ProviderError::RateLimited { retry_after }) if !retried => {
                        let wait = self.provider.retry_delay(retry_after);
                        warn!(league = %league.code, wait_s = wait.as_secs(), "Rate limited, retrying league once");
                        self.clock.sleep(wait).await;
                        retried = true;
                    }
                    Err(ProviderError::AccessDenied) => {
                        warn!(league = %league.code, "Access denied, skipping remaining leagues for this date");
                        break 'leagues;
                    }
                    Err(e) => {
                        warn!(league = %league.code, error = %e, "League fetch failed, skipping");
                        break;
                    }
                }
            }
        }

        fixtures.sort_by_key(|f| self.priority(f.competition_id));
        fixtures.truncate(self.max_fixtures);

        info!(%date, fixtures = fixtures.len(), "Fixture catalog built");
        fixtures
    }
}
