//! One scan run: discover dates, build each date's catalog, enrich every
//! fixture with three history samples and evaluate the rules.

use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::data::history::HistoryProvider;
use crate::data::{FallbackSource, Fixture, PrimarySource, Venue};
use crate::prediction::{Prediction, PredictionEngine};
use crate::report::{fixture_summary, DateReport};
use crate::scanner::catalog::FixtureCatalog;
use crate::scanner::discovery::DateDiscovery;

/// Calendar date "now" in `tz`.
pub fn local_today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

pub struct ScanPipeline {
    discovery: DateDiscovery,
    catalog: FixtureCatalog,
    history: HistoryProvider,
    engine: PredictionEngine,
    tz: Tz,
    today: NaiveDate,
    window_days: u32,
    concurrency: usize,
}

impl ScanPipeline {
    pub fn from_config(
        config: &AppConfig,
        primary: Arc<dyn PrimarySource>,
        fallback: Option<Arc<dyn FallbackSource>>,
        clock: Arc<dyn Clock>,
        today: NaiveDate,
    ) -> Result<Self> {
        let provider = config.providers.primary.clone();

        Ok(Self {
            discovery: DateDiscovery::new(
                primary.clone(),
                config.leagues.clone(),
                provider.clone(),
                clock.clone(),
            ),
            catalog: FixtureCatalog::new(
                primary.clone(),
                config.leagues.clone(),
                provider,
                clock,
                config.scanner.max_fixtures_per_date,
            ),
            history: HistoryProvider::new(primary, fallback, &config.history, today),
            engine: PredictionEngine::new(),
            tz: config.scanner.tz()?,
            today,
            window_days: config.scanner.window_days,
            concurrency: config.scanner.history_concurrency.max(1),
        })
    }

    pub async fn run(&self) -> Vec<DateReport> {
        let dates = self
            .discovery
            .find_upcoming_dates(self.today, self.window_days)
            .await;

        let mut reports = Vec::with_capacity(dates.len());
        for date in dates {
            reports.push(self.scan_date(date).await);
        }
        reports
    }

    async fn scan_date(&self, date: NaiveDate) -> DateReport {
        let fixtures = self.catalog.fetch_for_date(date).await;

        let evaluated: Vec<Vec<Prediction>> = stream::iter(fixtures.iter())
            .map(|fixture| self.evaluate_fixture(fixture))
            .buffered(self.concurrency)
            .collect()
            .await;

        let summaries: Vec<String> = fixtures
            .iter()
            .zip(&evaluated)
            .filter(|(_, predictions)| !predictions.is_empty())
            .map(|(fixture, predictions)| fixture_summary(fixture, predictions, self.tz))
            .collect();

        info!(
            %date,
            fixtures = fixtures.len(),
            signals = summaries.len(),
            "Date scanned"
        );

        DateReport {
            date,
            total_fixtures: fixtures.len(),
            summaries,
        }
    }

    async fn evaluate_fixture(&self, fixture: &Fixture) -> Vec<Prediction> {
        let h2h = self
            .history
            .fetch(fixture.home_team_id, Venue::Home, Some(fixture.away_team_id))
            .await;
        let home_form = self
            .history
            .fetch(fixture.home_team_id, Venue::Home, None)
            .await;
        let away_form = self
            .history
            .fetch(fixture.away_team_id, Venue::Away, None)
            .await;

        let predictions = self.engine.evaluate(fixture, &h2h, &home_form, &away_form);
        debug!(
            fixture_id = fixture.id,
            h2h = h2h.len(),
            home_form = home_form.len(),
            away_form = away_form.len(),
            predictions = predictions.len(),
            "Fixture evaluated"
        );
        predictions
    }
}
