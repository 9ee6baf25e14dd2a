use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;

use football_scanner::clock::{Clock, SystemClock};
use football_scanner::config::{AppConfig, Secrets};
use football_scanner::data::api_football::ApiFootballClient;
use football_scanner::data::football_data::FootballDataClient;
use football_scanner::data::rate_limit::RateLimiter;
use football_scanner::data::{FallbackSource, PrimarySource};
use football_scanner::monitoring::alerts::{LogNotifier, NotificationSink, TelegramNotifier};
use football_scanner::monitoring::logger;
use football_scanner::report::assembler::ReportAssembler;
use football_scanner::scanner::pipeline::{local_today, ScanPipeline};

#[derive(Debug, Parser)]
#[command(about = "Scan upcoming football fixtures and send prediction signals")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,

    /// Log the payloads instead of sending them.
    #[arg(long)]
    dry_run: bool,

    /// Override `scanner.window_days`.
    #[arg(long)]
    window_days: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, secrets) = AppConfig::load(&cli.config)?;
    if let Some(days) = cli.window_days {
        config.scanner.window_days = days;
    }

    logger::init_logging(&config.monitoring)?;

    tracing::info!(
        window_days = config.scanner.window_days,
        leagues = config.leagues.len(),
        dry_run = cli.dry_run,
        "Football scanner starting"
    );

    run(config, secrets, cli.dry_run).await
}

async fn run(config: AppConfig, secrets: Secrets, dry_run: bool) -> Result<()> {
    let tz = config.scanner.tz()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let primary_key = secrets
        .football_data_api_key
        .context("FOOTBALL_DATA_API_KEY is not set")?;
    let primary_limiter = Arc::new(RateLimiter::with_clock(
        "football-data",
        config.providers.primary.min_interval(),
        clock.clone(),
    ));
    let primary: Arc<dyn PrimarySource> = Arc::new(FootballDataClient::new(
        &config.providers.primary,
        primary_key,
        primary_limiter,
    )?);

    let fallback: Option<Arc<dyn FallbackSource>> = match secrets.api_football_key {
        Some(key) => {
            let limiter = Arc::new(RateLimiter::with_clock(
                "api-football",
                config.providers.secondary.min_interval(),
                clock.clone(),
            ));
            let client: Arc<dyn FallbackSource> = Arc::new(ApiFootballClient::new(
                &config.providers.secondary,
                key,
                limiter,
            )?);
            Some(client)
        }
        None => {
            tracing::warn!("API_FOOTBALL_KEY not set, fallback history disabled");
            None
        }
    };

    let sink: Box<dyn NotificationSink> = match (
        dry_run || !config.telegram.enabled,
        secrets.telegram_bot_token,
        secrets.telegram_chat_id,
    ) {
        (false, Some(token), Some(chat_id)) => {
            Box::new(TelegramNotifier::new(&config.telegram, token, chat_id)?)
        }
        (false, _, _) => {
            tracing::warn!("Telegram credentials not set, logging payloads instead");
            Box::new(LogNotifier)
        }
        (true, _, _) => Box::new(LogNotifier),
    };

    let today = local_today(tz);
    let pipeline = ScanPipeline::from_config(&config, primary, fallback, clock, today)?;
    let reports = pipeline.run().await;

    let budget = config
        .report
        .max_message_chars
        .min(sink.max_message_chars());
    let payloads = ReportAssembler::new(budget, tz).assemble(&reports, Utc::now());

    let mut delivered = 0usize;
    let mut failed = 0usize;
    for payload in &payloads {
        let outcome = sink.send(payload, config.report.parse_mode).await;
        if outcome.is_delivered() {
            delivered += 1;
        } else {
            failed += 1;
            tracing::warn!(sink = sink.name(), ?outcome, "Payload not delivered");
        }
    }

    tracing::info!(
        dates = reports.len(),
        fixtures = reports.iter().map(|r| r.total_fixtures).sum::<usize>(),
        signals = reports.iter().map(|r| r.signal_count()).sum::<usize>(),
        delivered,
        failed,
        "Scan complete"
    );

    Ok(())
}
