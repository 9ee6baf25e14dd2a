//! End-to-end scan against mocked providers, through to assembled payloads.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use secrecy::SecretString;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use football_scanner::clock::{Clock, ManualClock};
use football_scanner::config::AppConfig;
use football_scanner::data::api_football::ApiFootballClient;
use football_scanner::data::football_data::FootballDataClient;
use football_scanner::data::rate_limit::RateLimiter;
use football_scanner::data::{FallbackSource, PrimarySource};
use football_scanner::report::assembler::ReportAssembler;
use football_scanner::scanner::pipeline::ScanPipeline;

const ARSENAL: u64 = 57;
const CHELSEA: u64 = 61;

fn finished(day: u32, home: u64, away: u64, hs: u32, aws: u32) -> Value {
    json!({
        "id": u64::from(day) * 100 + home,
        "utcDate": format!("2026-09-{day:02}T15:00:00Z"),
        "homeTeam": {"id": home, "name": format!("Team {home}")},
        "awayTeam": {"id": away, "name": format!("Team {away}")},
        "score": {"fullTime": {"home": hs, "away": aws}}
    })
}

fn fallback(home: u64, away: u64, hs: u32, aws: u32) -> Value {
    json!({
        "teams": {"home": {"id": home, "name": "Home"}, "away": {"id": away, "name": "Away"}},
        "goals": {"home": hs, "away": aws}
    })
}

async fn mock_providers(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/matches"))
        .and(query_param("competitions", "PL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matches": [
                {
                    "id": 7001,
                    "utcDate": "2026-10-18T15:30:00Z",
                    "competition": {"id": 2021, "name": "Premier League"},
                    "homeTeam": {"id": ARSENAL, "name": "Arsenal FC", "shortName": "Arsenal"},
                    "awayTeam": {"id": CHELSEA, "name": "Chelsea FC", "shortName": "Chelsea"}
                },
                {"id": 7002, "utcDate": "2026-10-18T15:30:00Z"}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/matches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"matches": []})))
        .with_priority(10)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/teams/{ARSENAL}/matches")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matches": [
                finished(1, ARSENAL, CHELSEA, 2, 0),
                finished(8, ARSENAL, CHELSEA, 1, 0),
                finished(15, ARSENAL, CHELSEA, 3, 1),
                finished(22, ARSENAL, CHELSEA, 0, 1),
                finished(29, ARSENAL, CHELSEA, 2, 1)
            ]
        })))
        .expect(2)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/teams/{CHELSEA}/matches")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .and(query_param("team", CHELSEA.to_string()))
        .and(query_param("venue", "away"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": [
                fallback(40, CHELSEA, 0, 2),
                fallback(50, CHELSEA, 1, 3),
                fallback(70, CHELSEA, 0, 1)
            ]
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::parse(include_str!("../config/default.toml")).unwrap();
    config.scanner.window_days = 1;
    config.providers.primary.base_url = server.uri();
    config.providers.secondary.base_url = server.uri();
    config
}

#[tokio::test]
async fn scan_to_payloads() {
    let server = MockServer::start().await;
    mock_providers(&server).await;
    let config = config(&server);

    let clock = Arc::new(ManualClock::new());
    let primary_limiter = Arc::new(RateLimiter::with_clock(
        "football-data",
        config.providers.primary.min_interval(),
        clock.clone(),
    ));
    let secondary_limiter = Arc::new(RateLimiter::with_clock(
        "api-football",
        config.providers.secondary.min_interval(),
        clock.clone(),
    ));
    let primary: Arc<dyn PrimarySource> = Arc::new(
        FootballDataClient::new(&config.providers.primary, SecretString::from("fd"), primary_limiter)
            .unwrap(),
    );
    let secondary: Arc<dyn FallbackSource> = Arc::new(
        ApiFootballClient::new(&config.providers.secondary, SecretString::from("af"), secondary_limiter)
            .unwrap(),
    );

    let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
    let pipeline = ScanPipeline::from_config(
        &config,
        primary,
        Some(secondary),
        clock.clone() as Arc<dyn Clock>,
        today,
    )
    .unwrap();

    let reports = pipeline.run().await;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].date, today);
    // The malformed record is dropped before it is counted.
    assert_eq!(reports[0].total_fixtures, 1);
    assert_eq!(reports[0].signal_count(), 1);

    let scanned_at = Utc.with_ymd_and_hms(2026, 10, 18, 7, 0, 0).unwrap();
    let payloads = ReportAssembler::new(config.report.max_message_chars, config.scanner.tz().unwrap())
        .assemble(&reports, scanned_at);

    assert_eq!(payloads.len(), 3);
    assert!(payloads[0].contains("1 SIGNAL FOUND"));
    assert!(payloads[0].contains("⏰ 2026-10-18 08:00 BST"));
    assert_eq!(
        payloads[1],
        "📅 *Sun 18 Oct 2026*\n\n\
         ⚽ Arsenal vs Chelsea\n\
         🏆 Premier League | 🕒 16:30 BST\n\
         • W1 (H2H: 4/5)\n\
         • W1 (Home Form: 4/5)\n\
         • W2 (Away Form: 3/3)\n\
         • Under 2.5 (H2H: 3/5)"
    );
    assert!(payloads[2].contains("not betting advice"));

    // 1 probe + 9 league fetches + 3 history requests on the primary: every call
    // after the first waits a full interval. The single fallback call does not wait.
    assert_eq!(
        clock.sleeps(),
        vec![config.providers.primary.min_interval(); 12]
    );
}

#[tokio::test]
async fn access_denied_everywhere_still_reports() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let config = config(&server);

    let clock = Arc::new(ManualClock::new());
    let limiter = Arc::new(RateLimiter::with_clock(
        "football-data",
        config.providers.primary.min_interval(),
        clock.clone(),
    ));
    let primary: Arc<dyn PrimarySource> = Arc::new(
        FootballDataClient::new(&config.providers.primary, SecretString::from("fd"), limiter).unwrap(),
    );

    let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
    let pipeline =
        ScanPipeline::from_config(&config, primary, None, clock as Arc<dyn Clock>, today).unwrap();
    let reports = pipeline.run().await;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].total_fixtures, 0);

    let payloads = ReportAssembler::new(3500, chrono_tz::Europe::London)
        .assemble(&reports, Utc::now());
    assert_eq!(payloads.len(), 1);
    assert!(payloads[0].contains("NO SIGNALS"));
}
