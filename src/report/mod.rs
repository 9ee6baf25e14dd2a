//! Per-date scan results and their rendering into notification payloads.

pub mod assembler;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::data::Fixture;
use crate::prediction::Prediction;

/// Outcome of scanning one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateReport {
    pub date: NaiveDate,
    /// Fixtures evaluated, with or without a signal.
    pub total_fixtures: usize,
    /// One rendered summary per fixture that produced a prediction, in fixture order.
    pub summaries: Vec<String>,
}

impl DateReport {
    pub fn signal_count(&self) -> usize {
        self.summaries.len()
    }
}

/// Escape characters that legacy Telegram Markdown treats as markup. The
/// escapes only hold outside an entity, so escaped text must not be wrapped
/// in `*` or `_`.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Render one fixture and its predictions. Contains no blank lines.
pub fn fixture_summary(fixture: &Fixture, predictions: &[Prediction], tz: Tz) -> String {
    let mut lines = vec![
        format!(
            "⚽ {} vs {}",
            escape_markdown(&fixture.home_team),
            escape_markdown(&fixture.away_team)
        ),
        format!(
            "🏆 {} | 🕒 {}",
            escape_markdown(&fixture.league_name),
            local_kickoff(fixture.kickoff, tz)
        ),
    ];
    lines.extend(predictions.iter().map(|p| format!("• {p}")));
    lines.join("\n")
}

fn local_kickoff(kickoff: DateTime<Utc>, tz: Tz) -> String {
    kickoff.with_timezone(&tz).format("%H:%M %Z").to_string()
}
