//! Splits scan results into ordered, length-bounded notification payloads.
//!
//! Lengths are measured in UTF-16 code units, the unit Telegram counts its
//! message limit in. That is never less than the character count, so a payload
//! within budget is also within budget in characters.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::report::DateReport;

pub const CONTINUATION_MARKER: &str = "(cont.)";
pub const SUMMARY_SEPARATOR: &str = "\n\n";

/// Smallest budget that holds the header, the footer and a continuation
/// heading with room left for a summary.
pub const MIN_BUDGET: usize = 256;

const DISCLAIMER: &str = "⚠️ _Predictions are simple counts over recent head-to-head and venue form. \
They are not betting advice and carry no guarantee._";

pub struct ReportAssembler {
    max_chars: usize,
    tz: Tz,
}

impl ReportAssembler {
    pub fn new(max_chars: usize, tz: Tz) -> Self {
        Self { max_chars, tz }
    }

    /// Header, per-date bodies (with continuations), footer. A run without
    /// signals yields a single summary payload instead.
    pub fn assemble(&self, reports: &[DateReport], scanned_at: DateTime<Utc>) -> Vec<String> {
        let dates = reports.len();
        let fixtures: usize = reports.iter().map(|r| r.total_fixtures).sum();
        let signals: usize = reports.iter().map(DateReport::signal_count).sum();
        let scan_time = scanned_at.with_timezone(&self.tz).format("%Y-%m-%d %H:%M %Z");

        if signals == 0 {
            return vec![self.fit(format!(
                "⚠️ *NO SIGNALS* | {scan_time}\n\
                 📅 Dates scanned: {dates}\n\
                 ⚽ Fixtures scanned: {fixtures}"
            ))];
        }

        let plural = if signals == 1 { "" } else { "S" };
        let mut payloads = vec![self.fit(format!(
            "📊 *FOOTBALL PREDICTIONS*\n\
             ⏰ {scan_time}\n\
             📅 Dates scanned: {dates}\n\
             ⚽ Fixtures scanned: {fixtures}\n\
             ✅ {signals} SIGNAL{plural} FOUND"
        ))];

        for report in reports.iter().filter(|r| r.signal_count() > 0) {
            self.paginate(report, &mut payloads);
        }

        payloads.push(self.fit(DISCLAIMER.to_string()));
        payloads
    }

    /// Only cuts when the budget is below [`MIN_BUDGET`].
    fn fit(&self, payload: String) -> String {
        if text_len(&payload) <= self.max_chars {
            payload
        } else {
            truncate(&payload, self.max_chars)
        }
    }

    fn paginate(&self, report: &DateReport, payloads: &mut Vec<String>) {
        let mut current = date_heading(report.date, false);
        let mut current_len = text_len(&current);
        let mut has_content = false;
        let separator_len = text_len(SUMMARY_SEPARATOR);

        for summary in &report.summaries {
            if has_content && current_len + separator_len + text_len(summary) > self.max_chars {
                let full = std::mem::replace(&mut current, date_heading(report.date, true));
                payloads.push(self.fit(full));
                current_len = text_len(&current);
            }

            let room = self.max_chars.saturating_sub(current_len + separator_len);
            let summary = truncate(summary, room);

            current.push_str(SUMMARY_SEPARATOR);
            current.push_str(&summary);
            current_len += separator_len + text_len(&summary);
            has_content = true;
        }

        payloads.push(self.fit(current));
    }
}

fn date_heading(date: NaiveDate, continuation: bool) -> String {
    let day = date.format("%a %d %b %Y");
    if continuation {
        format!("📅 *{day}* {CONTINUATION_MARKER}")
    } else {
        format!("📅 *{day}*")
    }
}

fn text_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Cut to at most `max` UTF-16 units, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text_len(text) <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        if used + c.len_utf16() > max - 1 {
            break;
        }
        used += c.len_utf16();
        out.push(c);
    }
    out.push('…');
    out
}
