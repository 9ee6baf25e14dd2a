//! Football fixture scanner: finds upcoming fixtures in tracked leagues,
//! enriches them with head-to-head and venue-form history, applies a small
//! rule set and renders the signals as notification payloads.

pub mod clock;
pub mod config;
pub mod data;
pub mod monitoring;
pub mod prediction;
pub mod report;
pub mod scanner;
