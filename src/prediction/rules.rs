//! Individual prediction rules.
//!
//! Each rule is a pure function over one fixture's samples. A rule whose
//! sample holds fewer than [`MIN_SAMPLE`] matches does not fire.

use crate::data::{MatchSample, Venue};
use crate::prediction::{Basis, Outcome, Prediction, Samples};

/// Smallest sample a rule will look at.
pub const MIN_SAMPLE: usize = 3;

/// Matches that must agree for a rule to fire.
pub const MIN_SUPPORT: usize = 3;

pub type Rule = fn(&Samples<'_>) -> Option<Prediction>;

/// Evaluation order is label order in the output.
pub const RULES: &[Rule] = &[
    h2h_dominance,
    home_form,
    away_form,
    both_teams_score,
    over_2_5,
    under_2_5,
];

fn support(
    sample: &MatchSample,
    outcome: Outcome,
    basis: Basis,
    hits: impl Fn(&MatchSample) -> usize,
) -> Option<Prediction> {
    if sample.len() < MIN_SAMPLE {
        return None;
    }
    let count = hits(sample);
    (count >= MIN_SUPPORT).then(|| Prediction {
        outcome,
        basis,
        support: count,
        sample_size: sample.len(),
    })
}

pub fn home_h2h_dominance(s: &Samples<'_>) -> Option<Prediction> {
    let team = s.fixture.home_team_id;
    support(s.h2h, Outcome::HomeWin, Basis::HeadToHead, |m| m.wins_for(team))
}

pub fn away_h2h_dominance(s: &Samples<'_>) -> Option<Prediction> {
    let team = s.fixture.away_team_id;
    support(s.h2h, Outcome::AwayWin, Basis::HeadToHead, |m| m.wins_for(team))
}

/// Home dominance first; away dominance only when the home side did not fire.
pub fn h2h_dominance(s: &Samples<'_>) -> Option<Prediction> {
    home_h2h_dominance(s).or_else(|| away_h2h_dominance(s))
}

pub fn home_form(s: &Samples<'_>) -> Option<Prediction> {
    let team = s.fixture.home_team_id;
    support(s.home_form, Outcome::HomeWin, Basis::HomeForm, |m| {
        m.count(|r| r.venue == Venue::Home && r.winner() == Some(team))
    })
}

pub fn away_form(s: &Samples<'_>) -> Option<Prediction> {
    let team = s.fixture.away_team_id;
    support(s.away_form, Outcome::AwayWin, Basis::AwayForm, |m| {
        m.count(|r| r.venue == Venue::Away && r.winner() == Some(team))
    })
}

pub fn both_teams_score(s: &Samples<'_>) -> Option<Prediction> {
    support(s.h2h, Outcome::BothTeamsScore, Basis::HeadToHead, |m| {
        m.count(|r| r.both_scored())
    })
}

// Goal totals are integers, so 2.5 never ties.
pub fn over_2_5(s: &Samples<'_>) -> Option<Prediction> {
    support(s.h2h, Outcome::Over25, Basis::HeadToHead, |m| {
        m.count(|r| f64::from(r.total_goals()) > 2.5)
    })
}

pub fn under_2_5(s: &Samples<'_>) -> Option<Prediction> {
    support(s.h2h, Outcome::Under25, Basis::HeadToHead, |m| {
        m.count(|r| f64::from(r.total_goals()) < 2.5)
    })
}
