//! Heuristic fixture predictions from small head-to-head and form samples.

pub mod rules;

use serde::Serialize;

use crate::data::{Fixture, MatchSample};
use crate::prediction::rules::RULES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    HomeWin,
    AwayWin,
    BothTeamsScore,
    Over25,
    Under25,
}

/// Which sample justified a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Basis {
    HeadToHead,
    HomeForm,
    AwayForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub outcome: Outcome,
    pub basis: Basis,
    pub support: usize,
    pub sample_size: usize,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HomeWin => write!(f, "W1"),
            Self::AwayWin => write!(f, "W2"),
            Self::BothTeamsScore => write!(f, "BTS"),
            Self::Over25 => write!(f, "Over 2.5"),
            Self::Under25 => write!(f, "Under 2.5"),
        }
    }
}

impl std::fmt::Display for Basis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HeadToHead => write!(f, "H2H"),
            Self::HomeForm => write!(f, "Home Form"),
            Self::AwayForm => write!(f, "Away Form"),
        }
    }
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}: {}/{})",
            self.outcome, self.basis, self.support, self.sample_size
        )
    }
}

/// Everything the rules see for one fixture.
#[derive(Debug, Clone, Copy)]
pub struct Samples<'a> {
    pub fixture: &'a Fixture,
    pub h2h: &'a MatchSample,
    pub home_form: &'a MatchSample,
    pub away_form: &'a MatchSample,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PredictionEngine;

impl PredictionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run every rule in order and keep the ones that fire.
    pub fn evaluate(
        &self,
        fixture: &Fixture,
        h2h: &MatchSample,
        home_form: &MatchSample,
        away_form: &MatchSample,
    ) -> Vec<Prediction> {
        let samples = Samples {
            fixture,
            h2h,
            home_form,
            away_form,
        };
        RULES.iter().filter_map(|rule| rule(&samples)).collect()
    }
}
