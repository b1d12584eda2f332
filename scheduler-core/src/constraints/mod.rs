//! Constraint model for fixture evaluation.
//!
//! A fixture is judged by an ordered set of rules. Hard rules must hold:
//! any violation zeroes the fixture score. Soft rules contribute a
//! normalized score in [0, 1] to a weighted mean. The catalogue is a closed
//! set dispatched through the [`Constraint`] trait; shared pieces (naming,
//! hardness, blocked-date predicates) live in small composition bases rather
//! than an inheritance tree.

mod availability;
mod engine;
mod factory;
mod fairness;
mod structure;

pub use availability::{TeamAvailability, VenueAvailability};
pub use engine::{AnalysisItem, ConstraintEngine, RuleScore, ScoreBreakdown, Severity};
pub use factory::{build_rule, default_engine, engine_from_config, engine_from_value};
pub use fairness::{HomeAwayBalance, PrimeTimeSpread, RestPeriod, TravelMinimization};
pub use structure::{ByeConstraint, DoubleUp};

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{Draw, Match};

/// A reported failure of a hard rule.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Violation {
    /// Name of the rule that failed.
    pub rule: String,
    pub match_id: Option<i64>,
    pub round: Option<u32>,
    pub message: String,
}

impl Violation {
    pub fn for_match(rule: &str, m: &Match, message: impl Into<String>) -> Self {
        Violation {
            rule: rule.to_string(),
            match_id: Some(m.id),
            round: Some(m.round),
            message: message.into(),
        }
    }
}

/// The capability set every rule exposes.
///
/// `validate` reports a hard failure for one match in the context of its
/// draw; soft rules always return `None`. `score` judges the whole draw on a
/// normalized [0, 1] scale where 1.0 is fully satisfied.
pub trait Constraint: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn is_hard(&self) -> bool;
    fn validate(&self, m: &Match, draw: &Draw) -> Option<Violation>;
    fn score(&self, draw: &Draw) -> f64;
}

/// Shared identity fields embedded by every concrete rule.
#[derive(Debug, Clone)]
pub struct RuleBase {
    pub name: String,
    pub description: String,
    pub hard: bool,
}

impl RuleBase {
    pub fn new(name: impl Into<String>, description: impl Into<String>, hard: bool) -> Self {
        RuleBase {
            name: name.into(),
            description: description.into(),
            hard,
        }
    }
}

/// A set of blocked calendar days, shared by the availability rules.
///
/// Membership is by day-of-year: a blocked 2025-04-25 also blocks
/// 2026-04-25. Blocks model recurring calendar days (public holidays,
/// venue maintenance windows), so the year is deliberately ignored.
#[derive(Debug, Clone, Default)]
pub struct DateSet {
    dates: Vec<NaiveDate>,
    ordinals: HashSet<u32>,
}

impl DateSet {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        let ordinals = dates.iter().map(|d| d.ordinal()).collect();
        DateSet { dates, ordinals }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Whether the given date falls on a blocked day.
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.ordinals.contains(&date.ordinal())
    }

    /// The configured dates, for descriptions and serialization.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }
}

/// Arithmetic mean of per-team scores; vacuously satisfied when the draw has
/// no teams.
pub(crate) fn mean_over_teams<F>(draw: &Draw, score_team: F) -> f64
where
    F: Fn(i64) -> f64,
{
    let teams = draw.team_ids();
    if teams.is_empty() {
        return 1.0;
    }
    teams.iter().map(|&t| score_team(t)).sum::<f64>() / teams.len() as f64
}
