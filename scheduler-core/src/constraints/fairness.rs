//! Fairness rules: travel streaks, rest periods, prime-time spread and
//! home/away balance. All of these are soft rules; they never raise a hard
//! violation and only contribute to the weighted score.

use super::{mean_over_teams, Constraint, RuleBase, Violation};
use crate::models::{Draw, Match};
use crate::stats;

/// Soft rule penalizing long consecutive away trips.
#[derive(Debug, Clone)]
pub struct TravelMinimization {
    base: RuleBase,
    max_consecutive_away: u32,
}

impl TravelMinimization {
    pub fn new(max_consecutive_away: u32) -> Self {
        TravelMinimization {
            base: RuleBase::new(
                "travel_minimization",
                format!("at most {max_consecutive_away} consecutive away games per team"),
                false,
            ),
            max_consecutive_away,
        }
    }

    /// 1 − accumulated excess / maximum possible excess for one team. The
    /// worst case is a single streak covering every game, so the
    /// denominator is `games − limit`.
    fn score_team(&self, draw: &Draw, team_id: i64) -> f64 {
        let games = draw.matches_for_team(team_id).len() as u32;
        let max_possible = games.saturating_sub(self.max_consecutive_away);
        if max_possible == 0 {
            return 1.0;
        }
        let penalty: u32 = stats::away_streaks(draw, team_id)
            .iter()
            .filter(|s| s.exceeds_limit(self.max_consecutive_away))
            .map(|s| s.length - self.max_consecutive_away)
            .sum();
        (1.0 - penalty as f64 / max_possible as f64).max(0.0)
    }
}

impl Constraint for TravelMinimization {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn is_hard(&self) -> bool {
        self.base.hard
    }

    fn validate(&self, _m: &Match, _draw: &Draw) -> Option<Violation> {
        None
    }

    fn score(&self, draw: &Draw) -> f64 {
        mean_over_teams(draw, |t| self.score_team(draw, t))
    }
}

/// Soft rule requiring minimum rest between a team's dated matches.
///
/// Rest days between two kickoffs are `⌊hours/24⌋ − 1`: matches on
/// consecutive calendar days yield 0 rest days and same-day matches yield
/// −1, and the comparison is `rest >= min`. Callers picking a minimum
/// should account for the off-by-one flavour of this counting.
#[derive(Debug, Clone)]
pub struct RestPeriod {
    base: RuleBase,
    min_rest_days: i64,
}

impl RestPeriod {
    pub fn new(min_rest_days: i64) -> Self {
        RestPeriod {
            base: RuleBase::new(
                "rest_period",
                format!("at least {min_rest_days} rest day(s) between a team's matches"),
                false,
            ),
            min_rest_days,
        }
    }

    pub(crate) fn rest_days(a: &Match, b: &Match) -> Option<i64> {
        let (ka, kb) = (a.kickoff()?, b.kickoff()?);
        let hours = (kb - ka).num_hours().abs();
        Some(hours / 24 - 1)
    }

    /// Fraction of the team's consecutive dated match pairs with enough
    /// rest.
    fn score_team(&self, draw: &Draw, team_id: i64) -> f64 {
        let dated: Vec<&Match> = draw
            .matches_for_team(team_id)
            .into_iter()
            .filter(|m| m.match_date.is_some())
            .collect();
        if dated.len() < 2 {
            return 1.0;
        }
        let pairs = dated.len() - 1;
        let ok = dated
            .windows(2)
            .filter(|w| {
                Self::rest_days(w[0], w[1]).is_some_and(|rest| rest >= self.min_rest_days)
            })
            .count();
        ok as f64 / pairs as f64
    }
}

impl Constraint for RestPeriod {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn is_hard(&self) -> bool {
        self.base.hard
    }

    fn validate(&self, _m: &Match, _draw: &Draw) -> Option<Violation> {
        None
    }

    fn score(&self, draw: &Draw) -> f64 {
        mean_over_teams(draw, |t| self.score_team(draw, t))
    }
}

/// Soft rule keeping each team's share of prime-time games near a target
/// ratio.
#[derive(Debug, Clone)]
pub struct PrimeTimeSpread {
    base: RuleBase,
    target_ratio: f64,
    max_deviation: f64,
}

impl PrimeTimeSpread {
    pub fn new(target_ratio: f64, max_deviation: f64) -> Self {
        PrimeTimeSpread {
            base: RuleBase::new(
                "prime_time_spread",
                format!(
                    "prime-time share per team near {target_ratio:.2} (tolerance {max_deviation:.2})"
                ),
                false,
            ),
            target_ratio,
            max_deviation,
        }
    }
}

impl Constraint for PrimeTimeSpread {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn is_hard(&self) -> bool {
        self.base.hard
    }

    fn validate(&self, _m: &Match, _draw: &Draw) -> Option<Violation> {
        None
    }

    fn score(&self, draw: &Draw) -> f64 {
        let counts = stats::team_counts(draw);
        mean_over_teams(draw, |t| {
            let c = match counts.get(&t) {
                Some(c) if c.total > 0 => c,
                _ => return 1.0,
            };
            let ratio = c.prime_time as f64 / c.total as f64;
            deviation_score(ratio, self.target_ratio, self.max_deviation)
        })
    }
}

/// Soft rule keeping each team's home share near one half.
#[derive(Debug, Clone)]
pub struct HomeAwayBalance {
    base: RuleBase,
    max_deviation: f64,
}

impl HomeAwayBalance {
    pub fn new(max_deviation: f64) -> Self {
        HomeAwayBalance {
            base: RuleBase::new(
                "home_away_balance",
                format!("home share per team near 0.50 (tolerance {max_deviation:.2})"),
                false,
            ),
            max_deviation,
        }
    }
}

impl Constraint for HomeAwayBalance {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn is_hard(&self) -> bool {
        self.base.hard
    }

    fn validate(&self, _m: &Match, _draw: &Draw) -> Option<Violation> {
        None
    }

    fn score(&self, draw: &Draw) -> f64 {
        let counts = stats::team_counts(draw);
        mean_over_teams(draw, |t| {
            let c = match counts.get(&t) {
                Some(c) if c.total > 0 => c,
                _ => return 1.0,
            };
            let ratio = c.home as f64 / c.total as f64;
            deviation_score(ratio, 0.5, self.max_deviation)
        })
    }
}

/// Linear falloff from 1.0 at the target to 0.0 at the deviation bound, and
/// zero beyond it.
fn deviation_score(ratio: f64, target: f64, max_deviation: f64) -> f64 {
    let deviation = (ratio - target).abs();
    if max_deviation <= 0.0 {
        return if deviation == 0.0 { 1.0 } else { 0.0 };
    }
    if deviation <= max_deviation {
        1.0 - deviation / max_deviation
    } else {
        0.0
    }
}
