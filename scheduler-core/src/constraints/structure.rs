//! Structural rules: bye distribution and repeat-encounter spacing.

use super::{Constraint, RuleBase, Violation};
use crate::models::{Draw, Match};
use crate::stats;

/// Hard rule on bye distribution.
///
/// With an even team count no team may have a bye at all. With an odd count
/// every round carries exactly one bye team and every team accumulates
/// exactly `⌊R/(N−1)⌋` byes (at least one) over the season.
#[derive(Debug, Clone)]
pub struct ByeConstraint {
    base: RuleBase,
}

impl ByeConstraint {
    pub fn new() -> Self {
        ByeConstraint {
            base: RuleBase::new(
                "bye_constraint",
                "byes are forbidden for even leagues and evenly rotated for odd leagues",
                true,
            ),
        }
    }

    fn expected_byes(team_count: usize, rounds: u32) -> u32 {
        let cycle = team_count as u32 - 1;
        (rounds / cycle).max(1)
    }

    fn bye_teams_in_round(draw: &Draw, round: u32) -> Vec<i64> {
        draw.team_ids()
            .into_iter()
            .filter(|&t| !draw.matches_in_round(round).any(|m| m.involves(t)))
            .collect()
    }
}

impl Default for ByeConstraint {
    fn default() -> Self {
        Self::new()
    }
}

impl Constraint for ByeConstraint {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn is_hard(&self) -> bool {
        self.base.hard
    }

    fn validate(&self, m: &Match, draw: &Draw) -> Option<Violation> {
        let teams = draw.team_ids();
        if teams.is_empty() {
            return None;
        }
        let byes = Self::bye_teams_in_round(draw, m.round);
        if teams.len() % 2 == 0 {
            if m.is_bye() {
                return Some(Violation::for_match(
                    self.name(),
                    m,
                    "explicit bye in an even league",
                ));
            }
            if !byes.is_empty() {
                return Some(Violation::for_match(
                    self.name(),
                    m,
                    format!("round {} leaves teams {byes:?} without a match", m.round),
                ));
            }
        } else if byes.len() != 1 {
            return Some(Violation::for_match(
                self.name(),
                m,
                format!(
                    "round {} has {} bye teams, expected exactly 1",
                    m.round,
                    byes.len()
                ),
            ));
        }
        None
    }

    fn score(&self, draw: &Draw) -> f64 {
        let teams = draw.team_ids();
        if teams.is_empty() {
            return 1.0;
        }
        if teams.len() % 2 == 0 {
            let ok = teams
                .iter()
                .filter(|&&t| stats::bye_rounds(draw, t).is_empty())
                .count();
            return ok as f64 / teams.len() as f64;
        }

        let expected = Self::expected_byes(teams.len(), draw.rounds);
        let teams_ok = teams
            .iter()
            .filter(|&&t| stats::bye_rounds(draw, t).len() as u32 == expected)
            .count() as f64
            / teams.len() as f64;
        let rounds_ok = (1..=draw.rounds)
            .filter(|&r| Self::bye_teams_in_round(draw, r).len() == 1)
            .count() as f64
            / draw.rounds as f64;
        (teams_ok + rounds_ok) / 2.0
    }
}

/// Hard rule: repeats of the same matchup must be separated by a minimum
/// number of rounds.
#[derive(Debug, Clone)]
pub struct DoubleUp {
    base: RuleBase,
    min_rounds_separation: u32,
}

impl DoubleUp {
    pub fn new(min_rounds_separation: u32) -> Self {
        DoubleUp {
            base: RuleBase::new(
                "double_up",
                format!("repeat matchups must be at least {min_rounds_separation} rounds apart"),
                true,
            ),
            min_rounds_separation,
        }
    }
}

impl Constraint for DoubleUp {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn is_hard(&self) -> bool {
        self.base.hard
    }

    fn validate(&self, m: &Match, draw: &Draw) -> Option<Violation> {
        let pair = m.matchup()?;
        for other in draw.regular_matches() {
            if std::ptr::eq(other, m) {
                continue;
            }
            if other.matchup() == Some(pair) {
                let separation = other.round.abs_diff(m.round);
                if separation < self.min_rounds_separation {
                    return Some(Violation::for_match(
                        self.name(),
                        m,
                        format!(
                            "teams {} and {} meet again in round {} only {} round(s) after round {}",
                            pair.0,
                            pair.1,
                            m.round.max(other.round),
                            separation,
                            m.round.min(other.round),
                        ),
                    ));
                }
            }
        }
        None
    }

    /// Fraction of repeated matchups whose every occurrence gap meets the
    /// minimum separation. A draw without repeats is fully satisfied.
    fn score(&self, draw: &Draw) -> f64 {
        let repeated: Vec<Vec<u32>> = stats::matchup_rounds(draw)
            .into_values()
            .filter(|rounds| rounds.len() > 1)
            .collect();
        if repeated.is_empty() {
            return 1.0;
        }
        let ok = repeated
            .iter()
            .filter(|rounds| {
                rounds
                    .windows(2)
                    .all(|w| w[1] - w[0] >= self.min_rounds_separation)
            })
            .count();
        ok as f64 / repeated.len() as f64
    }
}
