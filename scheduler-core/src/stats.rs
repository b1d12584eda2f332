//! Per-team fixture statistics.
//!
//! Derived counts shared by the constraint catalogue and exposed for
//! analysis: home/away/prime-time tallies, bye rounds, away streaks and
//! matchup occurrence rounds. Everything here is computed from the draw on
//! demand; nothing is cached on the model structs.

use std::collections::{BTreeMap, HashMap};

use crate::models::{Draw, Matchup};

/// Match tallies for one team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamCounts {
    pub total: u32,
    pub home: u32,
    pub away: u32,
    pub prime_time: u32,
}

/// Tallies per team id, over the regular (non-bye) matches of the draw.
pub fn team_counts(draw: &Draw) -> BTreeMap<i64, TeamCounts> {
    let mut counts: BTreeMap<i64, TeamCounts> = BTreeMap::new();
    for m in draw.regular_matches() {
        if let Some(home) = m.home_team_id {
            let c = counts.entry(home).or_default();
            c.total += 1;
            c.home += 1;
            if m.prime_time {
                c.prime_time += 1;
            }
        }
        if let Some(away) = m.away_team_id {
            let c = counts.entry(away).or_default();
            c.total += 1;
            c.away += 1;
            if m.prime_time {
                c.prime_time += 1;
            }
        }
    }
    counts
}

/// Rounds in which the team has no match.
///
/// A bye is an absence from the round's matches. An explicit bye entry has no
/// teams attached, so it never marks a team as playing and both
/// representations agree here.
pub fn bye_rounds(draw: &Draw, team_id: i64) -> Vec<u32> {
    (1..=draw.rounds)
        .filter(|&round| {
            !draw
                .matches_in_round(round)
                .any(|m| m.involves(team_id))
        })
        .collect()
}

/// A maximal run of consecutive away games in a team's fixture order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwayStreak {
    pub start_round: u32,
    pub length: u32,
}

impl AwayStreak {
    /// Whether this streak is longer than the allowed consecutive-away limit.
    pub fn exceeds_limit(&self, max_consecutive_away: u32) -> bool {
        self.length > max_consecutive_away
    }
}

/// The away streaks of a team, walking its matches in round order.
///
/// A home game ends the current streak; a bye round does not (the team is
/// still between away trips).
pub fn away_streaks(draw: &Draw, team_id: i64) -> Vec<AwayStreak> {
    let mut streaks = Vec::new();
    let mut current: Option<AwayStreak> = None;
    for m in draw.matches_for_team(team_id) {
        if m.away_team_id == Some(team_id) {
            match current.as_mut() {
                Some(s) => s.length += 1,
                None => {
                    current = Some(AwayStreak {
                        start_round: m.round,
                        length: 1,
                    })
                }
            }
        } else if let Some(s) = current.take() {
            streaks.push(s);
        }
    }
    if let Some(s) = current {
        streaks.push(s);
    }
    streaks
}

/// The rounds each matchup occurs in, sorted ascending.
pub fn matchup_rounds(draw: &Draw) -> HashMap<Matchup, Vec<u32>> {
    let mut rounds: HashMap<Matchup, Vec<u32>> = HashMap::new();
    for m in draw.regular_matches() {
        if let Some(pair) = m.matchup() {
            rounds.entry(pair).or_default().push(m.round);
        }
    }
    for r in rounds.values_mut() {
        r.sort_unstable();
    }
    rounds
}
