//! Round-robin seed generation.
//!
//! Produces an initial feasible fixture with the circle method: position 0
//! stays fixed while the remaining positions rotate one step per round, and
//! round `r` pairs position `i` with position `N'-1-i`. For an odd team count
//! a sentinel slot is appended; a pairing against the sentinel means the real
//! team sits the round out. Byes are represented as absence from the round —
//! the generator never emits explicit bye entries.
//!
//! The generated fixture is a starting point for the optimizer, not a final
//! schedule: it is structurally sound (one appearance per team per round,
//! balanced byes) but makes no attempt at fairness beyond the home/away
//! alternation described on [`generate`].

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use log::debug;

use crate::error::SchedulerError;
use crate::models::{Draw, Match, Team};

/// Builds a single round robin for `rounds` rounds.
///
/// Home/away assignment:
/// - the pairing at the fixed position alternates sides with the round
///   parity, and flips once more per full cycle of `N'-1` rounds so the
///   fixed team is not perpetually favoured when the cycle repeats;
/// - every other pairing swaps sides on even round indices.
///
/// This keeps the fixed team's home/away split within one game of even over
/// a cycle; rotating teams can drift further under the parity rule, and the
/// home/away-balance soft rule is what irons that out during optimization.
/// The venue defaults to the home team's home venue.
///
/// # Errors
///
/// `InvalidInput` when fewer than two teams or fewer than one round are
/// requested, or when team ids are not distinct.
pub fn generate(teams: &[Team], rounds: u32) -> Result<Draw, SchedulerError> {
    let slots = team_slots(teams, rounds)?;
    let venues = home_venues(teams);

    let mut draw = Draw::new("round-robin fixture", Utc::now().year(), rounds);
    let mut next_id: i64 = 1;
    build_rounds(slots, rounds, &venues, &mut draw, &mut next_id);

    debug!(
        "generated single round robin: {} teams, {} rounds, {} matches",
        teams.len(),
        rounds,
        draw.matches.len()
    );
    Ok(draw)
}

/// Builds a double round robin: a single round robin over `rounds_per_leg`
/// rounds followed by its round-shifted mirror with home and away reversed.
/// The mirror match is played at the new home team's venue.
pub fn generate_double(teams: &[Team], rounds_per_leg: u32) -> Result<Draw, SchedulerError> {
    let mut draw = generate(teams, rounds_per_leg)?;
    let venues = home_venues(teams);

    let total_rounds = rounds_per_leg
        .checked_mul(2)
        .ok_or_else(|| SchedulerError::InvalidInput("round count overflow".into()))?;
    let mut next_id = draw.matches.len() as i64 + 1;

    let mirrored: Vec<Match> = draw
        .matches
        .iter()
        .map(|m| {
            let home = m.away_team_id.unwrap_or_default();
            let away = m.home_team_id.unwrap_or_default();
            let mut mirror = Match::new(
                m.round + rounds_per_leg,
                home,
                away,
                venues.get(&home).copied().flatten(),
            );
            mirror.id = next_id;
            next_id += 1;
            mirror
        })
        .collect();

    draw.matches.extend(mirrored);
    draw.rounds = total_rounds;
    debug!(
        "generated double round robin: {} rounds, {} matches",
        total_rounds,
        draw.matches.len()
    );
    Ok(draw)
}

/// Assigns weekly match dates starting at `first_round_date`: every match in
/// round `r` is dated `first_round_date + 7 * (r - 1)` days. Kickoff times
/// and prime-time flags are left for operator edits.
pub fn schedule_weekly(draw: &mut Draw, first_round_date: NaiveDate) {
    for m in &mut draw.matches {
        m.match_date = Some(first_round_date + Duration::days(7 * (m.round as i64 - 1)));
    }
}

/// Validates the inputs and lays the teams out in circle-method slots, with
/// a trailing sentinel (`None`) when the team count is odd.
fn team_slots(teams: &[Team], rounds: u32) -> Result<Vec<Option<i64>>, SchedulerError> {
    if teams.len() < 2 {
        return Err(SchedulerError::InvalidInput(format!(
            "a round robin needs at least 2 teams, got {}",
            teams.len()
        )));
    }
    if rounds < 1 {
        return Err(SchedulerError::InvalidInput(
            "a round robin needs at least 1 round".into(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for t in teams {
        if !seen.insert(t.id) {
            return Err(SchedulerError::InvalidInput(format!(
                "duplicate team id {} in league",
                t.id
            )));
        }
    }

    let mut slots: Vec<Option<i64>> = teams.iter().map(|t| Some(t.id)).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    Ok(slots)
}

fn home_venues(teams: &[Team]) -> HashMap<i64, Option<i64>> {
    teams.iter().map(|t| (t.id, t.home_venue_id)).collect()
}

/// Walks `rounds` rounds of the circle, pairing `i` with `N'-1-i` and
/// rotating all slots but the first one step after each round.
fn build_rounds(
    mut slots: Vec<Option<i64>>,
    rounds: u32,
    venues: &HashMap<i64, Option<i64>>,
    draw: &mut Draw,
    next_id: &mut i64,
) {
    let size = slots.len();
    let cycle_len = size - 1;

    for r in 0..rounds as usize {
        let round = r as u32 + 1;
        for i in 0..size / 2 {
            let (Some(a), Some(b)) = (slots[i], slots[size - 1 - i]) else {
                // Sentinel pairing: the real team has a bye this round.
                continue;
            };

            let (home, away) = if i == 0 {
                // The fixed pairing alternates by round parity and flips once
                // per full cycle so the fixed team is not always at home when
                // the rotation repeats.
                let cycle = r / cycle_len;
                if (r % 2 == 0) ^ (cycle % 2 == 1) {
                    (a, b)
                } else {
                    (b, a)
                }
            } else if r % 2 == 0 {
                (b, a)
            } else {
                (a, b)
            };

            let mut m = Match::new(round, home, away, venues.get(&home).copied().flatten());
            m.id = *next_id;
            *next_id += 1;
            draw.matches.push(m);
        }

        // Rotate positions 1..N'-1 one step; position 0 stays fixed.
        let last = slots.pop().unwrap_or(None);
        slots.insert(1, last);
    }
}
