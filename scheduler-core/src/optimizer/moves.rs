//! Neighbour moves: small reversible transformations of a draw.
//!
//! Each move mutates the draw in place and is bounded-retry: after 50 failed
//! attempts to find a valid target it reports a [`MoveFailure`] and leaves
//! the draw untouched. The move set is closed under the structural match
//! invariants, so a neighbour can never contain a self-pairing or a
//! venue-less non-bye.

use rand::rngs::StdRng;
use rand::Rng;
use thiserror::Error;

use crate::models::Draw;

/// Retry budget per move.
const MAX_ATTEMPTS: usize = 50;

/// The available neighbour transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Swap the round numbers of two matches from different rounds.
    SwapMatches,
    /// Move one match to a different round, uniform over 1..=R.
    RescheduleMatch,
    /// Swap the venues of two matches that both have one.
    SwapVenues,
    /// Swap home and away of one match.
    SwapHomeAway,
}

/// A move could not find a valid target within the retry budget.
///
/// Internal to the optimizer: the iteration is skipped and the loop carries
/// on.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no valid target for {kind:?} within the retry budget")]
pub struct MoveFailure {
    pub kind: MoveKind,
}

/// Applies one uniformly chosen move to the draw.
pub fn apply_random_move(draw: &mut Draw, rng: &mut StdRng) -> Result<MoveKind, MoveFailure> {
    let kind = match rng.random_range(0..4) {
        0 => MoveKind::SwapMatches,
        1 => MoveKind::RescheduleMatch,
        2 => MoveKind::SwapVenues,
        _ => MoveKind::SwapHomeAway,
    };
    apply_move(draw, kind, rng)?;
    Ok(kind)
}

/// Applies the given move to the draw.
pub fn apply_move(draw: &mut Draw, kind: MoveKind, rng: &mut StdRng) -> Result<(), MoveFailure> {
    match kind {
        MoveKind::SwapMatches => swap_matches(draw, rng),
        MoveKind::RescheduleMatch => reschedule_match(draw, rng),
        MoveKind::SwapVenues => swap_venues(draw, rng),
        MoveKind::SwapHomeAway => swap_home_away(draw, rng),
    }
}

/// Indices of the non-bye matches.
fn regular_indices(draw: &Draw) -> Vec<usize> {
    draw.matches
        .iter()
        .enumerate()
        .filter(|(_, m)| !m.is_bye())
        .map(|(i, _)| i)
        .collect()
}

fn swap_matches(draw: &mut Draw, rng: &mut StdRng) -> Result<(), MoveFailure> {
    let candidates = regular_indices(draw);
    let failure = MoveFailure {
        kind: MoveKind::SwapMatches,
    };
    if candidates.len() < 2 {
        return Err(failure);
    }
    for _ in 0..MAX_ATTEMPTS {
        let a = candidates[rng.random_range(0..candidates.len())];
        let b = candidates[rng.random_range(0..candidates.len())];
        if draw.matches[a].round != draw.matches[b].round {
            let round_a = draw.matches[a].round;
            draw.matches[a].round = draw.matches[b].round;
            draw.matches[b].round = round_a;
            return Ok(());
        }
    }
    Err(failure)
}

fn reschedule_match(draw: &mut Draw, rng: &mut StdRng) -> Result<(), MoveFailure> {
    let candidates = regular_indices(draw);
    let failure = MoveFailure {
        kind: MoveKind::RescheduleMatch,
    };
    if candidates.is_empty() || draw.rounds < 2 {
        return Err(failure);
    }
    for _ in 0..MAX_ATTEMPTS {
        let idx = candidates[rng.random_range(0..candidates.len())];
        let round = rng.random_range(1..=draw.rounds);
        if round != draw.matches[idx].round {
            draw.matches[idx].round = round;
            return Ok(());
        }
    }
    Err(failure)
}

fn swap_venues(draw: &mut Draw, rng: &mut StdRng) -> Result<(), MoveFailure> {
    let candidates: Vec<usize> = draw
        .matches
        .iter()
        .enumerate()
        .filter(|(_, m)| !m.is_bye() && m.venue_id.is_some())
        .map(|(i, _)| i)
        .collect();
    let failure = MoveFailure {
        kind: MoveKind::SwapVenues,
    };
    if candidates.len() < 2 {
        return Err(failure);
    }
    for _ in 0..MAX_ATTEMPTS {
        let a = candidates[rng.random_range(0..candidates.len())];
        let b = candidates[rng.random_range(0..candidates.len())];
        if a != b {
            let venue_a = draw.matches[a].venue_id;
            draw.matches[a].venue_id = draw.matches[b].venue_id;
            draw.matches[b].venue_id = venue_a;
            return Ok(());
        }
    }
    Err(failure)
}

fn swap_home_away(draw: &mut Draw, rng: &mut StdRng) -> Result<(), MoveFailure> {
    let candidates: Vec<usize> = draw
        .matches
        .iter()
        .enumerate()
        .filter(|(_, m)| m.home_team_id.is_some() && m.away_team_id.is_some())
        .map(|(i, _)| i)
        .collect();
    if candidates.is_empty() {
        return Err(MoveFailure {
            kind: MoveKind::SwapHomeAway,
        });
    }
    let idx = candidates[rng.random_range(0..candidates.len())];
    let m = &mut draw.matches[idx];
    std::mem::swap(&mut m.home_team_id, &mut m.away_team_id);
    Ok(())
}
