//! Shared helpers for the integration suites.
#![allow(dead_code)]

use chrono::Utc;
use scheduler_core::models::{Draw, Match, Team};

/// A league of `n` teams with ids 1..=n and home venues 101..=100+n.
pub fn league(n: i64) -> Vec<Team> {
    let now = Utc::now();
    (1..=n)
        .map(|id| Team {
            id,
            name: format!("Team {id}"),
            short_name: format!("T{id}"),
            city: "Sydney".into(),
            home_venue_id: Some(100 + id),
            latitude: -33.8,
            longitude: 151.2,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

/// A draw shell holding the given matches.
pub fn draw_with(matches: Vec<Match>, rounds: u32) -> Draw {
    let mut d = Draw::new("test draw", 2025, rounds);
    d.matches = matches;
    d
}
