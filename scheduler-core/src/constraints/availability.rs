//! Availability rules: venues and teams blocked on calendar days.

use chrono::NaiveDate;

use super::{Constraint, DateSet, RuleBase, Violation};
use crate::models::{Draw, Match};

/// Hard rule: no match at the venue on any of its blocked days.
#[derive(Debug, Clone)]
pub struct VenueAvailability {
    base: RuleBase,
    venue_id: i64,
    blocked: DateSet,
}

impl VenueAvailability {
    pub fn new(venue_id: i64, unavailable_dates: Vec<NaiveDate>) -> Self {
        VenueAvailability {
            base: RuleBase::new(
                "venue_availability",
                format!(
                    "venue {venue_id} is unavailable on {} day(s)",
                    unavailable_dates.len()
                ),
                true,
            ),
            venue_id,
            blocked: DateSet::new(unavailable_dates),
        }
    }

    fn blocks(&self, m: &Match) -> bool {
        m.venue_id == Some(self.venue_id)
            && m.match_date.is_some_and(|d| self.blocked.matches(d))
    }
}

impl Constraint for VenueAvailability {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn is_hard(&self) -> bool {
        self.base.hard
    }

    fn validate(&self, m: &Match, _draw: &Draw) -> Option<Violation> {
        if self.blocks(m) {
            return Some(Violation::for_match(
                self.name(),
                m,
                format!(
                    "venue {} is unavailable on {}",
                    self.venue_id,
                    m.match_date.unwrap_or_default()
                ),
            ));
        }
        None
    }

    /// Fraction of the venue's matches whose dates avoid the blocked days.
    /// Undated matches cannot collide and count as fine.
    fn score(&self, draw: &Draw) -> f64 {
        let at_venue: Vec<&Match> = draw
            .regular_matches()
            .filter(|m| m.venue_id == Some(self.venue_id))
            .collect();
        if at_venue.is_empty() {
            return 1.0;
        }
        let ok = at_venue.iter().filter(|m| !self.blocks(m)).count();
        ok as f64 / at_venue.len() as f64
    }
}

/// Hard rule: the team plays no dated match on any of its blocked days.
#[derive(Debug, Clone)]
pub struct TeamAvailability {
    base: RuleBase,
    team_id: i64,
    blocked: DateSet,
}

impl TeamAvailability {
    pub fn new(team_id: i64, unavailable_dates: Vec<NaiveDate>) -> Self {
        TeamAvailability {
            base: RuleBase::new(
                "team_availability",
                format!(
                    "team {team_id} is unavailable on {} day(s)",
                    unavailable_dates.len()
                ),
                true,
            ),
            team_id,
            blocked: DateSet::new(unavailable_dates),
        }
    }

    fn blocks(&self, m: &Match) -> bool {
        m.involves(self.team_id) && m.match_date.is_some_and(|d| self.blocked.matches(d))
    }
}

impl Constraint for TeamAvailability {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn is_hard(&self) -> bool {
        self.base.hard
    }

    fn validate(&self, m: &Match, _draw: &Draw) -> Option<Violation> {
        if self.blocks(m) {
            return Some(Violation::for_match(
                self.name(),
                m,
                format!(
                    "team {} is unavailable on {}",
                    self.team_id,
                    m.match_date.unwrap_or_default()
                ),
            ));
        }
        None
    }

    /// Fraction of the team's dated matches that avoid the blocked days.
    fn score(&self, draw: &Draw) -> f64 {
        let dated: Vec<&Match> = draw
            .matches_for_team(self.team_id)
            .into_iter()
            .filter(|m| m.match_date.is_some())
            .collect();
        if dated.is_empty() {
            return 1.0;
        }
        let ok = dated.iter().filter(|m| !self.blocks(m)).count();
        ok as f64 / dated.len() as f64
    }
}
