//! Data models and configuration types for the scheduling core.
//!
//! This module contains the domain entities (venues, teams, matches, draws),
//! the persisted constraint-configuration document, the optimization
//! configuration, and the progress/result types exchanged with callers. All
//! public types are serde-serializable so they can round-trip through a
//! repository or an API layer unchanged.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// A stadium or ground where matches are played.
///
/// Venues are shared between matches by id; a match never owns its venue.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub city: String,
    /// Seated capacity. Unsigned, so the "capacity >= 0" invariant holds by
    /// construction.
    pub capacity: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Venue {
    /// Checks the venue invariants: non-empty name and city, coordinates in
    /// range.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.name.trim().is_empty() {
            return Err(SchedulerError::InvalidInput(
                "venue name must not be empty".into(),
            ));
        }
        if self.city.trim().is_empty() {
            return Err(SchedulerError::InvalidInput(
                "venue city must not be empty".into(),
            ));
        }
        validate_coordinates(self.latitude, self.longitude)
    }
}

/// A competing team.
///
/// Teams reference their home venue by id; coordinates are a placeholder for
/// travel modelling and only range-checked here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Team {
    pub id: i64,
    pub name: String,
    /// Abbreviation used in fixtures, one to three characters.
    pub short_name: String,
    pub city: String,
    pub home_venue_id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// Checks the team invariants: non-empty name/short-name/city, short
    /// name at most three characters, coordinates in range.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.name.trim().is_empty() {
            return Err(SchedulerError::InvalidInput(
                "team name must not be empty".into(),
            ));
        }
        if self.short_name.is_empty() || self.short_name.chars().count() > 3 {
            return Err(SchedulerError::InvalidInput(format!(
                "team short name must be 1..=3 characters, got {:?}",
                self.short_name
            )));
        }
        if self.city.trim().is_empty() {
            return Err(SchedulerError::InvalidInput(
                "team city must not be empty".into(),
            ));
        }
        validate_coordinates(self.latitude, self.longitude)
    }
}

fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), SchedulerError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(SchedulerError::InvalidInput(format!(
            "latitude {latitude} outside [-90, 90]"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(SchedulerError::InvalidInput(format!(
            "longitude {longitude} outside [-180, 180]"
        )));
    }
    Ok(())
}

/// An unordered pair of team ids, normalized so the smaller id comes first.
///
/// Used as a map key to detect repeat encounters between the same two teams.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Matchup(pub i64, pub i64);

impl Matchup {
    pub fn new(a: i64, b: i64) -> Self {
        if a <= b {
            Matchup(a, b)
        } else {
            Matchup(b, a)
        }
    }
}

/// A single fixture entry: two teams meeting in a round, or an explicit bye.
///
/// A bye is represented by both team references being absent. A non-bye match
/// must carry two distinct teams and an assigned venue. Teams and venues are
/// referenced by id only and never owned by the match.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Match {
    pub id: i64,
    /// Owning draw. Zero until the draw has been persisted.
    pub draw_id: i64,
    /// One-based round number.
    pub round: u32,
    pub home_team_id: Option<i64>,
    pub away_team_id: Option<i64>,
    pub venue_id: Option<i64>,
    pub match_date: Option<NaiveDate>,
    pub match_time: Option<NaiveTime>,
    pub prime_time: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// Creates a regular match between two teams.
    pub fn new(round: u32, home_team_id: i64, away_team_id: i64, venue_id: Option<i64>) -> Self {
        let now = Utc::now();
        Match {
            id: 0,
            draw_id: 0,
            round,
            home_team_id: Some(home_team_id),
            away_team_id: Some(away_team_id),
            venue_id,
            match_date: None,
            match_time: None,
            prime_time: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates an explicit bye entry for a round.
    pub fn bye(round: u32) -> Self {
        let now = Utc::now();
        Match {
            id: 0,
            draw_id: 0,
            round,
            home_team_id: None,
            away_team_id: None,
            venue_id: None,
            match_date: None,
            match_time: None,
            prime_time: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when both team references are absent.
    pub fn is_bye(&self) -> bool {
        self.home_team_id.is_none() && self.away_team_id.is_none()
    }

    /// The normalized unordered team pair, when both teams are present.
    pub fn matchup(&self) -> Option<Matchup> {
        match (self.home_team_id, self.away_team_id) {
            (Some(h), Some(a)) => Some(Matchup::new(h, a)),
            _ => None,
        }
    }

    /// True when the given team plays in this match.
    pub fn involves(&self, team_id: i64) -> bool {
        self.home_team_id == Some(team_id) || self.away_team_id == Some(team_id)
    }

    /// Kickoff instant for rest calculations: the match date combined with
    /// the match time, midnight when no time is set. `None` for undated
    /// matches.
    pub fn kickoff(&self) -> Option<chrono::NaiveDateTime> {
        self.match_date
            .map(|d| d.and_time(self.match_time.unwrap_or(NaiveTime::MIN)))
    }

    /// Checks the structural match invariants.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.round < 1 {
            return Err(SchedulerError::InvalidInput(format!(
                "match {} has round {}, rounds start at 1",
                self.id, self.round
            )));
        }
        match (self.home_team_id, self.away_team_id) {
            (None, None) => Ok(()),
            (Some(h), Some(a)) => {
                if h == a {
                    return Err(SchedulerError::InvalidInput(format!(
                        "match {} pairs team {h} against itself",
                        self.id
                    )));
                }
                if self.venue_id.is_none() {
                    return Err(SchedulerError::InvalidInput(format!(
                        "match {} has two teams but no venue",
                        self.id
                    )));
                }
                Ok(())
            }
            _ => Err(SchedulerError::InvalidInput(format!(
                "match {} has exactly one team set; a match needs both or neither",
                self.id
            ))),
        }
    }
}

/// Lifecycle state of a draw.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DrawStatus {
    Draft,
    Optimizing,
    Completed,
}

/// A full season fixture: a named set of rounds with their matches.
///
/// The draw exclusively owns its matches (deleting a draw deletes them);
/// cloning a draw deep-copies the match collection and nothing else, since
/// teams and venues are id references. The embedded constraint configuration
/// is kept opaque here and interpreted by the constraint factory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Draw {
    pub id: i64,
    pub name: String,
    pub season_year: i32,
    /// Total rounds in the fixture, 1..=52.
    pub rounds: u32,
    pub status: DrawStatus,
    /// Persisted constraint configuration document, see
    /// [`ConstraintSetConfig`](crate::models::ConstraintSetConfig).
    pub constraint_config: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub matches: Vec<Match>,
}

impl Draw {
    /// Creates an empty draft draw.
    pub fn new(name: impl Into<String>, season_year: i32, rounds: u32) -> Self {
        let now = Utc::now();
        Draw {
            id: 0,
            name: name.into(),
            season_year,
            rounds,
            status: DrawStatus::Draft,
            constraint_config: None,
            created_at: now,
            updated_at: now,
            matches: Vec::new(),
        }
    }

    /// Distinct ids of all teams appearing in the fixture, sorted.
    pub fn team_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .matches
            .iter()
            .flat_map(|m| [m.home_team_id, m.away_team_id])
            .flatten()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// All matches scheduled in the given round, byes included.
    pub fn matches_in_round(&self, round: u32) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    /// All matches the given team plays in, ordered by round.
    pub fn matches_for_team(&self, team_id: i64) -> Vec<&Match> {
        let mut out: Vec<&Match> = self
            .matches
            .iter()
            .filter(|m| m.involves(team_id))
            .collect();
        out.sort_by_key(|m| m.round);
        out
    }

    /// Matches with two teams assigned (explicit byes filtered out).
    pub fn regular_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| !m.is_bye())
    }

    /// Formats the fixture round by round for logs and terminals.
    ///
    /// Teams and venues are shown by id; resolving names is the caller's
    /// concern (the core never holds the entities themselves).
    pub fn display(&self) -> String {
        let mut out = String::new();
        for round in 1..=self.rounds {
            out.push_str(&format!("========== ROUND {round} ==========\n"));
            for m in self.matches_in_round(round) {
                if m.is_bye() {
                    out.push_str("bye\n");
                    continue;
                }
                let home = m.home_team_id.unwrap_or_default();
                let away = m.away_team_id.unwrap_or_default();
                out.push_str(&format!("team {home} v team {away}"));
                if let Some(venue) = m.venue_id {
                    out.push_str(&format!(" @ venue {venue}"));
                }
                if let Some(date) = m.match_date {
                    out.push_str(&format!(" on {date}"));
                }
                if m.prime_time {
                    out.push_str(" (prime time)");
                }
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// Checks the draw invariants and every owned match.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.name.trim().is_empty() {
            return Err(SchedulerError::InvalidInput(
                "draw name must not be empty".into(),
            ));
        }
        if !(2000..=2100).contains(&self.season_year) {
            return Err(SchedulerError::InvalidInput(format!(
                "season year {} outside [2000, 2100]",
                self.season_year
            )));
        }
        if !(1..=52).contains(&self.rounds) {
            return Err(SchedulerError::InvalidInput(format!(
                "round count {} outside [1, 52]",
                self.rounds
            )));
        }
        for m in &self.matches {
            m.validate()?;
            if m.round > self.rounds {
                return Err(SchedulerError::InvalidInput(format!(
                    "match {} is in round {} but the draw has {} rounds",
                    m.id, m.round, self.rounds
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Constraint configuration document
// ---------------------------------------------------------------------------

/// One rule entry of the constraint configuration document.
///
/// Serialized as `{ "type": "<kind>", "params": { ... } }`. Unknown kinds and
/// malformed params fail deserialization and are surfaced as `InvalidInput`
/// by the constraint factory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum RuleConfig {
    VenueAvailability {
        venue_id: i64,
        unavailable_dates: Vec<NaiveDate>,
    },
    TeamAvailability {
        team_id: i64,
        unavailable_dates: Vec<NaiveDate>,
    },
    ByeConstraint,
    DoubleUp {
        min_rounds_separation: u32,
    },
    TravelMinimization {
        max_consecutive_away: u32,
    },
    RestPeriod {
        min_rest_days: i64,
    },
    PrimeTimeSpread {
        target_ratio: f64,
        max_deviation: f64,
    },
    HomeAwayBalance {
        max_deviation: f64,
    },
}

impl RuleConfig {
    /// Whether this rule kind belongs in the hard section of a document.
    pub fn is_hard_kind(&self) -> bool {
        matches!(
            self,
            RuleConfig::VenueAvailability { .. }
                | RuleConfig::TeamAvailability { .. }
                | RuleConfig::ByeConstraint
                | RuleConfig::DoubleUp { .. }
        )
    }
}

/// A soft rule entry: a rule plus its weight in the weighted mean.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SoftRuleConfig {
    #[serde(flatten)]
    pub rule: RuleConfig,
    #[serde(default = "default_soft_weight")]
    pub weight: f64,
}

fn default_soft_weight() -> f64 {
    1.0
}

/// The constraint configuration document persisted with each draw.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ConstraintSetConfig {
    #[serde(default)]
    pub hard: Vec<RuleConfig>,
    #[serde(default)]
    pub soft: Vec<SoftRuleConfig>,
}

// ---------------------------------------------------------------------------
// Optimization configuration
// ---------------------------------------------------------------------------

/// Cooling schedule selection, part of the optimization config.
///
/// An unrecognized `type` falls back to exponential cooling at rate 0.99.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CoolingScheduleConfig {
    #[serde(rename = "type", default = "default_schedule_type")]
    pub schedule_type: String,
    #[serde(default = "default_cooling_rate")]
    pub cooling_rate: f64,
    #[serde(default = "default_scaling_factor")]
    pub scaling_factor: f64,
    #[serde(default = "default_reheat_factor")]
    pub reheat_factor: f64,
    #[serde(default = "default_reheat_period")]
    pub reheat_period: u64,
    #[serde(default = "default_acceptance_target")]
    pub acceptance_target: f64,
    #[serde(default = "default_adaptation_factor")]
    pub adaptation_factor: f64,
}

impl Default for CoolingScheduleConfig {
    fn default() -> Self {
        CoolingScheduleConfig {
            schedule_type: default_schedule_type(),
            cooling_rate: default_cooling_rate(),
            scaling_factor: default_scaling_factor(),
            reheat_factor: default_reheat_factor(),
            reheat_period: default_reheat_period(),
            acceptance_target: default_acceptance_target(),
            adaptation_factor: default_adaptation_factor(),
        }
    }
}

fn default_schedule_type() -> String {
    "exponential".to_string()
}
fn default_cooling_rate() -> f64 {
    0.99
}
fn default_scaling_factor() -> f64 {
    1.0
}
fn default_reheat_factor() -> f64 {
    1.5
}
fn default_reheat_period() -> u64 {
    1000
}
fn default_acceptance_target() -> f64 {
    0.3
}
fn default_adaptation_factor() -> f64 {
    0.05
}

/// Parameters for a simulated-annealing run.
///
/// When `cooling_schedule` is absent, the top-level `cooling_rate` drives an
/// exponential schedule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OptimizationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_cooling_rate")]
    pub cooling_rate: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    #[serde(default)]
    pub cooling_schedule: Option<CoolingScheduleConfig>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        OptimizationConfig {
            temperature: default_temperature(),
            cooling_rate: default_cooling_rate(),
            max_iterations: default_max_iterations(),
            cooling_schedule: None,
        }
    }
}

fn default_temperature() -> f64 {
    100.0
}
fn default_max_iterations() -> u64 {
    10_000
}

// ---------------------------------------------------------------------------
// Progress and results
// ---------------------------------------------------------------------------

/// Progress snapshot emitted by the optimizer every 100 iterations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Zero-based iteration the snapshot was taken at.
    pub iteration: u64,
    pub max_iterations: u64,
    pub temperature: f64,
    pub current_score: f64,
    pub best_score: f64,
    /// Accepted moves divided by iterations attempted so far.
    pub acceptance_rate: f64,
    /// Linear extrapolation of the remaining wall time.
    pub estimated_remaining_secs: f64,
}

/// Callback invoked with progress snapshots during optimization.
///
/// Returning `false` requests cooperative termination: the optimizer stops at
/// the next emission boundary and returns the best fixture found so far.
pub type ProgressCallback = Box<dyn Fn(&ProgressUpdate) -> bool + Send>;

/// The result of a completed (or cooperatively stopped) optimization run.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OptimizationOutcome {
    pub initial_score: f64,
    /// Score of `best_draw`; never below `initial_score`.
    pub final_score: f64,
    /// The configured iteration budget of the run.
    pub iterations: u64,
    /// Number of strictly improving moves accepted.
    pub improvements: u64,
    pub duration_seconds: f64,
    pub best_draw: Draw,
}
