//! Composition of hard and weighted soft rules into a fixture judge.

use log::debug;
use serde::Serialize;

use super::{Constraint, Violation};
use crate::error::SchedulerError;
use crate::models::{Draw, Match};

/// Severity of an analysis finding.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A hard rule failed on a concrete match.
    Hard,
    /// A soft rule scores poorly over the whole draw.
    Soft,
    /// A hard rule holds but its whole-draw score is degraded.
    Warning,
}

/// One finding of [`ConstraintEngine::analyze_draw`].
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AnalysisItem {
    pub rule: String,
    pub match_id: Option<i64>,
    pub round: Option<u32>,
    pub description: String,
    pub severity: Severity,
}

/// Hard score threshold below which a warning finding is added.
const WARNING_THRESHOLD: f64 = 0.5;
/// Soft score threshold below which a soft finding is added.
const SOFT_THRESHOLD: f64 = 0.3;

/// One soft rule's contribution to the weighted mean.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RuleScore {
    pub rule: String,
    pub weight: f64,
    pub score: f64,
}

/// Per-rule breakdown of a draw's score.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    /// The overall draw score, zero when any hard rule fails.
    pub total: f64,
    pub hard_violations: usize,
    pub soft: Vec<RuleScore>,
}

impl std::fmt::Display for ScoreBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "score {:.4} ({} hard violation(s))",
            self.total, self.hard_violations
        )?;
        for entry in &self.soft {
            writeln!(
                f,
                "  {:<24} {:.4} (weight {:.2})",
                entry.rule, entry.score, entry.weight
            )?;
        }
        Ok(())
    }
}

/// An ordered set of hard rules and weighted soft rules.
///
/// The engine holds no draw state; every operation takes the draw to judge.
/// Jobs therefore share nothing through it and each optimization run can own
/// its engine outright.
#[derive(Default)]
pub struct ConstraintEngine {
    hard: Vec<Box<dyn Constraint>>,
    soft: Vec<(Box<dyn Constraint>, f64)>,
}

impl ConstraintEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hard(&mut self, rule: Box<dyn Constraint>) {
        self.hard.push(rule);
    }

    /// Adds a weighted soft rule. The weight must lie in [0, 1].
    pub fn add_soft(&mut self, rule: Box<dyn Constraint>, weight: f64) -> Result<(), SchedulerError> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(SchedulerError::InvalidInput(format!(
                "soft constraint weight {weight} outside [0, 1] for rule {}",
                rule.name()
            )));
        }
        self.soft.push((rule, weight));
        Ok(())
    }

    pub fn hard_rules(&self) -> impl Iterator<Item = &dyn Constraint> {
        self.hard.iter().map(|r| r.as_ref())
    }

    pub fn soft_rules(&self) -> impl Iterator<Item = (&dyn Constraint, f64)> {
        self.soft.iter().map(|(r, w)| (r.as_ref(), *w))
    }

    /// Runs the hard rules against one match, short-circuiting on the first
    /// failure.
    pub fn validate_match(&self, m: &Match, draw: &Draw) -> Option<Violation> {
        self.hard.iter().find_map(|rule| rule.validate(m, draw))
    }

    /// Collects every hard failure across the whole draw. Soft rules never
    /// contribute here.
    pub fn validate_draw(&self, draw: &Draw) -> Vec<Violation> {
        let mut failures = Vec::new();
        for m in &draw.matches {
            for rule in &self.hard {
                if let Some(v) = rule.validate(m, draw) {
                    failures.push(v);
                }
            }
        }
        failures
    }

    /// Scores the draw on [0, 1].
    ///
    /// Any hard violation zeroes the score. Otherwise the score is the
    /// weighted mean of the soft rule scores, or 1.0 when no weight is in
    /// play.
    pub fn score_draw(&self, draw: &Draw) -> f64 {
        let has_hard_violation = draw
            .matches
            .iter()
            .any(|m| self.validate_match(m, draw).is_some());
        if has_hard_violation {
            return 0.0;
        }

        let total_weight: f64 = self.soft.iter().map(|(_, w)| w).sum();
        if total_weight == 0.0 {
            return 1.0;
        }
        let weighted: f64 = self
            .soft
            .iter()
            .map(|(rule, w)| w * rule.score(draw))
            .sum();
        weighted / total_weight
    }

    /// Per-rule score breakdown of a draw, useful for logs and progress
    /// payloads.
    pub fn score_breakdown(&self, draw: &Draw) -> ScoreBreakdown {
        let hard_violations = self.validate_draw(draw).len();
        let entries: Vec<RuleScore> = self
            .soft
            .iter()
            .map(|(rule, weight)| RuleScore {
                rule: rule.name().to_string(),
                weight: *weight,
                score: rule.score(draw),
            })
            .collect();
        ScoreBreakdown {
            total: self.score_draw(draw),
            hard_violations,
            soft: entries,
        }
    }

    /// Produces a human-oriented report of hard failures, degraded hard
    /// scores and weak soft scores.
    pub fn analyze_draw(&self, draw: &Draw) -> Vec<AnalysisItem> {
        let mut items: Vec<AnalysisItem> = self
            .validate_draw(draw)
            .into_iter()
            .map(|v| AnalysisItem {
                rule: v.rule,
                match_id: v.match_id,
                round: v.round,
                description: v.message,
                severity: Severity::Hard,
            })
            .collect();

        for rule in &self.hard {
            let score = rule.score(draw);
            if score < WARNING_THRESHOLD {
                items.push(AnalysisItem {
                    rule: rule.name().to_string(),
                    match_id: None,
                    round: None,
                    description: format!(
                        "{} scores {score:.2} across the draw",
                        rule.description()
                    ),
                    severity: Severity::Warning,
                });
            }
        }

        for (rule, _) in &self.soft {
            let score = rule.score(draw);
            if score < SOFT_THRESHOLD {
                items.push(AnalysisItem {
                    rule: rule.name().to_string(),
                    match_id: None,
                    round: None,
                    description: format!(
                        "{} scores {score:.2} across the draw",
                        rule.description()
                    ),
                    severity: Severity::Soft,
                });
            }
        }

        debug!(
            "analysis of draw {}: {} finding(s) over {} matches",
            draw.id,
            items.len(),
            draw.matches.len()
        );
        items
    }
}
