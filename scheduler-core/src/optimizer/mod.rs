//! Simulated-annealing optimization of a draw.
//!
//! The optimizer walks the neighbourhood defined in [`moves`]: each
//! iteration deep-copies the current fixture, applies one random move and
//! accepts or rejects the neighbour with the Metropolis criterion. Hard
//! rule violations are never rejected outright — they surface as zero
//! scores, so the search can pass through infeasible fixtures and climb
//! back out. Soft-rule improvement is the primary signal.

pub mod cooling;
pub mod moves;

pub use cooling::CoolingSchedule;
pub use moves::{apply_move, apply_random_move, MoveFailure, MoveKind};

use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constraints::ConstraintEngine;
use crate::error::SchedulerError;
use crate::models::{Draw, OptimizationConfig, OptimizationOutcome, ProgressCallback, ProgressUpdate};

/// Iterations between progress emissions.
const PROGRESS_INTERVAL: u64 = 100;

#[derive(Debug, Default, Clone, Copy)]
struct MoveCounter {
    tried: u64,
    accepted: u64,
}

/// Per-move-kind counters, logged at the end of a run for tuning.
#[derive(Debug, Default, Clone)]
struct MoveStats {
    swap_matches: MoveCounter,
    reschedule: MoveCounter,
    swap_venues: MoveCounter,
    swap_home_away: MoveCounter,
    failures: u64,
}

impl MoveStats {
    fn record(&mut self, kind: MoveKind, accepted: bool) {
        let counter = match kind {
            MoveKind::SwapMatches => &mut self.swap_matches,
            MoveKind::RescheduleMatch => &mut self.reschedule,
            MoveKind::SwapVenues => &mut self.swap_venues,
            MoveKind::SwapHomeAway => &mut self.swap_home_away,
        };
        counter.tried += 1;
        if accepted {
            counter.accepted += 1;
        }
    }
}

/// A configured simulated-annealing optimizer.
///
/// The optimizer itself is immutable across runs; all run state (current and
/// best fixture, counters, RNG) lives on the stack of [`optimize`], so one
/// instance can serve concurrent jobs if shared.
///
/// [`optimize`]: SimulatedAnnealing::optimize
pub struct SimulatedAnnealing {
    /// Base temperature. Schedules recompute from this every iteration; it
    /// is never decayed in place.
    pub initial_temperature: f64,
    pub max_iterations: u64,
    schedule: CoolingSchedule,
}

impl SimulatedAnnealing {
    pub fn new(initial_temperature: f64, schedule: CoolingSchedule, max_iterations: u64) -> Self {
        SimulatedAnnealing {
            initial_temperature,
            max_iterations,
            schedule,
        }
    }

    pub fn from_config(cfg: &OptimizationConfig) -> Self {
        SimulatedAnnealing {
            initial_temperature: cfg.temperature,
            max_iterations: cfg.max_iterations,
            schedule: CoolingSchedule::from_optimization_config(cfg),
        }
    }

    /// Runs the annealing loop with an RNG seeded from the OS.
    pub fn optimize(
        &self,
        engine: &ConstraintEngine,
        draw: &Draw,
        progress: Option<&ProgressCallback>,
    ) -> Result<OptimizationOutcome, SchedulerError> {
        self.optimize_seeded(engine, draw, progress, None)
    }

    /// Runs the annealing loop, optionally with an explicit RNG seed for
    /// reproducible runs.
    ///
    /// Progress is emitted at the end of every 100th iteration, after that
    /// iteration's accept/reject decision and temperature recompute, so the
    /// record describes the state the iteration actually produced. An
    /// iteration skipped on a failed move emits nothing. A callback
    /// returning `false` stops the run cooperatively at the next emission
    /// boundary; in-flight iterations always complete.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the draw has no matches to optimize.
    pub fn optimize_seeded(
        &self,
        engine: &ConstraintEngine,
        draw: &Draw,
        progress: Option<&ProgressCallback>,
        seed: Option<u64>,
    ) -> Result<OptimizationOutcome, SchedulerError> {
        if draw.matches.is_empty() {
            return Err(SchedulerError::InvalidInput(
                "cannot optimize a draw without matches".into(),
            ));
        }

        let start = Instant::now();
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        let mut schedule = self.schedule.clone();

        let mut current = draw.clone();
        let initial_score = engine.score_draw(&current);
        let mut current_score = initial_score;
        let mut best = current.clone();
        let mut best_score = current_score;

        let mut temperature = self.initial_temperature;
        let mut acceptances: u64 = 0;
        let mut improvements: u64 = 0;
        let mut move_stats = MoveStats::default();

        debug!(
            "optimizing draw {}: {} matches, initial score {initial_score:.4}, {} iterations",
            draw.id,
            draw.matches.len(),
            self.max_iterations
        );

        for i in 0..self.max_iterations {
            let mut neighbor = current.clone();
            let kind = match apply_random_move(&mut neighbor, &mut rng) {
                Ok(kind) => kind,
                Err(_) => {
                    // No valid target for the chosen move: skip the
                    // iteration.
                    move_stats.failures += 1;
                    continue;
                }
            };

            let neighbor_score = engine.score_draw(&neighbor);

            // Metropolis criterion. Equal scores count as "not better": they
            // can still be accepted through the probabilistic branch but
            // never as an improvement.
            let accepted = if neighbor_score > current_score {
                improvements += 1;
                true
            } else if temperature > 0.0 {
                let delta = neighbor_score - current_score;
                rng.random::<f64>() < (delta / temperature).exp()
            } else {
                false
            };

            move_stats.record(kind, accepted);
            if accepted {
                acceptances += 1;
                current = neighbor;
                current_score = neighbor_score;
                if current_score > best_score {
                    best_score = current_score;
                    best = current.clone();
                }
            }

            // The schedule recomputes from the base temperature with the
            // zero-based iteration index.
            temperature = schedule.next(self.initial_temperature, i);

            // Progress and acceptance feedback come last so the record (and
            // the adaptive rate adjustment) reflect the iteration just
            // processed, counters and temperature included.
            if i % PROGRESS_INTERVAL == 0 {
                let acceptance_rate = acceptances as f64 / (i + 1) as f64;
                schedule.observe_acceptance(acceptance_rate);
                if let Some(callback) = progress {
                    let update = self.progress_update(
                        i,
                        temperature,
                        current_score,
                        best_score,
                        acceptance_rate,
                        start,
                    );
                    if !callback(&update) {
                        debug!("optimization of draw {} stopped by callback at iteration {i}", draw.id);
                        break;
                    }
                }
            }
        }

        let duration_seconds = start.elapsed().as_secs_f64();
        if let Some(callback) = progress {
            let acceptance_rate = acceptances as f64 / self.max_iterations.max(1) as f64;
            let final_update = self.progress_update(
                self.max_iterations,
                temperature,
                current_score,
                best_score,
                acceptance_rate,
                start,
            );
            // The run is over either way; the return value no longer matters.
            callback(&final_update);
        }

        info!(
            "optimization of draw {} finished: {initial_score:.4} -> {best_score:.4}, {improvements} improvement(s) in {duration_seconds:.2}s",
            draw.id
        );
        debug!("move statistics for draw {}: {move_stats:?}", draw.id);

        Ok(OptimizationOutcome {
            initial_score,
            final_score: best_score,
            iterations: self.max_iterations,
            improvements,
            duration_seconds,
            best_draw: best,
        })
    }

    fn progress_update(
        &self,
        iteration: u64,
        temperature: f64,
        current_score: f64,
        best_score: f64,
        acceptance_rate: f64,
        start: Instant,
    ) -> ProgressUpdate {
        let elapsed = start.elapsed().as_secs_f64();
        let remaining = (self.max_iterations - iteration.min(self.max_iterations)) as f64;
        ProgressUpdate {
            iteration,
            max_iterations: self.max_iterations,
            temperature,
            current_score,
            best_score,
            acceptance_rate,
            estimated_remaining_secs: elapsed * remaining / (iteration + 1) as f64,
        }
    }
}

/// Derives a starting configuration from the fixture itself.
///
/// Samples a handful of random neighbours to estimate the typical score
/// delta and picks a base temperature at which roughly 80% of worsening
/// moves would initially be accepted; the iteration budget scales with the
/// fixture size. Sampling uses a fixed seed so the recommendation is stable
/// for a given draw.
///
/// # Errors
///
/// `InvalidInput` when the draw has no matches.
pub fn recommended_config(
    engine: &ConstraintEngine,
    draw: &Draw,
) -> Result<OptimizationConfig, SchedulerError> {
    if draw.matches.is_empty() {
        return Err(SchedulerError::InvalidInput(
            "cannot derive settings for a draw without matches".into(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let base = engine.score_draw(draw);
    let mut deltas = Vec::new();
    for _ in 0..32 {
        let mut neighbor = draw.clone();
        if apply_random_move(&mut neighbor, &mut rng).is_ok() {
            let delta = (engine.score_draw(&neighbor) - base).abs();
            if delta > 0.0 {
                deltas.push(delta);
            }
        }
    }
    let mean_delta = if deltas.is_empty() {
        // A flat landscape near the seed; fall back to a small kick.
        0.05
    } else {
        deltas.iter().sum::<f64>() / deltas.len() as f64
    };

    // exp(-mean_delta / t) = 0.8 solved for t.
    let temperature = (mean_delta / (1.0f64 / 0.8).ln()).max(0.05);
    let max_iterations =
        (draw.matches.len() as u64 * draw.rounds as u64 * 100).clamp(10_000, 200_000);

    Ok(OptimizationConfig {
        temperature,
        cooling_rate: 0.995,
        max_iterations,
        cooling_schedule: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{self, TravelMinimization};
    use crate::models::Match;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    fn draw_with(matches: Vec<Match>, rounds: u32) -> Draw {
        let mut d = Draw::new("test", 2025, rounds);
        d.matches = matches;
        d
    }

    fn away_heavy_draw() -> Draw {
        // Team 1 is away four rounds in a row.
        draw_with(
            vec![
                Match::new(1, 2, 1, Some(20)),
                Match::new(2, 3, 1, Some(30)),
                Match::new(3, 4, 1, Some(40)),
                Match::new(4, 5, 1, Some(50)),
            ],
            4,
        )
    }

    fn travel_engine() -> ConstraintEngine {
        let mut engine = ConstraintEngine::new();
        engine
            .add_soft(Box::new(TravelMinimization::new(2)), 1.0)
            .unwrap();
        engine
    }

    #[test]
    fn empty_draw_is_rejected() {
        let sa = SimulatedAnnealing::from_config(&OptimizationConfig::default());
        let engine = ConstraintEngine::new();
        let d = Draw::new("empty", 2025, 3);
        assert!(matches!(
            sa.optimize(&engine, &d, None),
            Err(SchedulerError::InvalidInput(_))
        ));
    }

    #[test]
    fn annealing_never_loses_ground() {
        // S5: the away-heavy fixture must not get worse under a soft travel
        // rule, and the swap-home-away move makes improvements reachable.
        let engine = travel_engine();
        let draw = away_heavy_draw();
        let sa = SimulatedAnnealing::new(
            50.0,
            CoolingSchedule::Exponential { rate: 0.98 },
            200,
        );
        let outcome = sa.optimize_seeded(&engine, &draw, None, Some(7)).unwrap();
        assert!(outcome.final_score >= outcome.initial_score);
        assert!(outcome.improvements >= 1);
        assert!(outcome.initial_score < 1.0);
        // The input draw is untouched.
        assert_eq!(draw.matches[0].round, 1);
    }

    #[test]
    fn best_draw_scores_the_reported_final_score() {
        let engine = travel_engine();
        let draw = away_heavy_draw();
        let sa = SimulatedAnnealing::new(
            50.0,
            CoolingSchedule::Exponential { rate: 0.98 },
            300,
        );
        let outcome = sa.optimize_seeded(&engine, &draw, None, Some(3)).unwrap();
        let rescored = engine.score_draw(&outcome.best_draw);
        assert!((rescored - outcome.final_score).abs() < 1e-12);
    }

    #[test]
    fn zero_temperature_only_accepts_improvements() {
        // With the base temperature at 0 the probabilistic branch is dead
        // code: only strictly better neighbours are ever accepted.
        let engine = travel_engine();
        let draw = away_heavy_draw();
        let sa = SimulatedAnnealing::new(
            0.0,
            CoolingSchedule::Linear { rate: 1.0 },
            500,
        );
        let outcome = sa.optimize_seeded(&engine, &draw, None, Some(11)).unwrap();
        // Nothing to assert beyond monotonicity: the best score can only
        // move up.
        assert!(outcome.final_score >= outcome.initial_score);
    }

    #[test]
    fn progress_is_emitted_every_hundred_iterations() {
        let engine = travel_engine();
        let draw = away_heavy_draw();
        let sa = SimulatedAnnealing::new(
            10.0,
            CoolingSchedule::Exponential { rate: 0.99 },
            250,
        );
        let calls = Arc::new(AtomicU64::new(0));
        let calls_in_cb = calls.clone();
        let callback: ProgressCallback = Box::new(move |update| {
            calls_in_cb.fetch_add(1, Ordering::SeqCst);
            assert!(update.iteration % 100 == 0 || update.iteration == 250);
            assert!(update.acceptance_rate >= 0.0 && update.acceptance_rate <= 1.0);
            true
        });
        sa.optimize_seeded(&engine, &draw, Some(&callback), Some(5))
            .unwrap();
        // Iterations 0, 100, 200 plus the final record.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn adaptive_feedback_flows_through_the_loop() {
        // An acceptance target no run can reach makes every observation
        // raise the cooling rate toward its ceiling, so the reported
        // trajectory must stay far above the un-adapted one.
        let engine = travel_engine();
        let draw = away_heavy_draw();
        let sa = SimulatedAnnealing::new(
            50.0,
            CoolingSchedule::Adaptive {
                rate: 0.95,
                acceptance_target: 2.0,
                adaptation_factor: 0.1,
            },
            250,
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_cb = seen.clone();
        let callback: ProgressCallback = Box::new(move |update| {
            seen_in_cb
                .lock()
                .unwrap()
                .push((update.iteration, update.temperature));
            true
        });
        sa.optimize_seeded(&engine, &draw, Some(&callback), Some(9))
            .unwrap();

        let seen = seen.lock().unwrap();
        // End of iteration 0: the schedule still returns the base
        // temperature, and feedback has not been applied yet.
        assert_eq!(seen[0], (0, 50.0));
        // By iteration 100 the rate sits at the 0.999 ceiling; the
        // configured 0.95 would have cooled below 0.3 by now.
        let (_, t100) = seen.iter().copied().find(|&(i, _)| i == 100).unwrap();
        assert!(
            t100 > 40.0,
            "adaptive feedback did not reach the schedule, T = {t100}"
        );
    }

    #[test]
    fn callback_can_stop_the_run_early() {
        let engine = travel_engine();
        let draw = away_heavy_draw();
        let sa = SimulatedAnnealing::new(
            10.0,
            CoolingSchedule::Exponential { rate: 0.99 },
            1_000_000,
        );
        let calls = Arc::new(AtomicU64::new(0));
        let calls_in_cb = calls.clone();
        let callback: ProgressCallback = Box::new(move |_| {
            // Allow the first emission, stop at the second.
            calls_in_cb.fetch_add(1, Ordering::SeqCst) == 0
        });
        let outcome = sa
            .optimize_seeded(&engine, &draw, Some(&callback), Some(5))
            .unwrap();
        // Emissions: iteration 0 (continue), iteration 100 (stop), final.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(outcome.duration_seconds < 60.0);
    }

    #[test]
    fn recommended_config_scales_with_the_fixture() {
        let engine = travel_engine();
        let draw = away_heavy_draw();
        let cfg = recommended_config(&engine, &draw).unwrap();
        assert!(cfg.temperature > 0.0);
        // Small fixture: the floor applies.
        assert_eq!(cfg.max_iterations, 10_000);
        // Stable for the same input.
        assert_eq!(recommended_config(&engine, &draw).unwrap(), cfg);

        let empty = Draw::new("empty", 2025, 3);
        assert!(recommended_config(&engine, &empty).is_err());
    }

    #[test]
    fn default_engine_accepts_generated_fixture() {
        // A generated round robin scores positively under the default rule
        // set (no hard violations).
        let now = chrono::Utc::now();
        let teams: Vec<crate::models::Team> = (1..=4)
            .map(|id| crate::models::Team {
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
            .collect();
        let draw = crate::generator::generate(&teams, 3).unwrap();
        let engine = constraints::default_engine();
        assert!(engine.score_draw(&draw) > 0.0);
    }
}
