//! # Scheduler-Core: Round-Robin Fixture Optimization Engine
//!
//! This crate produces and improves season fixtures ("draws") for a
//! round-robin sports league. A draw is seeded with the circle method,
//! judged by a pluggable set of hard and weighted soft constraints, and
//! refined by a simulated-annealing search over small reversible moves
//! (round swaps, reschedules, venue swaps, home/away flips).
//!
//! The crate is synchronous and shares no state between runs; concurrency,
//! persistence and event streaming live in the companion service crate,
//! which talks to this one through plain function calls.
//!
//! ## Quick Example
//!
//! ```no_run
//! use scheduler_core::{generator, constraints, run_optimization};
//! use scheduler_core::models::{OptimizationConfig, Team};
//! use chrono::Utc;
//!
//! let now = Utc::now();
//! let teams: Vec<Team> = (1..=6)
//!     .map(|id| Team {
//!         id,
//!         name: format!("Team {id}"),
//!         short_name: format!("T{id}"),
//!         city: "Sydney".into(),
//!         home_venue_id: Some(100 + id),
//!         latitude: -33.8,
//!         longitude: 151.2,
//!         created_at: now,
//!         updated_at: now,
//!     })
//!     .collect();
//!
//! let draw = generator::generate(&teams, 5)?;
//! let engine = constraints::default_engine();
//! let outcome = run_optimization(&engine, &draw, &OptimizationConfig::default())?;
//! println!(
//!     "score {:.3} -> {:.3} in {} iterations",
//!     outcome.initial_score, outcome.final_score, outcome.iterations
//! );
//! # Ok::<(), scheduler_core::SchedulerError>(())
//! ```

pub mod constraints;
pub mod error;
pub mod generator;
pub mod models;
pub mod optimizer;
pub mod stats;

pub use error::SchedulerError;
pub use models::{OptimizationConfig, OptimizationOutcome, ProgressCallback, ProgressUpdate};
pub use optimizer::{recommended_config, SimulatedAnnealing};

use constraints::ConstraintEngine;
use models::Draw;

/// Runs a simulated-annealing optimization of `draw` under `engine`.
///
/// Convenience entry point over [`SimulatedAnnealing`]; equivalent to
/// [`run_optimization_with_progress`] without a callback.
///
/// # Errors
///
/// `InvalidInput` when the draw has no matches.
pub fn run_optimization(
    engine: &ConstraintEngine,
    draw: &Draw,
    config: &OptimizationConfig,
) -> Result<OptimizationOutcome, SchedulerError> {
    run_optimization_with_progress(engine, draw, config, None)
}

/// Runs a simulated-annealing optimization with progress reporting.
///
/// The callback receives a [`ProgressUpdate`] every 100 iterations and may
/// return `false` to stop the run cooperatively; the best fixture found so
/// far is still returned.
pub fn run_optimization_with_progress(
    engine: &ConstraintEngine,
    draw: &Draw,
    config: &OptimizationConfig,
    progress: Option<&ProgressCallback>,
) -> Result<OptimizationOutcome, SchedulerError> {
    SimulatedAnnealing::from_config(config).optimize(engine, draw, progress)
}
