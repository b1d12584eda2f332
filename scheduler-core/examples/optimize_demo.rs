//! Seeds a league fixture, scores it, optimizes it, and prints the result.
//!
//! Run with `cargo run --example optimize_demo`.

use chrono::{NaiveDate, Utc};
use scheduler_core::models::{ProgressCallback, Team};
use scheduler_core::{constraints, generator, recommended_config, run_optimization_with_progress};

fn main() -> Result<(), scheduler_core::SchedulerError> {
    env_logger::init();

    let now = Utc::now();
    let teams: Vec<Team> = (1..=9)
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
        .collect();

    let mut draw = generator::generate_double(&teams, 9)?;
    generator::schedule_weekly(&mut draw, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

    let engine = constraints::default_engine();
    println!("Initial fixture:\n{}", draw.display());
    println!("Initial breakdown:\n{}", engine.score_breakdown(&draw));

    let mut config = recommended_config(&engine, &draw)?;
    println!(
        "Recommended settings: t0 = {:.4}, {} iterations",
        config.temperature, config.max_iterations
    );
    // Keep the demo snappy.
    config.max_iterations = config.max_iterations.min(20_000);

    let progress: ProgressCallback = Box::new(|update| {
        if update.iteration % 2_000 == 0 {
            println!(
                "iter {:>6}/{}: current {:.4}, best {:.4}, T {:.4}, acceptance {:.2}",
                update.iteration,
                update.max_iterations,
                update.current_score,
                update.best_score,
                update.temperature,
                update.acceptance_rate
            );
        }
        true
    });

    let outcome = run_optimization_with_progress(&engine, &draw, &config, Some(&progress))?;
    println!(
        "\nDone in {:.2}s: {:.4} -> {:.4} ({} improvements)",
        outcome.duration_seconds, outcome.initial_score, outcome.final_score, outcome.improvements
    );
    println!("Final breakdown:\n{}", engine.score_breakdown(&outcome.best_draw));
    Ok(())
}
