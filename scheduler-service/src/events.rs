//! Job event types and payload builders.
//!
//! Per job the emission order is fixed: `started`, any number of
//! `progress`, then exactly one terminal event. All payloads are plain JSON
//! objects handed to the [`Broadcaster`](crate::ports::Broadcaster) port.

use chrono::Utc;
use serde_json::{json, Value};

use scheduler_core::models::{OptimizationOutcome, ProgressUpdate};

use crate::jobs::Job;

pub const OPTIMIZATION_STARTED: &str = "optimization_started";
pub const OPTIMIZATION_PROGRESS: &str = "optimization_progress";
pub const OPTIMIZATION_COMPLETED: &str = "optimization_completed";
pub const OPTIMIZATION_FAILED: &str = "optimization_failed";
pub const OPTIMIZATION_CANCELLED: &str = "optimization_cancelled";

pub fn started(job: &Job) -> Value {
    json!({
        "job_id": job.id,
        "draw_id": job.draw_id,
        "started_at": job.started_at,
        "config": job.config,
    })
}

pub fn progress(job_id: &str, draw_id: i64, update: &ProgressUpdate) -> Value {
    let percent = if update.max_iterations > 0 {
        update.iteration as f64 / update.max_iterations as f64 * 100.0
    } else {
        0.0
    };
    json!({
        "job_id": job_id,
        "draw_id": draw_id,
        "iteration": update.iteration,
        "max_iterations": update.max_iterations,
        "current_score": update.current_score,
        "best_score": update.best_score,
        "temperature": update.temperature,
        "progress": percent,
        "updated_at": Utc::now(),
    })
}

pub fn completed(job: &Job, outcome: &OptimizationOutcome) -> Value {
    json!({
        "job_id": job.id,
        "draw_id": job.draw_id,
        "completed_at": job.completed_at,
        "duration_seconds": outcome.duration_seconds,
        "final_score": outcome.final_score,
        "iterations": outcome.iterations,
        "improvements": outcome.improvements,
    })
}

pub fn failed(job: &Job, error: &str) -> Value {
    json!({
        "job_id": job.id,
        "draw_id": job.draw_id,
        "error": error,
        "failed_at": Utc::now(),
    })
}

pub fn cancelled(job: &Job, reason: Option<&str>) -> Value {
    json!({
        "job_id": job.id,
        "draw_id": job.draw_id,
        "cancelled_at": job.completed_at.unwrap_or_else(Utc::now),
        "reason": reason,
    })
}
