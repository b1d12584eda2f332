//! The draw service facade.
//!
//! Wires the generator, constraint engine and optimizer to the repository
//! and broadcaster ports. This is the surface an API layer or CLI would
//! call; everything underneath stays synchronous core code plus the job
//! manager.

use std::sync::Arc;

use log::info;
use thiserror::Error;

use scheduler_core::constraints::{self, AnalysisItem, Violation};
use scheduler_core::models::{Draw, DrawStatus, OptimizationConfig};
use scheduler_core::{generator, SchedulerError};

use crate::jobs::{Job, JobManager, JobStatus};
use crate::ports::{Broadcaster, Repository, RepositoryError};

/// Errors surfaced by the service layer.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] SchedulerError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Facade over fixture generation, validation, optimization jobs and
/// persistence.
pub struct DrawService {
    repository: Arc<dyn Repository>,
    jobs: JobManager,
}

impl DrawService {
    /// A service without event fan-out.
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        DrawService {
            repository,
            jobs: JobManager::new(),
        }
    }

    /// A service forwarding job events to the broadcaster. Must be called
    /// from within a tokio runtime.
    pub fn with_broadcaster(
        repository: Arc<dyn Repository>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        DrawService {
            repository,
            jobs: JobManager::with_broadcaster(broadcaster),
        }
    }

    /// Direct access to the job manager (listing, stats, cleanup).
    pub fn job_manager(&self) -> &JobManager {
        &self.jobs
    }

    /// Seeds a new draw over all registered teams and persists it.
    ///
    /// `double` appends the mirrored second leg. A provided constraint
    /// document is validated before it is stored.
    pub async fn create_draw(
        &self,
        name: &str,
        season_year: i32,
        rounds: u32,
        double: bool,
        constraint_config: Option<serde_json::Value>,
    ) -> Result<Draw, ServiceError> {
        if let Some(doc) = &constraint_config {
            // Reject broken documents at the door rather than at job start.
            constraints::engine_from_value(doc)?;
        }

        let teams = self.repository.list_teams().await?;
        let mut draw = if double {
            generator::generate_double(&teams, rounds)?
        } else {
            generator::generate(&teams, rounds)?
        };
        draw.name = name.to_string();
        draw.season_year = season_year;
        draw.constraint_config = constraint_config;
        draw.validate()?;

        let stored = self.repository.create_draw(&draw).await?;
        info!(
            "created draw {} ({}): {} matches over {} rounds",
            stored.id,
            stored.name,
            stored.matches.len(),
            stored.rounds
        );
        Ok(stored)
    }

    /// Starts an optimization job for a stored draw and returns the job id.
    ///
    /// The engine comes from the draw's embedded constraint document, or the
    /// default rule set when none is stored. The draw is flipped to
    /// `optimizing` before the job is submitted.
    pub async fn start_optimization(
        &self,
        draw_id: i64,
        config: Option<OptimizationConfig>,
    ) -> Result<String, ServiceError> {
        let mut draw = self.repository.get_draw_with_matches(draw_id).await?;
        let engine = match &draw.constraint_config {
            Some(doc) => constraints::engine_from_value(doc)?,
            None => constraints::default_engine(),
        };

        draw.status = DrawStatus::Optimizing;
        self.repository.update_draw(&draw).await?;

        let config = config.unwrap_or_default();
        let job_id = self.jobs.start(draw_id, draw, engine, config)?;
        Ok(job_id)
    }

    /// Persists the best draw of a completed job inside a repository
    /// transaction and marks the draw completed.
    pub async fn apply_result(&self, job_id: &str) -> Result<Draw, ServiceError> {
        let job = self.job(job_id)?;
        if job.status != JobStatus::Completed {
            return Err(SchedulerError::InvalidInput(format!(
                "job {job_id} is {:?}, only completed jobs can be applied",
                job.status
            ))
            .into());
        }
        let outcome = job.result.ok_or_else(|| {
            SchedulerError::Internal(format!("job {job_id} completed without a result"))
        })?;

        let mut best = outcome.best_draw;
        best.status = DrawStatus::Completed;

        let mut tx = self.repository.begin().await?;
        if let Err(e) = tx.update_matches(&best.matches).await {
            let _ = tx.rollback().await;
            return Err(e.into());
        }
        if let Err(e) = tx.update_draw(&best).await {
            let _ = tx.rollback().await;
            return Err(e.into());
        }
        tx.commit().await?;

        info!(
            "applied job {job_id} to draw {}: final score {:.4}",
            best.id, outcome.final_score
        );
        Ok(best)
    }

    /// Scores a stored draw under its configured rules.
    pub async fn score_draw(&self, draw_id: i64) -> Result<f64, ServiceError> {
        let (draw, engine) = self.load_with_engine(draw_id).await?;
        Ok(engine.score_draw(&draw))
    }

    /// Hard-rule failures of a stored draw.
    pub async fn validate_draw(&self, draw_id: i64) -> Result<Vec<Violation>, ServiceError> {
        let (draw, engine) = self.load_with_engine(draw_id).await?;
        Ok(engine.validate_draw(&draw))
    }

    /// Full analysis (hard failures, warnings, weak soft scores) of a
    /// stored draw.
    pub async fn analyze_draw(&self, draw_id: i64) -> Result<Vec<AnalysisItem>, ServiceError> {
        let (draw, engine) = self.load_with_engine(draw_id).await?;
        Ok(engine.analyze_draw(&draw))
    }

    /// The job snapshot for an id.
    pub fn job(&self, job_id: &str) -> Result<Job, ServiceError> {
        self.jobs
            .get(job_id)
            .ok_or_else(|| SchedulerError::NotFound(format!("job {job_id}")).into())
    }

    /// Cancels a job; see [`JobManager::cancel`].
    pub fn cancel_job(&self, job_id: &str) -> Result<JobStatus, ServiceError> {
        Ok(self.jobs.cancel(job_id)?)
    }

    async fn load_with_engine(
        &self,
        draw_id: i64,
    ) -> Result<(Draw, constraints::ConstraintEngine), ServiceError> {
        let draw = self.repository.get_draw_with_matches(draw_id).await?;
        let engine = match &draw.constraint_config {
            Some(doc) => constraints::engine_from_value(doc)?,
            None => constraints::default_engine(),
        };
        Ok((draw, engine))
    }
}
