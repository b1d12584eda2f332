//! Error types shared across the scheduling core.

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the scheduling core.
///
/// Hard constraint violations are deliberately *not* an error variant: they
/// are reported as data (a zero score plus analysis items) so the optimizer
/// can keep working through infeasible intermediate fixtures. A failed
/// neighbour move is likewise internal to the optimizer and never escapes it.
#[derive(Error, Debug, Serialize)]
pub enum SchedulerError {
    /// A caller-supplied parameter is out of range or malformed, such as a
    /// league with fewer than two teams, a zero round count, a constraint
    /// weight outside [0, 1] or an unparseable date in a config document.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced entity (draw, job, team, venue) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An unexpected runtime fault. Jobs that hit this are marked failed.
    #[error("internal error: {0}")]
    Internal(String),
}
