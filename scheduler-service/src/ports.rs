//! Ports to the world outside the core: persistence and event fan-out.
//!
//! The service consumes a [`Repository`] for reading and writing fixtures
//! and emits job events through a [`Broadcaster`]. Both are trait objects so
//! callers can plug in a database, a websocket hub, or the in-memory fakes
//! used by the test suites. Connection and subscription management is the
//! implementer's concern.

use async_trait::async_trait;
use thiserror::Error;

use scheduler_core::models::{Draw, Match, Team, Venue};

/// Errors crossing the repository boundary.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),
    /// A uniqueness or concurrent-modification conflict.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The backing store could not be reached or failed mid-operation.
    #[error("transport: {0}")]
    Transport(String),
}

/// Persistence port: per-entity CRUD plus batch match writes and a
/// transactional boundary.
///
/// Create operations return the stored entity with its assigned id; a draw
/// is created together with its owned matches and deleting it cascades to
/// them.
#[async_trait]
pub trait Repository: Send + Sync {
    // Venues
    async fn create_venue(&self, venue: &Venue) -> Result<Venue, RepositoryError>;
    async fn get_venue(&self, id: i64) -> Result<Venue, RepositoryError>;
    async fn update_venue(&self, venue: &Venue) -> Result<Venue, RepositoryError>;
    async fn delete_venue(&self, id: i64) -> Result<(), RepositoryError>;
    async fn list_venues(&self) -> Result<Vec<Venue>, RepositoryError>;

    // Teams
    async fn create_team(&self, team: &Team) -> Result<Team, RepositoryError>;
    async fn get_team(&self, id: i64) -> Result<Team, RepositoryError>;
    async fn update_team(&self, team: &Team) -> Result<Team, RepositoryError>;
    async fn delete_team(&self, id: i64) -> Result<(), RepositoryError>;
    async fn list_teams(&self) -> Result<Vec<Team>, RepositoryError>;

    // Draws
    async fn create_draw(&self, draw: &Draw) -> Result<Draw, RepositoryError>;
    async fn get_draw(&self, id: i64) -> Result<Draw, RepositoryError>;
    /// The draw with its owned match collection loaded.
    async fn get_draw_with_matches(&self, id: i64) -> Result<Draw, RepositoryError>;
    async fn update_draw(&self, draw: &Draw) -> Result<Draw, RepositoryError>;
    /// Deletes the draw and cascades to its matches.
    async fn delete_draw(&self, id: i64) -> Result<(), RepositoryError>;
    async fn list_draws(&self) -> Result<Vec<Draw>, RepositoryError>;

    // Matches
    async fn get_match(&self, id: i64) -> Result<Match, RepositoryError>;
    async fn create_matches(&self, matches: &[Match]) -> Result<Vec<Match>, RepositoryError>;
    async fn update_matches(&self, matches: &[Match]) -> Result<(), RepositoryError>;

    /// Opens a transaction scope. Dropping the scope without committing must
    /// leave the store unchanged.
    async fn begin(&self) -> Result<Box<dyn RepositoryTx>, RepositoryError>;
}

/// The write surface available inside a transaction.
#[async_trait]
pub trait RepositoryTx: Send {
    async fn update_draw(&mut self, draw: &Draw) -> Result<(), RepositoryError>;
    async fn create_matches(&mut self, matches: &[Match]) -> Result<(), RepositoryError>;
    async fn update_matches(&mut self, matches: &[Match]) -> Result<(), RepositoryError>;
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Event fan-out port.
///
/// Implementations must return quickly: the job manager funnels optimizer
/// progress through an internal buffer, but a broadcast that blocks for long
/// delays every subsequent event of the same job.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, message_type: &str, payload: serde_json::Value);
}
