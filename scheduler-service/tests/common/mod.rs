//! In-memory port fakes for the integration suites.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use scheduler_core::models::{Draw, Match, Team, Venue};
use scheduler_service::ports::{Broadcaster, Repository, RepositoryError, RepositoryTx};

#[derive(Default)]
struct Store {
    venues: HashMap<i64, Venue>,
    teams: HashMap<i64, Team>,
    draws: HashMap<i64, Draw>,
    next_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn update_matches(&mut self, matches: &[Match]) -> Result<(), RepositoryError> {
        for m in matches {
            let draw = self
                .draws
                .get_mut(&m.draw_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("draw {}", m.draw_id)))?;
            let slot = draw
                .matches
                .iter_mut()
                .find(|existing| existing.id == m.id)
                .ok_or_else(|| RepositoryError::NotFound(format!("match {}", m.id)))?;
            *slot = m.clone();
        }
        Ok(())
    }

    fn create_matches(&mut self, matches: &[Match]) -> Result<Vec<Match>, RepositoryError> {
        let mut stored = Vec::with_capacity(matches.len());
        for m in matches {
            let id = self.next_id();
            let draw = self
                .draws
                .get_mut(&m.draw_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("draw {}", m.draw_id)))?;
            let mut m = m.clone();
            m.id = id;
            draw.matches.push(m.clone());
            stored.push(m);
        }
        Ok(stored)
    }

    fn update_draw(&mut self, draw: &Draw) -> Result<Draw, RepositoryError> {
        if !self.draws.contains_key(&draw.id) {
            return Err(RepositoryError::NotFound(format!("draw {}", draw.id)));
        }
        let mut updated = draw.clone();
        updated.updated_at = Utc::now();
        self.draws.insert(draw.id, updated.clone());
        Ok(updated)
    }
}

/// A repository living entirely in memory, with a buffering transaction
/// scope.
#[derive(Default, Clone)]
pub struct InMemoryRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a league of `n` teams with ids 1..=n.
    pub async fn seed_league(&self, n: i64) {
        let now = Utc::now();
        for id in 1..=n {
            let team = Team {
                id: 0,
                name: format!("Team {id}"),
                short_name: format!("T{id}"),
                city: "Sydney".into(),
                home_venue_id: Some(100 + id),
                latitude: -33.8,
                longitude: 151.2,
                created_at: now,
                updated_at: now,
            };
            self.create_team(&team).await.expect("seed team");
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_venue(&self, venue: &Venue) -> Result<Venue, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let mut v = venue.clone();
        v.id = store.next_id();
        store.venues.insert(v.id, v.clone());
        Ok(v)
    }

    async fn get_venue(&self, id: i64) -> Result<Venue, RepositoryError> {
        self.store
            .lock()
            .unwrap()
            .venues
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("venue {id}")))
    }

    async fn update_venue(&self, venue: &Venue) -> Result<Venue, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        if !store.venues.contains_key(&venue.id) {
            return Err(RepositoryError::NotFound(format!("venue {}", venue.id)));
        }
        store.venues.insert(venue.id, venue.clone());
        Ok(venue.clone())
    }

    async fn delete_venue(&self, id: i64) -> Result<(), RepositoryError> {
        self.store
            .lock()
            .unwrap()
            .venues
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("venue {id}")))
    }

    async fn list_venues(&self) -> Result<Vec<Venue>, RepositoryError> {
        let mut venues: Vec<Venue> = self.store.lock().unwrap().venues.values().cloned().collect();
        venues.sort_by_key(|v| v.id);
        Ok(venues)
    }

    async fn create_team(&self, team: &Team) -> Result<Team, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let mut t = team.clone();
        t.id = store.next_id();
        store.teams.insert(t.id, t.clone());
        Ok(t)
    }

    async fn get_team(&self, id: i64) -> Result<Team, RepositoryError> {
        self.store
            .lock()
            .unwrap()
            .teams
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("team {id}")))
    }

    async fn update_team(&self, team: &Team) -> Result<Team, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        if !store.teams.contains_key(&team.id) {
            return Err(RepositoryError::NotFound(format!("team {}", team.id)));
        }
        store.teams.insert(team.id, team.clone());
        Ok(team.clone())
    }

    async fn delete_team(&self, id: i64) -> Result<(), RepositoryError> {
        self.store
            .lock()
            .unwrap()
            .teams
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("team {id}")))
    }

    async fn list_teams(&self) -> Result<Vec<Team>, RepositoryError> {
        let mut teams: Vec<Team> = self.store.lock().unwrap().teams.values().cloned().collect();
        teams.sort_by_key(|t| t.id);
        Ok(teams)
    }

    async fn create_draw(&self, draw: &Draw) -> Result<Draw, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let mut d = draw.clone();
        d.id = store.next_id();
        for m in &mut d.matches {
            m.id = store.next_id();
            m.draw_id = d.id;
        }
        store.draws.insert(d.id, d.clone());
        Ok(d)
    }

    async fn get_draw(&self, id: i64) -> Result<Draw, RepositoryError> {
        let mut draw = self
            .store
            .lock()
            .unwrap()
            .draws
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("draw {id}")))?;
        draw.matches.clear();
        Ok(draw)
    }

    async fn get_draw_with_matches(&self, id: i64) -> Result<Draw, RepositoryError> {
        self.store
            .lock()
            .unwrap()
            .draws
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("draw {id}")))
    }

    async fn update_draw(&self, draw: &Draw) -> Result<Draw, RepositoryError> {
        self.store.lock().unwrap().update_draw(draw)
    }

    async fn delete_draw(&self, id: i64) -> Result<(), RepositoryError> {
        self.store
            .lock()
            .unwrap()
            .draws
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("draw {id}")))
    }

    async fn list_draws(&self) -> Result<Vec<Draw>, RepositoryError> {
        let mut draws: Vec<Draw> = self.store.lock().unwrap().draws.values().cloned().collect();
        draws.sort_by_key(|d| d.id);
        Ok(draws)
    }

    async fn get_match(&self, id: i64) -> Result<Match, RepositoryError> {
        self.store
            .lock()
            .unwrap()
            .draws
            .values()
            .flat_map(|d| d.matches.iter())
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("match {id}")))
    }

    async fn create_matches(&self, matches: &[Match]) -> Result<Vec<Match>, RepositoryError> {
        self.store.lock().unwrap().create_matches(matches)
    }

    async fn update_matches(&self, matches: &[Match]) -> Result<(), RepositoryError> {
        self.store.lock().unwrap().update_matches(matches)
    }

    async fn begin(&self) -> Result<Box<dyn RepositoryTx>, RepositoryError> {
        Ok(Box::new(InMemoryTx {
            store: self.store.clone(),
            pending: Vec::new(),
        }))
    }
}

enum PendingOp {
    UpdateDraw(Draw),
    CreateMatches(Vec<Match>),
    UpdateMatches(Vec<Match>),
}

/// Buffers writes until commit; rollback (or drop) discards them.
struct InMemoryTx {
    store: Arc<Mutex<Store>>,
    pending: Vec<PendingOp>,
}

#[async_trait]
impl RepositoryTx for InMemoryTx {
    async fn update_draw(&mut self, draw: &Draw) -> Result<(), RepositoryError> {
        self.pending.push(PendingOp::UpdateDraw(draw.clone()));
        Ok(())
    }

    async fn create_matches(&mut self, matches: &[Match]) -> Result<(), RepositoryError> {
        self.pending.push(PendingOp::CreateMatches(matches.to_vec()));
        Ok(())
    }

    async fn update_matches(&mut self, matches: &[Match]) -> Result<(), RepositoryError> {
        self.pending.push(PendingOp::UpdateMatches(matches.to_vec()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        for op in self.pending {
            match op {
                PendingOp::UpdateDraw(draw) => {
                    store.update_draw(&draw)?;
                }
                PendingOp::CreateMatches(matches) => {
                    store.create_matches(&matches)?;
                }
                PendingOp::UpdateMatches(matches) => {
                    store.update_matches(&matches)?;
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// A broadcaster that records every event for assertions.
#[derive(Default)]
pub struct CollectingBroadcaster {
    events: Mutex<Vec<(String, Value)>>,
}

impl CollectingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().unwrap().clone()
    }

    /// The message types seen so far, in arrival order.
    pub fn message_types(&self) -> Vec<String> {
        self.events().into_iter().map(|(t, _)| t).collect()
    }
}

#[async_trait]
impl Broadcaster for CollectingBroadcaster {
    async fn broadcast(&self, message_type: &str, payload: Value) {
        self.events
            .lock()
            .unwrap()
            .push((message_type.to_string(), payload));
    }
}
