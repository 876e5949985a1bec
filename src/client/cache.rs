//! Client-side replica cache of remote players
//!
//! Written only by the inbound pump, read by the game loop. The replica map
//! and the leaderboard mirror are locked independently.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::trace;

use crate::ws::protocol::{Message, PlayerId, Record, User};

/// Last known state of a remote player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replica {
    pub id: PlayerId,
    pub name: String,
    pub x16: i32,
    pub y16: i32,
    pub vy16: i32,
    pub running: bool,
    pub score: i32,
    pub updated_at: DateTime<Utc>,
}

impl Replica {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            x16: user.x16,
            y16: user.y16,
            vy16: user.vy16,
            running: user.running,
            score: user.score,
            updated_at: Utc::now(),
        }
    }

    fn overwrite(&mut self, user: &User) {
        self.name.clone_from(&user.name);
        self.x16 = user.x16;
        self.y16 = user.y16;
        self.vy16 = user.vy16;
        self.running = user.running;
        self.score = user.score;
        self.updated_at = Utc::now();
    }
}

#[derive(Default)]
pub struct ReplicaCache {
    replicas: DashMap<PlayerId, Replica>,
    standing: RwLock<Vec<Record>>,
}

impl ReplicaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one inbound message into the cache
    pub fn apply(&self, msg: &Message) {
        match msg {
            Message::Update(user) => {
                self.replicas
                    .entry(user.id.clone())
                    .and_modify(|replica| replica.overwrite(user))
                    .or_insert_with(|| Replica::from_user(user));
            }
            Message::Leave(id) => {
                if self.replicas.remove(id).is_some() {
                    trace!(player_id = %id, "Replica removed");
                }
            }
            Message::Standing(records) => {
                *self.standing.write() = records.clone();
            }
            Message::Join => {}
        }
    }

    /// Point-in-time copy of all replicas, ordered by identity
    pub fn list_replicas(&self) -> Vec<Replica> {
        let mut replicas: Vec<Replica> = self
            .replicas
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        replicas.sort_by(|a, b| a.id.cmp(&b.id));
        replicas
    }

    /// Point-in-time copy of the mirrored leaderboard
    pub fn leaderboard(&self) -> Vec<Record> {
        self.standing.read().clone()
    }

    pub fn get(&self, id: &PlayerId) -> Option<Replica> {
        self.replicas.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }
}
