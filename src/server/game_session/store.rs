/// Owner of every live room.
///
/// Connections only ever hold a `RoomId`; lookups go through the store.
use std::collections::HashMap;
use std::time::{Duration, Instant};
use log::info;
use rand::distr::Alphanumeric;
use rand::Rng;

use super::room::{Room, RoomId, RoomStatus};
use crate::config::hub::{ROOM_ID_ATTEMPTS, ROOM_ID_LENGTH};
use crate::game::types::Color;
use crate::server::connection::registry::ConnectionId;
use crate::server::ws_error::HubError;

#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<RoomId, Room>,
}

/// Short URL-safe identifier.
pub fn random_room_id<R: Rng>(rng: &mut R) -> RoomId {
    rng.sample_iter(Alphanumeric)
        .take(ROOM_ID_LENGTH)
        .map(char::from)
        .collect()
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Room, HubError> {
        self.rooms.get_mut(id).ok_or(HubError::RoomNotFound)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Rooms in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        let mut rooms: Vec<&Room> = self.rooms.values().collect();
        rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        rooms.into_iter()
    }

    /// Insert an empty room under a fresh identifier produced by `next_id`,
    /// retrying on collision.
    pub fn allocate(&mut self, mut next_id: impl FnMut() -> RoomId) -> Result<&mut Room, HubError> {
        for _ in 0..ROOM_ID_ATTEMPTS {
            let id = next_id();
            if !self.rooms.contains_key(&id) {
                let room = self.rooms.entry(id.clone()).or_insert_with(|| Room::new(id));
                return Ok(room);
            }
        }
        Err(HubError::RoomAlreadyExists)
    }

    /// Create a waiting room with `creator` seated in `preferred` (white if none).
    pub fn create(
        &mut self,
        next_id: impl FnMut() -> RoomId,
        creator: ConnectionId,
        name: Option<String>,
        preferred: Option<Color>,
    ) -> Result<(RoomId, Color), HubError> {
        let room = self.allocate(next_id)?;
        let color = room.seat_creator(creator, name, preferred.unwrap_or(Color::White));
        info!("[Room] Created {} with creator {} as {}", room.id, creator, color);
        Ok((room.id.clone(), color))
    }

    /// Create an active room with both seats already filled.
    pub fn create_matched(
        &mut self,
        next_id: impl FnMut() -> RoomId,
        white: (ConnectionId, Option<String>),
        black: (ConnectionId, Option<String>),
    ) -> Result<RoomId, HubError> {
        let room = self.allocate(next_id)?;
        room.join(white.0, white.1, Some(Color::White));
        room.join(black.0, black.1, Some(Color::Black));
        debug_assert_eq!(room.status(), RoomStatus::Active);
        info!("[Room] Matched {}: white={} black={}", room.id, white.0, black.0);
        Ok(room.id.clone())
    }

    /// Drop rooms that ended more than `ttl` before `now`, returning them.
    pub fn evict_ended(&mut self, ttl: Duration, now: Instant) -> Vec<Room> {
        let expired: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|room| {
                room.ended_at()
                    .is_some_and(|ended| now.saturating_duration_since(ended) >= ttl)
            })
            .map(|room| room.id.clone())
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.rooms.remove(&id))
            .inspect(|room| info!("[Room] Evicted ended room {}", room.id))
            .collect()
    }
}
