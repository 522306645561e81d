/// Session hub core.
///
/// Owns the connection registry, the matchmaking queue and the room store,
/// and routes every inbound client message to exactly one operation. All
/// methods are synchronous; the `GameHub` actor serializes calls into it.
use std::time::{Duration, Instant};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::hub::MAX_NAME_LEN;
use crate::game::types::{Color, GameResult, MoveDescriptor};
use crate::server::broadcast::broadcast;
use crate::server::connection::registry::{ConnectionId, ConnectionRegistry, EventSink};
use crate::server::directory;
use crate::server::game_session::room::{JoinOutcome, RoomStatus};
use crate::server::game_session::store::{random_room_id, RoomStore};
use crate::server::matchmaking::queue::MatchmakingQueue;
use crate::server::messages::{ClientMessage, ServerEvent};
use crate::server::ws_error::HubError;

pub struct Hub {
    registry: ConnectionRegistry,
    queue: MatchmakingQueue,
    rooms: RoomStore,
    rng: StdRng,
}

/// Trim a client supplied display name; blank names count as absent.
pub fn normalize_name(raw: Option<String>) -> Option<String> {
    let name: String = raw?.trim().chars().take(MAX_NAME_LEN).collect();
    let name = name.trim_end().to_string();
    (!name.is_empty()).then_some(name)
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Hub with a caller-provided RNG (room ids and color draws).
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            queue: MatchmakingQueue::new(),
            rooms: RoomStore::new(),
            rng,
        }
    }

    #[cfg(test)]
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub fn rooms(&self) -> &RoomStore {
        &self.rooms
    }

    #[cfg(test)]
    pub fn queue(&self) -> &MatchmakingQueue {
        &self.queue
    }

    /// Register a new transport.
    pub fn connect(&mut self, sink: Box<dyn EventSink>, name: Option<String>) -> ConnectionId {
        let id = self.registry.register(sink, normalize_name(name));
        info!("[Hub] Connection {} opened ({} live)", id, self.registry.len());
        id
    }

    /// Unregister a transport and release its queue slot and room seat before
    /// returning. Unknown ids are ignored.
    pub fn disconnect(&mut self, id: ConnectionId) {
        let Some(conn) = self.registry.unregister(id) else {
            debug!("[Hub] Disconnect for unknown connection {}", id);
            return;
        };
        info!("[Hub] Connection {} closed ({} live)", id, self.registry.len());
        debug!(
            "[Hub] {} final state: room={:?} color={:?} observer={} queued={}",
            id, conn.room, conn.color, conn.observer, conn.queued
        );
        if self.queue.cancel(id) {
            self.report_queue_positions();
        }
        if let Some(room_id) = conn.room {
            self.leave_room(&room_id, id);
        }
    }

    /// Handle one text frame from `id`. Failures go back to `id` only.
    pub fn handle_text(&mut self, id: ConnectionId, text: &str) {
        if !self.registry.contains(id) {
            debug!("[Hub] Dropping message from closed connection {}", id);
            return;
        }
        let result = ClientMessage::parse(text).and_then(|msg| self.dispatch(id, msg));
        if let Err(err) = result {
            debug!("[Hub] Rejected message from {}: {}", id, err);
            self.registry.send_to(id, ServerEvent::error(&err));
        }
    }

    pub fn dispatch(&mut self, id: ConnectionId, msg: ClientMessage) -> Result<(), HubError> {
        debug!("[Hub] {} -> {:?}", id, msg);
        match msg {
            ClientMessage::Queue { player_name } => self.join_queue(id, player_name),
            ClientMessage::CancelQueue => {
                self.cancel_queue(id);
                Ok(())
            }
            ClientMessage::ListGames => {
                directory::publish_to_one(&self.registry, &self.rooms, id);
                Ok(())
            }
            ClientMessage::Create { player_name, preferred_color } => {
                self.create_room(id, player_name, preferred_color)
            }
            ClientMessage::Join { game_id, player_name, preferred_color } => {
                self.join_room(id, &game_id, player_name, preferred_color)
            }
            ClientMessage::Move { game_id, descriptor } => self.apply_move(id, &game_id, descriptor),
            ClientMessage::End { result } => self.end_game(id, result),
            ClientMessage::Ping => {
                self.registry.send_to(id, ServerEvent::Pong);
                Ok(())
            }
        }
    }

    /// Name to use for `id`: the requested one if usable, else the one already
    /// known for the connection.
    fn effective_name(&self, id: ConnectionId, requested: Option<String>) -> Option<String> {
        normalize_name(requested).or_else(|| self.registry.get(id).and_then(|c| c.name.clone()))
    }

    fn join_queue(&mut self, id: ConnectionId, player_name: Option<String>) -> Result<(), HubError> {
        let name = self.effective_name(id, player_name);
        self.detach_from_room(id);

        let position = self.queue.enqueue(id, name.clone());
        if let Some(conn) = self.registry.get_mut(id) {
            conn.queued = true;
            conn.name = name;
        }
        info!("[Matchmaking] {} queued at position {} ({} waiting)", id, position, self.queue.len());
        self.registry.send_to(id, ServerEvent::QueueStatus { position });

        if self.try_match()? {
            self.report_queue_positions();
        }
        Ok(())
    }

    fn cancel_queue(&mut self, id: ConnectionId) {
        if !self.queue.cancel(id) {
            debug!("[Matchmaking] Cancel from {} who was not queued", id);
            return;
        }
        if let Some(conn) = self.registry.get_mut(id) {
            conn.queued = false;
        }
        info!("[Matchmaking] {} left the queue", id);
        self.report_queue_positions();
    }

    /// Pair the two longest-waiting players, if any, into a new active room.
    fn try_match(&mut self) -> Result<bool, HubError> {
        let mut matched = false;
        while let Some(pairing) = self.queue.try_match(&mut self.rng) {
            let now = Instant::now();
            info!(
                "[Matchmaking] Pairing {} (waited {:?}) with {} (waited {:?})",
                pairing.white.conn,
                pairing.white.waited(now),
                pairing.black.conn,
                pairing.black.waited(now)
            );
            let rng = &mut self.rng;
            let created = self.rooms.create_matched(
                || random_room_id(rng),
                (pairing.white.conn, pairing.white.name.clone()),
                (pairing.black.conn, pairing.black.name.clone()),
            );
            let room_id = match created {
                Ok(room_id) => room_id,
                Err(err) => {
                    warn!("[Matchmaking] Could not create a room for a pairing: {}", err);
                    self.queue.restore(pairing);
                    return Err(err);
                }
            };

            let Some(room) = self.rooms.get(&room_id) else {
                continue;
            };
            for (entry, color) in [(&pairing.white, Color::White), (&pairing.black, Color::Black)] {
                if let Some(conn) = self.registry.get_mut(entry.conn) {
                    conn.queued = false;
                    conn.room = Some(room_id.clone());
                    conn.color = Some(color);
                    conn.observer = false;
                    conn.send(ServerEvent::Matched {
                        game_id: room_id.clone(),
                        color,
                        position: room.position().to_string(),
                        status: room.status(),
                        players: room.players(),
                    });
                }
            }
            matched = true;
        }
        if matched {
            self.publish_directory();
        }
        Ok(matched)
    }

    fn create_room(
        &mut self,
        id: ConnectionId,
        player_name: Option<String>,
        preferred: Option<Color>,
    ) -> Result<(), HubError> {
        let name = self.effective_name(id, player_name);
        let rng = &mut self.rng;
        let (room_id, color) = self.rooms.create(|| random_room_id(rng), id, name.clone(), preferred)?;

        self.detach_from_room(id);
        if self.queue.cancel(id) {
            self.report_queue_positions();
        }
        if let Some(conn) = self.registry.get_mut(id) {
            conn.name = name;
            conn.queued = false;
            conn.room = Some(room_id.clone());
            conn.color = Some(color);
            conn.observer = false;
        }
        self.send_session(id, &room_id);
        Ok(())
    }

    fn join_room(
        &mut self,
        id: ConnectionId,
        room_id: &str,
        player_name: Option<String>,
        preferred: Option<Color>,
    ) -> Result<(), HubError> {
        if self.rooms.get(room_id).is_none() {
            return Err(HubError::RoomNotFound);
        }
        let name = self.effective_name(id, player_name);
        let already_here = self
            .registry
            .get(id)
            .is_some_and(|conn| conn.room.as_deref() == Some(room_id));
        if !already_here {
            self.detach_from_room(id);
        }
        if self.queue.cancel(id) {
            self.report_queue_positions();
        }

        let room = self.rooms.get_mut(room_id)?;
        let was_active = room.status() == RoomStatus::Active;
        let was_seated = room.seat_of(id).is_some();
        let was_member = room.is_member(id);
        let outcome = room.join(id, name.clone(), preferred);
        let changed = !was_member || (!was_seated && matches!(outcome, JoinOutcome::Seated(_)));
        let now_active = room.status() == RoomStatus::Active;

        if let Some(conn) = self.registry.get_mut(id) {
            conn.name = name;
            conn.queued = false;
            conn.room = Some(room.id.clone());
            match outcome {
                JoinOutcome::Seated(color) => {
                    conn.color = Some(color);
                    conn.observer = false;
                }
                JoinOutcome::Observer => {
                    conn.color = None;
                    conn.observer = true;
                }
            }
        }
        info!("[Room] {} joined {} as {:?}", id, room.id, outcome);

        if changed {
            let event = ServerEvent::PlayerJoined {
                game_id: room.id.clone(),
                players: room.players(),
                status: room.status(),
            };
            broadcast(&self.registry, room, &event, Some(id));
        }
        self.send_session(id, room_id);
        if was_active != now_active {
            self.publish_directory();
        }
        Ok(())
    }

    fn apply_move(&mut self, id: ConnectionId, room_id: &str, mut descriptor: MoveDescriptor) -> Result<(), HubError> {
        let room = self.rooms.get_mut(room_id)?;
        let record = room.apply_move(id, &descriptor)?;
        descriptor.position = Some(record.position.clone());
        debug!("[Room] {} {} {}->{}", room.id, record.color, record.from, record.to);

        let event = ServerEvent::Move {
            game_id: room.id.clone(),
            descriptor,
            position: record.position.clone(),
            next_to_move: record.color.opponent(),
            by: record.color,
        };
        broadcast(&self.registry, room, &event, None);
        Ok(())
    }

    fn end_game(&mut self, id: ConnectionId, result: GameResult) -> Result<(), HubError> {
        let room_id = self
            .registry
            .get(id)
            .and_then(|conn| conn.room.clone())
            .ok_or(HubError::NotInRoom)?;
        let room = self.rooms.get_mut(&room_id)?;
        let was_active = room.status() == RoomStatus::Active;
        room.end(id, result.clone())?;
        info!("[Room] {} ended: {:?}", room.id, result);

        let event = ServerEvent::Ended {
            game_id: room.id.clone(),
            result,
            position: room.position().to_string(),
        };
        broadcast(&self.registry, room, &event, None);
        if was_active {
            self.publish_directory();
        }
        Ok(())
    }

    /// Take `id` out of whatever room it currently belongs to.
    fn detach_from_room(&mut self, id: ConnectionId) {
        let previous = self.registry.get_mut(id).and_then(|conn| {
            let room = conn.room.take();
            conn.clear_room();
            room
        });
        if let Some(room_id) = previous {
            self.leave_room(&room_id, id);
        }
    }

    fn leave_room(&mut self, room_id: &str, id: ConnectionId) {
        let Ok(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let was_active = room.status() == RoomStatus::Active;
        if !room.leave(id) {
            return;
        }
        info!("[Room] {} left {} (status {:?})", id, room.id, room.status());
        let event = ServerEvent::PlayerLeft {
            game_id: room.id.clone(),
            players: room.players(),
            status: room.status(),
        };
        broadcast(&self.registry, room, &event, Some(id));
        if was_active && room.status() != RoomStatus::Active {
            self.publish_directory();
        }
    }

    fn send_session(&self, id: ConnectionId, room_id: &str) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        let color = room.seat_of(id);
        self.registry.send_to(id, ServerEvent::Session {
            game_id: room.id.clone(),
            color,
            viewer: color.is_none(),
            position: room.position().to_string(),
            status: room.status(),
            players: room.players(),
            result: room.result().cloned(),
        });
    }

    /// Tell every queued connection where it stands.
    fn report_queue_positions(&self) {
        for (conn, position) in self.queue.positions() {
            self.registry.send_to(conn, ServerEvent::QueueStatus { position });
        }
    }

    /// Push the active-room directory to every connection.
    pub fn publish_directory(&self) {
        directory::publish_to_all(&self.registry, &self.rooms);
    }

    /// Drop rooms ended more than `ttl` before `now`. Returns how many went.
    pub fn evict_ended(&mut self, ttl: Duration, now: Instant) -> usize {
        let evicted = self.rooms.evict_ended(ttl, now);
        for room in &evicted {
            for member in room.members() {
                if let Some(conn) = self.registry.get_mut(member) {
                    if conn.room.as_deref() == Some(room.id.as_str()) {
                        conn.clear_room();
                    }
                }
            }
        }
        evicted.len()
    }
}
