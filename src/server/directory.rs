//! Public directory of rooms currently being played.
//!
//! Only `active` rooms are listed; waiting and ended rooms stay private.

use log::debug;
use serde::Serialize;

use crate::server::connection::registry::{ConnectionId, ConnectionRegistry};
use crate::server::game_session::room::{RoomId, RoomStatus, SeatSummary};
use crate::server::game_session::store::RoomStore;
use crate::server::messages::ServerEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub game_id: RoomId,
    pub position: String,
    pub players: Vec<SeatSummary>,
    pub observers: usize,
    pub moves: usize,
}

/// One summary per active room, in creation order.
pub fn snapshot(rooms: &RoomStore) -> Vec<RoomSummary> {
    rooms
        .iter()
        .filter(|room| room.status() == RoomStatus::Active)
        .map(|room| RoomSummary {
            game_id: room.id.clone(),
            position: room.position().to_string(),
            players: room.players(),
            observers: room.observer_count(),
            moves: room.moves().len(),
        })
        .collect()
}

/// Push the directory to every connected client.
pub fn publish_to_all(registry: &ConnectionRegistry, rooms: &RoomStore) {
    let event = ServerEvent::GamesList { games: snapshot(rooms) };
    for conn in registry.iter() {
        conn.send(event.clone());
    }
    debug!("[Directory] Published to {} connections", registry.len());
}

/// Answer a single `list_games` request.
pub fn publish_to_one(registry: &ConnectionRegistry, rooms: &RoomStore, conn: ConnectionId) {
    registry.send_to(conn, ServerEvent::GamesList { games: snapshot(rooms) });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::{Color, GameResult};
    use uuid::Uuid;

    #[test]
    fn test_only_active_rooms_are_listed() {
        let mut rooms = RoomStore::new();
        let mut next = ["waiting", "active", "ended"].into_iter().map(String::from);
        let mut ids = move || next.next().unwrap_or_default();

        rooms.create(&mut ids, Uuid::new_v4(), None, None).unwrap();
        rooms.create_matched(&mut ids, (Uuid::new_v4(), Some("Ada".into())), (Uuid::new_v4(), None)).unwrap();
        let white = Uuid::new_v4();
        rooms.create_matched(&mut ids, (white, None), (Uuid::new_v4(), None)).unwrap();
        rooms.get_mut("ended").unwrap().end(white, GameResult::default()).unwrap();
        rooms.get_mut("active").unwrap().join(Uuid::new_v4(), None, Some(Color::White));

        let listed = snapshot(&rooms);
        assert_eq!(listed.len(), 1);
        let summary = &listed[0];
        assert_eq!(summary.game_id, "active");
        assert_eq!(summary.observers, 1);
        assert_eq!(summary.moves, 0);
        assert_eq!(summary.players[0].name, "Ada");
        assert!(summary.players.iter().all(|seat| seat.occupied));
    }
}
