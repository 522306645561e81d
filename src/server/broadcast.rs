//! Fan-out of room events.
//!
//! A room event goes to both seats and every observer, minus an optional
//! excluded connection. Sends are fire-and-forget; closing transports are
//! skipped.

use log::debug;

use crate::server::connection::registry::{ConnectionId, ConnectionRegistry};
use crate::server::game_session::room::Room;
use crate::server::messages::ServerEvent;

/// Send `event` to every member of `room` except `exclude`. Returns how many
/// connections it was handed to.
pub fn broadcast(
    registry: &ConnectionRegistry,
    room: &Room,
    event: &ServerEvent,
    exclude: Option<ConnectionId>,
) -> usize {
    let mut sent = 0;
    for member in room.members() {
        if Some(member) == exclude {
            continue;
        }
        if let Some(conn) = registry.get(member) {
            conn.send(event.clone());
            sent += 1;
        }
    }
    debug!("[Broadcast] room={} recipients={}", room.id, sent);
    sent
}
