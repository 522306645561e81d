/// Connection registry: one entry per live WebSocket.
///
/// The registry is the only owner of each connection's transport handle.
/// Rooms and the queue refer to connections by `ConnectionId` alone.
use std::collections::HashMap;
use actix::Recipient;
use log::debug;
use uuid::Uuid;

use crate::game::types::Color;
use crate::server::game_session::room::RoomId;
use crate::server::messages::ServerEvent;

pub type ConnectionId = Uuid;

/// Outbound half of a client transport.
pub trait EventSink {
    /// False once the client is closing; such sinks are skipped silently.
    fn is_writable(&self) -> bool;

    /// Queue `event` for delivery without waiting.
    fn deliver(&self, event: ServerEvent);
}

impl EventSink for Recipient<ServerEvent> {
    fn is_writable(&self) -> bool {
        self.connected()
    }

    fn deliver(&self, event: ServerEvent) {
        self.do_send(event);
    }
}

pub struct Connection {
    pub id: ConnectionId,
    sink: Box<dyn EventSink>,
    pub name: Option<String>,
    pub color: Option<Color>,
    pub room: Option<RoomId>,
    pub observer: bool,
    pub queued: bool,
}

impl Connection {
    /// Fire-and-forget send; a closing transport drops the event.
    pub fn send(&self, event: ServerEvent) {
        if self.sink.is_writable() {
            self.sink.deliver(event);
        } else {
            debug!("[Registry] Skipping send to closing connection {}", self.id);
        }
    }

    /// Forget any room participation.
    pub fn clear_room(&mut self) {
        self.room = None;
        self.color = None;
        self.observer = false;
    }
}

#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection under a freshly generated identity.
    pub fn register(&mut self, sink: Box<dyn EventSink>, name: Option<String>) -> ConnectionId {
        let mut id = Uuid::new_v4();
        while self.connections.contains_key(&id) {
            id = Uuid::new_v4();
        }
        self.connections.insert(id, Connection {
            id,
            sink,
            name,
            color: None,
            room: None,
            observer: false,
            queued: false,
        });
        id
    }

    /// Remove a connection, handing back its final state.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Send to one connection if it is still registered.
    pub fn send_to(&self, id: ConnectionId, event: ServerEvent) {
        match self.connections.get(&id) {
            Some(conn) => conn.send(event),
            None => debug!("[Registry] Dropping event for unknown connection {}", id),
        }
    }
}
