// src/server/state.rs

//! Application state for the backend server.
//!
//! Holds the address of the hub actor, shared with the WebSocket handler.

use actix::Addr;
use crate::server::hub::server::GameHub;

/// Shared application state, injected into HTTP/WebSocket handlers.
pub struct AppState {
    /// Address of the hub actor (registry, queue, rooms).
    pub hub_addr: Addr<GameHub>,
}

impl AppState {
    /// Create a new AppState with the given actor address.
    pub fn new(hub_addr: Addr<GameHub>) -> Self {
        AppState { hub_addr }
    }
}
