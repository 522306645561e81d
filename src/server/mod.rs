// src/server/mod.rs

//! Server layer root module.
//!
//! This module organizes the session hub components, including:
//! - Connection registry and WebSocket sessions
//! - Matchmaking queue
//! - Game rooms and the room store
//! - Room broadcast and the public game directory
//! - The hub actor that serializes all of the above

pub mod state;
pub mod router;
pub mod messages;
pub mod connection;
pub mod matchmaking;
pub mod game_session;
pub mod broadcast;
pub mod directory;
pub mod hub;
pub mod ws_error;
