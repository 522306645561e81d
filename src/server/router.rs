//! HTTP and WebSocket routing configuration.
//!
//! A single endpoint upgrades every client to a hub session.

use actix_web::web;
use crate::server::connection::session::ws_connect;

/// Configure the application's HTTP/WebSocket routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/ws")
            .to(ws_connect)
    );
}
