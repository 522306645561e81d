//! Main entry point for the hub server.
//!
//! Initializes logging, starts the hub actor that owns all connection, queue
//! and room state, and launches the HTTP server with the WebSocket endpoint.

use actix::Actor;
use actix_web::{web, App, HttpServer};
use log::info;
use config::server::ServerConfig;
use server::hub::server::GameHub;

pub mod config;
mod server;
mod game;


#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger from environment variable (default to info level).
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env();

    // Start the GameHub actor (registry, matchmaking, rooms).
    let hub_addr = GameHub::new(&config).start();

    // Shared application state for the WebSocket handler.
    let state = web::Data::new(server::state::AppState::new(hub_addr));

    info!("[Server] Listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", "*"))
            )
            .app_data(state.clone())
            .configure(crate::server::router::config)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
