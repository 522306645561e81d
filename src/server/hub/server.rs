/// Game hub actor.
///
/// Single owner of all shared hub state. Connects, disconnects and client
/// messages all arrive through this actor's mailbox, so every mutation of the
/// registry, queue and room store is serialized.
use actix::prelude::*;
use actix::MessageResult;
use std::time::{Duration, Instant};
use log::info;

use super::engine::Hub;
use crate::config::hub::EVICTION_SWEEP_SECS;
use crate::config::server::ServerConfig;
use crate::server::connection::registry::ConnectionId;
use crate::server::messages::ServerEvent;

pub struct GameHub {
    hub: Hub,
    directory_refresh: Option<Duration>,
    ended_room_ttl: Option<Duration>,
}

impl GameHub {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            hub: Hub::new(),
            directory_refresh: config.directory_refresh,
            ended_room_ttl: config.ended_room_ttl,
        }
    }
}

impl Actor for GameHub {
    type Context = Context<Self>;

    /// Schedules the periodic directory broadcast and ended-room sweep.
    fn started(&mut self, ctx: &mut Self::Context) {
        if let Some(period) = self.directory_refresh {
            ctx.run_interval(period, |act, _ctx| {
                act.hub.publish_directory();
            });
        }
        if let Some(ttl) = self.ended_room_ttl {
            ctx.run_interval(Duration::from_secs(EVICTION_SWEEP_SECS), move |act, _ctx| {
                let evicted = act.hub.evict_ended(ttl, Instant::now());
                if evicted > 0 {
                    info!("[Hub] Evicted {} ended rooms", evicted);
                }
            });
        }
        info!("[Hub] Started");
    }
}

/// Message: a WebSocket session opened. Answers with its new identity.
#[derive(Message)]
#[rtype(result = "ConnectionId")]
pub struct Connect {
    pub addr: Recipient<ServerEvent>,
    pub name: Option<String>,
}

/// Message: a WebSocket session closed.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: ConnectionId,
}

/// Message: a text frame received from a client.
#[derive(Message)]
#[rtype(result = "()")]
pub struct ClientText {
    pub id: ConnectionId,
    pub text: String,
}

impl Handler<Connect> for GameHub {
    type Result = MessageResult<Connect>;

    fn handle(&mut self, msg: Connect, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.hub.connect(Box::new(msg.addr), msg.name))
    }
}

impl Handler<Disconnect> for GameHub {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _ctx: &mut Self::Context) -> Self::Result {
        self.hub.disconnect(msg.id);
    }
}

impl Handler<ClientText> for GameHub {
    type Result = ();

    fn handle(&mut self, msg: ClientText, _ctx: &mut Self::Context) -> Self::Result {
        self.hub.handle_text(msg.id, &msg.text);
    }
}
