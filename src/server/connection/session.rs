/// WebSocket session handler.
///
/// This actor manages a single client's socket: it registers with the hub on
/// start, forwards every text frame to it, writes hub events back as JSON, and
/// unregisters when the socket stops. A heartbeat closes sockets that went
/// silent.
use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, error, warn};
use std::borrow::Cow;
use std::time::{Duration, Instant};

use crate::config::server::{CLIENT_TIMEOUT_SECS, HEARTBEAT_INTERVAL_SECS};
use crate::server::connection::registry::ConnectionId;
use crate::server::hub::server::{ClientText, Connect, Disconnect, GameHub};
use crate::server::messages::ServerEvent;
use crate::server::ws_error::HubError;

/// Represents one client's WebSocket session.
pub struct ClientSession {
    /// Assigned by the hub once registration completes.
    pub id: Option<ConnectionId>,
    /// Display name given on the connection URL, if any.
    pub name: Option<String>,
    pub hub_addr: Addr<GameHub>,
    last_heartbeat: Instant,
}

impl ClientSession {
    pub fn new(hub_addr: Addr<GameHub>, name: Option<String>) -> Self {
        Self {
            id: None,
            name,
            hub_addr,
            last_heartbeat: Instant::now(),
        }
    }

    /// Ping the client periodically and stop the session if it stays silent.
    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS), |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > Duration::from_secs(CLIENT_TIMEOUT_SECS) {
                warn!("[Session] Heartbeat timeout for {:?}, closing", act.id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn send_event(&self, event: &ServerEvent, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::to_string(event) {
            Ok(text) => ctx.text(text),
            Err(e) => error!("[Session] Failed to serialize ServerEvent: {}", e),
        }
    }
}

impl Actor for ClientSession {
    type Context = ws::WebsocketContext<Self>;

    /// Called when the session starts. Registers with the hub and waits for
    /// the assigned identity before reading any client frame.
    fn started(&mut self, ctx: &mut Self::Context) {
        self.heartbeat(ctx);
        self.hub_addr
            .send(Connect {
                addr: ctx.address().recipient(),
                name: self.name.clone(),
            })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(id) => {
                        debug!("[Session] Registered as {}", id);
                        act.id = Some(id);
                    }
                    Err(e) => {
                        error!("[Session] Hub unavailable: {}", e);
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }

    /// Called when the session stops. Removes the connection from the hub.
    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        if let Some(id) = self.id.take() {
            self.hub_addr.do_send(Disconnect { id });
        }
        Running::Stop
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ClientSession {
    /// Handles incoming WebSocket frames from the client.
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!("[Session] Protocol error for {:?}: {}", self.id, e);
                ctx.stop();
                return;
            }
        };
        self.last_heartbeat = Instant::now();

        match msg {
            ws::Message::Text(text) => {
                if let Some(id) = self.id {
                    self.hub_addr.do_send(ClientText { id, text: text.to_string() });
                }
            }
            ws::Message::Binary(_) => {
                let err = HubError::BadPayload("binary frames are not supported".to_string());
                self.send_event(&ServerEvent::error(&err), ctx);
            }
            ws::Message::Ping(msg) => ctx.pong(&msg),
            ws::Message::Pong(_) => {}
            ws::Message::Close(reason) => {
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Continuation(_) => ctx.stop(),
            ws::Message::Nop => {}
        }
    }
}

impl Handler<ServerEvent> for ClientSession {
    type Result = ();

    /// Handles events sent from the hub to this session.
    fn handle(&mut self, msg: ServerEvent, ctx: &mut Self::Context) {
        self.send_event(&msg, ctx);
    }
}

/// Display name from the `name` query parameter, URL-decoded.
fn name_from_query(query: &str) -> Option<String> {
    query.split('&').find_map(|kv| {
        let mut split = kv.splitn(2, '=');
        match (split.next(), split.next()) {
            (Some("name"), Some(raw)) => Some(
                urlencoding::decode(&raw.replace('+', " "))
                    .unwrap_or(Cow::Borrowed(""))
                    .into_owned(),
            ),
            _ => None,
        }
    })
}

/// WebSocket endpoint for hub clients.
///
/// Accepts an optional `name` query parameter used as the default display name.
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<crate::server::state::AppState>,
) -> Result<HttpResponse, Error> {
    let name = name_from_query(req.query_string());
    ws::start(ClientSession::new(data.hub_addr.clone(), name), &req, stream)
}
