/// Connection hub actor.
///
/// Owns the set of live connections and the session layer bound to them.
/// Register, unregister and incoming-message events are processed one at a
/// time in arrival order, so the session layer never sees two events at once.
/// Matchmaker and rooms reach clients only through [`Deliver`], which keeps
/// every outbound queue owned by this actor alone.

use actix::prelude::*;
use actix::MessageResult;
use log::{debug, info, warn};
use std::time::Duration;

use super::connections::{ConnId, ConnectionSet};
use super::messages::{Deliver, GetSessionState, GetStatus, HubStatus, Incoming, Register, Unregister};
use crate::config::Settings;
use crate::config::game::{PACING_DELAY_MILLIS, ROUND_DURATION_SECS};
use crate::config::matchmaking::TICK_INTERVAL_MILLIS;
use crate::config::server::HUB_MAILBOX_CAPACITY;
use crate::game::shop::PurchaseService;
use crate::server::game_room::messages::RoomFinished;
use crate::server::game_room::server::RoomTimings;
use crate::server::matchmaking::messages::MatchFound;
use crate::server::matchmaking::server::Matchmaker;
use crate::server::session::commands::{CommandRouter, RouterError};
use crate::server::session::lobby::Lobby;

/// Timings and sizes the hub hands to the actors it creates.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub tick_interval: Duration,
    pub timings: RoomTimings,
    pub seed: Option<u64>,
    pub mailbox_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(TICK_INTERVAL_MILLIS),
            timings: RoomTimings {
                round_duration: Duration::from_secs(ROUND_DURATION_SECS),
                pacing: Duration::from_millis(PACING_DELAY_MILLIS),
            },
            seed: None,
            mailbox_capacity: HUB_MAILBOX_CAPACITY,
        }
    }
}

impl From<&Settings> for HubConfig {
    fn from(settings: &Settings) -> Self {
        let defaults = HubConfig::default();
        HubConfig {
            tick_interval: settings.tick_interval,
            timings: RoomTimings {
                round_duration: settings.round_duration,
                ..defaults.timings
            },
            seed: settings.seed,
            ..defaults
        }
    }
}

pub struct ConnectionHub {
    connections: ConnectionSet,
    lobby: Lobby,
}

impl ConnectionHub {
    /// Validate the command tables, then start the hub and its matchmaker.
    pub fn launch(
        config: HubConfig,
        shop: Box<dyn PurchaseService>,
    ) -> Result<Addr<ConnectionHub>, RouterError> {
        let router = CommandRouter::new()?;
        Ok(ConnectionHub::create(move |ctx| {
            ctx.set_mailbox_capacity(config.mailbox_capacity);
            let hub = ctx.address();
            let matchmaker = Matchmaker::new(
                hub.clone().recipient(),
                hub.clone().recipient(),
                config.tick_interval,
            )
            .start();
            ConnectionHub {
                connections: ConnectionSet::default(),
                lobby: Lobby::new(
                    router,
                    matchmaker,
                    shop,
                    hub.clone().recipient(),
                    hub.recipient(),
                    config.timings,
                    config.seed,
                ),
            }
        }))
    }

    fn unregister(&mut self, conn: ConnId) {
        let Some(connection) = self.connections.remove(&conn) else {
            return;
        };
        info!("[Hub] Connection {} ({}) unregistered", conn, connection.peer);
        // Dropping the handle closes the outbound queue and stops the writer.
        drop(connection);
        self.lobby.on_disconnect(conn);
    }

    /// Evict connections whose outbound queue overflowed during the last event.
    fn evict_overflowed(&mut self) {
        loop {
            let overflowed = self.connections.take_overflowed();
            if overflowed.is_empty() {
                break;
            }
            for conn in overflowed {
                self.unregister(conn);
            }
        }
    }
}

impl Actor for ConnectionHub {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("[Hub] Connection hub started");
    }
}

impl Handler<Register> for ConnectionHub {
    type Result = ();

    fn handle(&mut self, msg: Register, _ctx: &mut Self::Context) -> Self::Result {
        let conn = msg.connection.id;
        let peer = msg.connection.peer.clone();
        if !self.connections.insert(msg.connection) {
            warn!("[Hub] Connection {} registered twice, ignoring", conn);
            return;
        }
        info!("[Hub] Connection {} ({}) registered, {} live", conn, peer, self.connections.len());
        self.lobby.on_connect(conn, msg.username, &mut self.connections);
        self.evict_overflowed();
    }
}

impl Handler<Unregister> for ConnectionHub {
    type Result = ();

    fn handle(&mut self, msg: Unregister, _ctx: &mut Self::Context) -> Self::Result {
        self.unregister(msg.conn);
        self.evict_overflowed();
    }
}

impl Handler<Incoming> for ConnectionHub {
    type Result = ();

    fn handle(&mut self, msg: Incoming, _ctx: &mut Self::Context) -> Self::Result {
        if !self.connections.contains(&msg.conn) {
            debug!("[Hub] Ignoring {} from unregistered connection {}", msg.envelope.kind, msg.conn);
            return;
        }
        self.lobby.on_message(msg.conn, msg.envelope, &mut self.connections);
        self.evict_overflowed();
    }
}

impl Handler<Deliver> for ConnectionHub {
    type Result = ();

    fn handle(&mut self, msg: Deliver, _ctx: &mut Self::Context) -> Self::Result {
        self.connections.send(msg.conn, msg.envelope);
        self.evict_overflowed();
    }
}

impl Handler<MatchFound> for ConnectionHub {
    type Result = ();

    fn handle(&mut self, msg: MatchFound, _ctx: &mut Self::Context) -> Self::Result {
        self.lobby.on_match_found(msg, &mut self.connections);
        self.evict_overflowed();
    }
}

impl Handler<RoomFinished> for ConnectionHub {
    type Result = ();

    fn handle(&mut self, msg: RoomFinished, _ctx: &mut Self::Context) -> Self::Result {
        self.lobby.on_room_finished(msg, &mut self.connections);
        self.evict_overflowed();
    }
}

impl Handler<GetSessionState> for ConnectionHub {
    type Result = Option<crate::server::session::SessionStateKind>;

    fn handle(&mut self, msg: GetSessionState, _ctx: &mut Self::Context) -> Self::Result {
        self.lobby.state_of(&msg.conn)
    }
}

impl Handler<GetStatus> for ConnectionHub {
    type Result = MessageResult<GetStatus>;

    fn handle(&mut self, _msg: GetStatus, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(HubStatus {
            connections: self.connections.len(),
            rooms: self.lobby.open_rooms(),
        })
    }
}
