use actix::prelude::*;
use serde::Serialize;

use super::connections::{ConnId, Connection};
use crate::server::protocol::Envelope;
use crate::server::session::SessionStateKind;

/// A transport accepted a new client.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Register {
    pub connection: Connection,
    /// Name requested during the handshake, if the transport carries one.
    pub username: Option<String>,
}

/// The connection's reader stopped (stream end, protocol error, or closed writer).
#[derive(Message)]
#[rtype(result = "()")]
pub struct Unregister {
    pub conn: ConnId,
}

/// One decoded envelope from a client, in per-connection order.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Incoming {
    pub conn: ConnId,
    pub envelope: Envelope,
}

/// Push an envelope to a client's outbound queue. Used by the matchmaker and rooms.
#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct Deliver {
    pub conn: ConnId,
    pub envelope: Envelope,
}

impl Deliver {
    pub fn new(conn: ConnId, envelope: Envelope) -> Self {
        Self { conn, envelope }
    }
}

/// Current session state of a connection, `None` if it is not live.
#[derive(Message)]
#[rtype(result = "Option<SessionStateKind>")]
pub struct GetSessionState {
    pub conn: ConnId,
}

/// Number of live connections and open rooms.
#[derive(Message)]
#[rtype(result = "HubStatus")]
pub struct GetStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HubStatus {
    pub connections: usize,
    pub rooms: usize,
}
