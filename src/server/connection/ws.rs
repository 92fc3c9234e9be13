/// WebSocket transport.
///
/// Each binary WebSocket message carries length-prefixed envelopes, buffered
/// so one envelope may span several messages and one message may batch
/// several envelopes, up to [`WS_MAX_FRAME_SIZE`] per message. The actor plays both roles of
/// a connection: it forwards decoded envelopes to the hub one batch at a time,
/// and a companion task drains the hub's outbound queue into it. Text frames
/// are a protocol violation.
use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info, warn};
use std::borrow::Cow;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::server::{OUTBOUND_QUEUE_CAPACITY, WS_MAX_FRAME_SIZE};
use crate::server::hub::messages::{Incoming, Register, Unregister};
use crate::server::hub::{ConnId, Connection, ConnectionHub};
use crate::server::protocol::{Envelope, FrameDecoder, encode};
use crate::server::state::AppState;

/// One envelope from the hub's outbound queue.
#[derive(Message)]
#[rtype(result = "()")]
struct Outbound(Envelope);

/// The hub closed the outbound queue.
#[derive(Message)]
#[rtype(result = "()")]
struct QueueClosed;

pub struct WsConnection {
    conn: ConnId,
    peer: String,
    username: Option<String>,
    hub: Addr<ConnectionHub>,
    decoder: FrameDecoder,
}

impl WsConnection {
    pub fn new(hub: Addr<ConnectionHub>, peer: String, username: Option<String>) -> Self {
        Self {
            conn: Uuid::new_v4(),
            peer,
            username,
            hub,
            decoder: FrameDecoder::new(),
        }
    }

    fn protocol_error(&self, ctx: &mut ws::WebsocketContext<Self>, reason: &str) {
        warn!("[Connection] {} protocol error, closing: {}", self.conn, reason);
        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Protocol,
            description: Some(reason.to_string()),
        }));
        ctx.stop();
    }

    /// Forward every complete envelope, in order, before reading further.
    fn forward_frames(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let mut batch = Vec::new();
        loop {
            match self.decoder.next_envelope() {
                Ok(Some(envelope)) => batch.push(envelope),
                Ok(None) => break,
                Err(e) => {
                    self.protocol_error(ctx, &e.to_string());
                    return;
                }
            }
        }
        if batch.is_empty() {
            return;
        }
        let (conn, hub) = (self.conn, self.hub.clone());
        ctx.wait(
            async move {
                for envelope in batch {
                    if hub.send(Incoming { conn, envelope }).await.is_err() {
                        break;
                    }
                }
            }
            .into_actor(self),
        );
    }
}

impl Actor for WsConnection {
    type Context = ws::WebsocketContext<Self>;

    /// Register with the hub before any frame is read, then start draining
    /// the outbound queue into this actor.
    fn started(&mut self, ctx: &mut Self::Context) {
        let (outbound, mut queue) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let register = Register {
            connection: Connection::new(self.conn, self.peer.clone(), outbound),
            username: self.username.clone(),
        };
        ctx.wait(self.hub.send(register).into_actor(self).map(|res, act, ctx| {
            if res.is_err() {
                warn!("[Connection] Hub is gone, dropping {}", act.peer);
                ctx.stop();
            }
        }));

        let addr = ctx.address();
        actix::spawn(async move {
            while let Some(envelope) = queue.recv().await {
                if addr.send(Outbound(envelope)).await.is_err() {
                    return;
                }
            }
            addr.do_send(QueueClosed);
        });
        info!("[Connection] Accepted WebSocket {} from {}", self.conn, self.peer);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.hub.do_send(Unregister { conn: self.conn });
    }
}

impl Handler<Outbound> for WsConnection {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        match encode(&msg.0) {
            Ok(frame) => ctx.binary(frame),
            Err(e) => warn!("[Connection] {} skipped unsendable {}: {}", self.conn, msg.0.kind, e),
        }
    }
}

impl Handler<QueueClosed> for WsConnection {
    type Result = ();

    fn handle(&mut self, _msg: QueueClosed, ctx: &mut Self::Context) {
        debug!("[Connection] {} outbound queue closed", self.conn);
        ctx.close(Some(ws::CloseCode::Normal.into()));
        ctx.stop();
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsConnection {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Binary(bytes)) => {
                self.decoder.extend(&bytes);
                self.forward_frames(ctx);
            }
            Ok(ws::Message::Text(_)) => self.protocol_error(ctx, "text frames are not supported"),
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => self.protocol_error(ctx, "fragmented messages are not supported"),
            Ok(ws::Message::Pong(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => self.protocol_error(ctx, &e.to_string()),
        }
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        if self.decoder.finish().is_err() {
            debug!("[Connection] {} closed with {} bytes of a cut frame", self.conn, self.decoder.pending());
        }
        ctx.stop();
    }
}

/// WebSocket endpoint.
///
/// Accepts an optional `username` query parameter; without one the session
/// gets a generated name.
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let mut username = None;
    for kv in req.query_string().split('&') {
        let mut split = kv.split('=');
        if let (Some("username"), Some(name)) = (split.next(), split.next()) {
            username = Some(
                urlencoding::decode(name)
                    .unwrap_or_else(|_| Cow::Borrowed(""))
                    .into_owned(),
            );
        }
    }
    let peer = req
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    ws::WsResponseBuilder::new(WsConnection::new(data.hub.clone(), peer, username), &req, stream)
        .frame_size(WS_MAX_FRAME_SIZE)
        .start()
}
