//! Session layer bound to the hub.
//!
//! `Lobby` owns every [`PlayerSession`] and the registry of open rooms. It is
//! only ever called from the hub's handlers, so connect, disconnect and
//! message callbacks never overlap.

use std::collections::HashMap;

use actix::prelude::*;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use uuid::Uuid;

use super::commands::{CommandRouter, Reply, Services};
use super::session::{PlayerSession, RoomRef, SessionState, SessionStateKind};
use crate::config::game::STARTER_CARDS;
use crate::game::deck::PlayState;
use crate::game::error::RulesError;
use crate::game::player::PlayerModel;
use crate::game::shop::PurchaseService;
use crate::server::game_room::messages::{PlayerLeft, RoomFinished};
use crate::server::game_room::server::{GameRoom, RoomTimings};
use crate::server::game_room::table::{RoomId, Seat, Table};
use crate::server::hub::messages::Deliver;
use crate::server::hub::{ConnId, ConnectionSet};
use crate::server::matchmaking::messages::{Dequeue, Enqueue, MatchFound};
use crate::server::matchmaking::server::Matchmaker;
use crate::server::protocol::Envelope;
use crate::server::protocol::commands::{error, prompt, success};

pub struct Lobby {
    sessions: HashMap<ConnId, PlayerSession>,
    router: CommandRouter,
    matchmaker: Addr<Matchmaker>,
    rooms: HashMap<RoomId, Addr<GameRoom>>,
    shop: Box<dyn PurchaseService>,
    outbox: Recipient<Deliver>,
    done: Recipient<RoomFinished>,
    timings: RoomTimings,
    rng: StdRng,
}

impl Lobby {
    pub fn new(
        router: CommandRouter,
        matchmaker: Addr<Matchmaker>,
        shop: Box<dyn PurchaseService>,
        outbox: Recipient<Deliver>,
        done: Recipient<RoomFinished>,
        timings: RoomTimings,
        seed: Option<u64>,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            router,
            matchmaker,
            rooms: HashMap::new(),
            shop,
            outbox,
            done,
            timings,
            rng: StdRng::seed_from_u64(seed.unwrap_or_else(rand::random)),
        }
    }

    /// Create the session, run the onboarding grant, welcome and prompt.
    pub fn on_connect(&mut self, conn: ConnId, username: Option<String>, out: &mut ConnectionSet) {
        let name = username
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Player-{}", &conn.simple().to_string()[..6]));
        let mut player = PlayerModel::new(name.clone());

        let welcome = match self.shop.purchase(STARTER_CARDS) {
            Ok(keys) => {
                player.grant(keys);
                player.build_starter_deck();
                success(
                    format!("Welcome, {}! Your starter cards are in your collection.", name),
                    json!({
                        "sessionId": conn,
                        "username": name,
                        "starterCards": player.collection().len(),
                    }),
                )
            }
            Err(e) => {
                warn!("[Session] Onboarding grant failed for {}: {}", conn, e);
                success(
                    format!("Welcome, {}! Starter cards are unavailable right now.", name),
                    json!({ "sessionId": conn, "username": name, "starterCards": 0 }),
                )
            }
        };

        self.sessions.insert(conn, PlayerSession::new(conn, player));
        out.send(conn, welcome);
        out.send(conn, prompt());
    }

    /// Drop the session, leaving the queue or abandoning the match it was in.
    pub fn on_disconnect(&mut self, conn: ConnId) {
        let Some(session) = self.sessions.remove(&conn) else {
            return;
        };
        match session.state {
            SessionState::Lobby => {}
            SessionState::InQueue => self.matchmaker.do_send(Dequeue { conn }),
            SessionState::InMatch(room) => {
                info!("[Session] {} left room {} mid-match", conn, room.id);
                room.addr.do_send(PlayerLeft { conn });
            }
        }
        debug!("[Session] Session {} ({}) closed", conn, session.player.username);
    }

    /// Route one command through the table of the session's current state.
    pub fn on_message(&mut self, conn: ConnId, envelope: Envelope, out: &mut ConnectionSet) {
        let Some(session) = self.sessions.get_mut(&conn) else {
            return;
        };
        let state = session.state.kind();
        let result = self.router.route(state, &envelope.kind).and_then(|handler| {
            let mut services = Services {
                matchmaker: &self.matchmaker,
                shop: &mut self.shop,
            };
            handler(session, &envelope, &mut services)
        });

        match result {
            Ok(Reply::Respond(response)) => {
                out.send(conn, response);
                out.send(conn, prompt());
            }
            Ok(Reply::Forwarded) => {}
            Err(e) => {
                debug!("[Session] {} rejected {} while {:?}: {}", conn, envelope.kind, state, e);
                out.send(conn, error(e));
                out.send(conn, prompt());
            }
        }
    }

    /// Prepare both paired players for play and open a room.
    ///
    /// A pairing is never turned into a room unless both players are still
    /// queued and both decks are playable. A player whose preparation fails
    /// goes back to the lobby; the other one goes back to the queue.
    pub fn on_match_found(&mut self, msg: MatchFound, out: &mut ConnectionSet) {
        let MatchFound { first, second } = msg;
        let queued = |lobby: &Self, conn: &ConnId| lobby.sessions.get(conn).is_some_and(PlayerSession::is_queued);

        match (queued(self, &first), queued(self, &second)) {
            (true, true) => {}
            (true, false) => return self.requeue(first),
            (false, true) => return self.requeue(second),
            (false, false) => return,
        }

        let prepared = [(first, self.prepare(first)), (second, self.prepare(second))];
        match prepared {
            [(a, Ok(play_a)), (b, Ok(play_b))] => self.open_room(a, play_a, b, play_b),
            prepared => {
                for (conn, result) in prepared {
                    match result {
                        Ok(_) => {
                            if let Some(session) = self.sessions.get_mut(&conn) {
                                let _ = session.player.end_play();
                            }
                            self.requeue(conn);
                        }
                        Err(e) => self.bounce(conn, e, out),
                    }
                }
            }
        }
    }

    /// Close out a finished room and send its players back to the lobby.
    pub fn on_room_finished(&mut self, msg: RoomFinished, out: &mut ConnectionSet) {
        if self.rooms.remove(&msg.room_id).is_none() {
            warn!("[Session] Finished room {} was not registered", msg.room_id);
        }
        info!("[Session] Room {} closed ({:?}), {} open", msg.room_id, msg.outcome, self.rooms.len());

        for conn in msg.players {
            let Some(session) = self.sessions.get_mut(&conn) else {
                continue;
            };
            if !session.state.room().is_some_and(|room| room.id == msg.room_id) {
                continue;
            }
            session.state = SessionState::Lobby;
            if let Err(e) = session.player.end_play() {
                warn!("[Session] Could not reset play state of {}: {}", conn, e);
            }
            out.send(conn, prompt());
        }
    }

    pub fn state_of(&self, conn: &ConnId) -> Option<SessionStateKind> {
        self.sessions.get(conn).map(|s| s.state.kind())
    }

    pub fn open_rooms(&self) -> usize {
        self.rooms.len()
    }

    fn prepare(&mut self, conn: ConnId) -> Result<PlayState, RulesError> {
        match self.sessions.get_mut(&conn) {
            Some(session) => session.player.start_play(),
            None => Err(RulesError::NotInRequiredState("session is gone")),
        }
    }

    /// Put a still-queued session back at the tail of the queue.
    fn requeue(&mut self, conn: ConnId) {
        info!("[Session] Re-queueing {} after a failed pairing", conn);
        self.matchmaker.do_send(Enqueue { conn });
    }

    fn bounce(&mut self, conn: ConnId, e: RulesError, out: &mut ConnectionSet) {
        let Some(session) = self.sessions.get_mut(&conn) else {
            return;
        };
        info!("[Session] {} cannot start a match: {}", conn, e);
        session.state = SessionState::Lobby;
        out.send(conn, error(format!("could not start the match: {}", e)));
        out.send(conn, prompt());
    }

    fn open_room(&mut self, a: ConnId, play_a: PlayState, b: ConnId, play_b: PlayState) {
        let room_id = Uuid::new_v4();
        let seats = [self.seat(a, play_a), self.seat(b, play_b)];
        let table = Table::new(room_id, seats, self.rng.random());
        let addr = GameRoom::new(table, self.outbox.clone(), self.done.clone(), self.timings).start();

        for conn in [a, b] {
            // A player who left and re-joined after being popped is queued again.
            self.matchmaker.do_send(Dequeue { conn });
            if let Some(session) = self.sessions.get_mut(&conn) {
                session.state = SessionState::InMatch(RoomRef {
                    id: room_id,
                    addr: addr.clone(),
                });
            }
        }
        self.rooms.insert(room_id, addr);
        info!("[Session] Room {} opened for {} and {}, {} open", room_id, a, b, self.rooms.len());
    }

    fn seat(&self, conn: ConnId, play: PlayState) -> Seat {
        let name = self
            .sessions
            .get(&conn)
            .map(|s| s.player.username.clone())
            .unwrap_or_default();
        Seat::new(conn, name, play)
    }
}
