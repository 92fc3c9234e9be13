/// Game room actor.
///
/// Owns one match: the table, the round timer and the pacing of the final
/// announcements. Every phase transition happens inside this actor, one
/// message at a time. Clients are reached through the hub's [`Deliver`].

use actix::prelude::*;
use log::{debug, error, info, warn};
use serde_json::json;
use std::time::Duration;

use super::messages::{PlayCard, PlayerLeft, RoomFinished};
use super::table::{GameOver, MatchOutcome, PlayError, RoomPhase, RoundReport, RoundResult, Table};
use crate::game::types::{Card, Versus};
use crate::server::hub::ConnId;
use crate::server::hub::messages::Deliver;
use crate::server::protocol::Envelope;
use crate::server::protocol::commands::{error, prompt, success};

/// Round timer and pause between the game-over announcements.
#[derive(Debug, Clone, Copy)]
pub struct RoomTimings {
    pub round_duration: Duration,
    pub pacing: Duration,
}

pub struct GameRoom {
    table: Table,
    outbox: Recipient<Deliver>,
    done: Recipient<RoomFinished>,
    timings: RoomTimings,
    round_timer: Option<SpawnHandle>,
}

impl GameRoom {
    pub fn new(table: Table, outbox: Recipient<Deliver>, done: Recipient<RoomFinished>, timings: RoomTimings) -> Self {
        Self {
            table,
            outbox,
            done,
            timings,
            round_timer: None,
        }
    }

    fn send_to(&self, conn: ConnId, envelope: Envelope) {
        self.outbox.do_send(Deliver::new(conn, envelope));
    }

    fn send(&self, seat: usize, envelope: Envelope) {
        self.send_to(self.table.seats()[seat].conn, envelope);
    }

    fn announce_start(&self) {
        let seats = self.table.seats();
        for i in 0..2 {
            let opponent = &seats[1 - i].name;
            self.send(
                i,
                success(
                    format!("Match found! You are playing against {}.", opponent),
                    json!({ "roomId": self.table.id, "opponent": opponent }),
                ),
            );
        }
    }

    /// Show each player their hand, prompt, and arm the round timer.
    fn begin_round(&mut self, ctx: &mut Context<Self>) {
        let round = self.table.round();
        for (i, seat) in self.table.seats().iter().enumerate() {
            let hand: Vec<String> = seat.play.hand().iter().map(Card::key).collect();
            self.send(
                i,
                success(
                    format!("Round {}: choose a card to play.", round),
                    json!({ "round": round, "hand": hand, "cardsLeft": seat.play.cards_left() }),
                ),
            );
            self.send(i, prompt());
        }
        let handle = ctx.run_later(self.timings.round_duration, |act, ctx| {
            act.on_timeout(ctx);
        });
        self.round_timer = Some(handle);
    }

    fn cancel_timer(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.round_timer.take() {
            ctx.cancel_future(handle);
        }
    }

    fn on_timeout(&mut self, ctx: &mut Context<Self>) {
        self.round_timer = None;
        if self.table.phase() != RoomPhase::WaitingForPlays {
            return;
        }
        match self.table.force_missing_plays() {
            Ok(forced) => {
                for (seat, card) in forced {
                    debug!("[GameRoom] {} forced {} for seat {}", self.table.id, card, seat);
                    self.send(
                        seat,
                        success(
                            format!("Time is up! {} was played for you.", card),
                            json!({ "card": card.key(), "forced": true }),
                        ),
                    );
                }
                self.resolve(ctx);
            }
            Err(over) => self.game_over(over, ctx),
        }
    }

    fn resolve(&mut self, ctx: &mut Context<Self>) {
        self.cancel_timer(ctx);
        match self.table.resolve_round() {
            Ok(RoundResult::Continue(report)) => {
                self.report(&report);
                match self.table.deal_round() {
                    Ok(()) => self.begin_round(ctx),
                    Err(over) => self.game_over(over, ctx),
                }
            }
            Ok(RoundResult::Over(report, over)) => {
                self.report(&report);
                self.game_over(over, ctx);
            }
            Err(e) => error!("[GameRoom] {} could not resolve round {}: {}", self.table.id, self.table.round(), e),
        }
    }

    fn report(&self, report: &RoundReport) {
        debug!("[GameRoom] {} round {}: {} vs {} -> {:?}", self.table.id, report.round, report.cards[0], report.cards[1], report.versus);
        for (i, seat) in self.table.seats().iter().enumerate() {
            let result = match (report.versus, i) {
                (Versus::Tie, _) => "TIE",
                (Versus::FirstWins, 0) | (Versus::SecondWins, 1) => "WIN",
                _ => "LOSS",
            };
            self.send(
                i,
                success(
                    format!("Round {}: your {} against {}.", report.round, report.cards[i], report.cards[1 - i]),
                    json!({
                        "round": report.round,
                        "yourCard": report.cards[i].key(),
                        "opponentCard": report.cards[1 - i].key(),
                        "result": result,
                        "wonCards": seat.play.won().len(),
                    }),
                ),
            );
        }
    }

    /// Announce the outcome after a pause, pause again, then hand the players
    /// back and stop. The room handles nothing else meanwhile.
    fn game_over(&mut self, over: GameOver, ctx: &mut Context<Self>) {
        self.cancel_timer(ctx);
        info!("[GameRoom] {} game over: {:?} ({:?})", self.table.id, over.outcome, over.reason);

        let pacing = self.timings.pacing;
        ctx.wait(
            fut::wrap_future::<_, Self>(actix::clock::sleep(pacing))
                .map(move |_, act, _ctx| act.announce_outcome(over))
                .then(move |_, _act, _ctx| fut::wrap_future::<_, Self>(actix::clock::sleep(pacing)))
                .map(move |_, act, ctx| act.finish(over, ctx)),
        );
    }

    fn announce_outcome(&self, over: GameOver) {
        for i in 0..2 {
            let (message, outcome) = match over.outcome {
                MatchOutcome::Draw => ("The match ended in a draw.", "DRAW"),
                MatchOutcome::Winner(w) if w == i => ("You won the match!", "WIN"),
                MatchOutcome::Winner(_) => ("You lost the match.", "LOSS"),
            };
            self.send(i, success(message, json!({ "outcome": outcome, "reason": over.reason })));
        }
    }

    fn finish(&mut self, over: GameOver, ctx: &mut Context<Self>) {
        let seats = self.table.seats();
        self.done.do_send(RoomFinished {
            room_id: self.table.id,
            players: [seats[0].conn, seats[1].conn],
            outcome: over.outcome,
        });
        ctx.stop();
    }
}

impl Actor for GameRoom {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let seats = self.table.seats();
        info!("[GameRoom] {} started: {} vs {}", self.table.id, seats[0].name, seats[1].name);
        self.table.shuffle();
        self.announce_start();
        match self.table.deal_opening_hands() {
            Ok(()) => self.begin_round(ctx),
            Err(over) => self.game_over(over, ctx),
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        debug!("[GameRoom] {} stopped", self.table.id);
    }
}

impl Handler<PlayCard> for GameRoom {
    type Result = ();

    fn handle(&mut self, msg: PlayCard, ctx: &mut Self::Context) -> Self::Result {
        match self.table.submit_play(msg.conn, msg.card_index) {
            Ok(card) => {
                self.send_to(
                    msg.conn,
                    success(
                        format!("You played {}. Waiting for your opponent.", card),
                        json!({ "card": card.key() }),
                    ),
                );
                if self.table.all_played() {
                    self.resolve(ctx);
                }
            }
            Err(PlayError::NotSeated) => {
                warn!("[GameRoom] {} got a play from unseated {}", self.table.id, msg.conn);
            }
            Err(e) => {
                self.send_to(msg.conn, error(e));
                self.send_to(msg.conn, prompt());
            }
        }
    }
}

impl Handler<PlayerLeft> for GameRoom {
    type Result = ();

    fn handle(&mut self, msg: PlayerLeft, ctx: &mut Self::Context) -> Self::Result {
        if let Some(over) = self.table.abandon(&msg.conn) {
            info!("[GameRoom] {} abandoned by {}", self.table.id, msg.conn);
            self.game_over(over, ctx);
        }
    }
}
