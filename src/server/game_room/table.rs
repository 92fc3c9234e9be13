//! Round state machine of one match, kept apart from the actor so it can be
//! driven synchronously. The room actor owns exactly one `Table`.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::game::{INITIAL_HAND_SIZE, ROUND_DRAW};
use crate::game::deck::PlayState;
use crate::game::error::RulesError;
use crate::game::types::{Card, Versus, compare};
use crate::server::hub::ConnId;

pub type RoomId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomPhase {
    RoomStart,
    WaitingForPlays,
    ResolvingRound,
    RoundStart,
    GameOver,
}

/// One of the two players at the table, with the play state moved in from
/// their player model.
#[derive(Debug)]
pub struct Seat {
    pub conn: ConnId,
    pub name: String,
    pub play: PlayState,
}

impl Seat {
    pub fn new(conn: ConnId, name: String, play: PlayState) -> Self {
        Self { conn, name, play }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchOutcome {
    /// Seat index of the winner.
    Winner(usize),
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndReason {
    /// A win pile completed a set.
    Victory,
    /// Not enough cards left to deal.
    DeckOut,
    /// Nothing left to force-play at timeout.
    EmptyHand,
    /// A player disconnected.
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOver {
    pub outcome: MatchOutcome,
    pub reason: EndReason,
}

impl GameOver {
    /// Opponent of every failed seat wins; both failing is a draw.
    fn from_failures(failed: [bool; 2], reason: EndReason) -> Option<GameOver> {
        let outcome = match failed {
            [false, false] => return None,
            [true, true] => MatchOutcome::Draw,
            [true, false] => MatchOutcome::Winner(1),
            [false, true] => MatchOutcome::Winner(0),
        };
        Some(GameOver { outcome, reason })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayError {
    #[error("you are not seated in this room")]
    NotSeated,

    #[error("plays are not accepted right now")]
    NotAcceptingPlays(RoomPhase),

    #[error("you already played a card this round")]
    DuplicatePlay,

    #[error(transparent)]
    Rules(#[from] RulesError),
}

/// What happened in one resolved round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    pub round: u32,
    /// Cards by seat index.
    pub cards: [Card; 2],
    pub versus: Versus,
}

#[derive(Debug)]
pub enum RoundResult {
    Continue(RoundReport),
    Over(RoundReport, GameOver),
}

pub struct Table {
    pub id: RoomId,
    seats: [Seat; 2],
    phase: RoomPhase,
    played: HashMap<ConnId, Card>,
    round: u32,
    rng: StdRng,
}

impl Table {
    pub fn new(id: RoomId, seats: [Seat; 2], seed: u64) -> Self {
        Self {
            id,
            seats,
            phase: RoomPhase::RoomStart,
            played: HashMap::new(),
            round: 1,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn seats(&self) -> &[Seat; 2] {
        &self.seats
    }

    pub fn seat_of(&self, conn: &ConnId) -> Option<usize> {
        self.seats.iter().position(|s| s.conn == *conn)
    }

    pub fn shuffle(&mut self) {
        for seat in &mut self.seats {
            seat.play.shuffle(&mut self.rng);
        }
    }

    /// Draw the opening hands and start waiting for plays.
    pub fn deal_opening_hands(&mut self) -> Result<(), GameOver> {
        self.deal(INITIAL_HAND_SIZE)
    }

    /// Draw one card each for the next round.
    pub fn deal_round(&mut self) -> Result<(), GameOver> {
        self.phase = RoomPhase::RoundStart;
        self.deal(ROUND_DRAW)
    }

    fn deal(&mut self, n: usize) -> Result<(), GameOver> {
        let failed = [0, 1].map(|i| self.seats[i].play.draw(n).is_err());
        if let Some(over) = GameOver::from_failures(failed, EndReason::DeckOut) {
            self.phase = RoomPhase::GameOver;
            return Err(over);
        }
        self.phase = RoomPhase::WaitingForPlays;
        Ok(())
    }

    /// Take the card at `index` from the player's hand for this round.
    pub fn submit_play(&mut self, conn: ConnId, index: usize) -> Result<Card, PlayError> {
        let seat = self.seat_of(&conn).ok_or(PlayError::NotSeated)?;
        if self.phase != RoomPhase::WaitingForPlays {
            return Err(PlayError::NotAcceptingPlays(self.phase));
        }
        if self.played.contains_key(&conn) {
            return Err(PlayError::DuplicatePlay);
        }
        let card = self.seats[seat].play.play_from_hand(index)?;
        self.played.insert(conn, card);
        Ok(card)
    }

    pub fn all_played(&self) -> bool {
        self.seats.iter().all(|s| self.played.contains_key(&s.conn))
    }

    /// Timeout policy: play a uniformly random card for every seat that has
    /// not played. Returns the forced seats with their cards, or the end of
    /// the match when a seat that must play has an empty hand.
    pub fn force_missing_plays(&mut self) -> Result<Vec<(usize, Card)>, GameOver> {
        let missing: Vec<usize> = (0..2)
            .filter(|&i| !self.played.contains_key(&self.seats[i].conn))
            .collect();

        let empty = [0, 1].map(|i| missing.contains(&i) && self.seats[i].play.hand().is_empty());
        if let Some(over) = GameOver::from_failures(empty, EndReason::EmptyHand) {
            self.phase = RoomPhase::GameOver;
            return Err(over);
        }

        let mut forced = Vec::with_capacity(missing.len());
        for i in missing {
            let index = self.rng.random_range(0..self.seats[i].play.hand().len());
            let conn = self.seats[i].conn;
            // In range by construction, and the seat has nothing in play.
            if let Ok(card) = self.seats[i].play.play_from_hand(index) {
                self.played.insert(conn, card);
                forced.push((i, card));
            }
        }
        Ok(forced)
    }

    /// Compare the two played cards, move them to win/out piles and check
    /// both win piles.
    pub fn resolve_round(&mut self) -> Result<RoundResult, PlayError> {
        if self.phase != RoomPhase::WaitingForPlays || !self.all_played() {
            return Err(PlayError::NotAcceptingPlays(self.phase));
        }
        self.phase = RoomPhase::ResolvingRound;

        let cards = [0, 1].map(|i| self.played[&self.seats[i].conn]);
        let versus = compare(&cards[0], &cards[1]);
        let won = [versus == Versus::FirstWins, versus == Versus::SecondWins];
        for (seat, won) in self.seats.iter_mut().zip(won) {
            seat.play.resolve_play(won)?;
        }
        self.played.clear();

        let report = RoundReport {
            round: self.round,
            cards,
            versus,
        };
        self.round += 1;

        // Both completing a set in the same round is a draw.
        let complete = [0, 1].map(|i| self.seats[i].play.check_win_condition());
        let outcome = match complete {
            [false, false] => return Ok(RoundResult::Continue(report)),
            [true, true] => MatchOutcome::Draw,
            [true, false] => MatchOutcome::Winner(0),
            [false, true] => MatchOutcome::Winner(1),
        };
        self.phase = RoomPhase::GameOver;
        Ok(RoundResult::Over(report, GameOver { outcome, reason: EndReason::Victory }))
    }

    /// The seat of `conn` left: the other one wins. `None` once the match is over.
    pub fn abandon(&mut self, conn: &ConnId) -> Option<GameOver> {
        if self.phase == RoomPhase::GameOver {
            return None;
        }
        let seat = self.seat_of(conn)?;
        self.phase = RoomPhase::GameOver;
        Some(GameOver {
            outcome: MatchOutcome::Winner(1 - seat),
            reason: EndReason::Abandoned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::{Color, Element};

    fn card(element: Element, color: Color, power: u8) -> Card {
        Card::new(element, color, power)
    }

    /// A table whose draw piles are dealt in the given order (first card
    /// first), without shuffling.
    fn table(first: Vec<Card>, second: Vec<Card>) -> Table {
        let seat = |cards: Vec<Card>| {
            let mut cards = cards;
            cards.reverse();
            Seat::new(Uuid::new_v4(), "p".into(), PlayState::new(cards))
        };
        Table::new(Uuid::new_v4(), [seat(first), seat(second)], 7)
    }

    fn filler(n: usize, color: Color) -> Vec<Card> {
        (1..=n as u8).map(|p| card(Element::Water, color, p)).collect()
    }

    #[test]
    fn test_non_tying_round_moves_one_card_each_way() {
        let mut first = vec![card(Element::Fire, Color::Red, 3)];
        first.extend(filler(6, Color::Blue));
        let mut second = vec![card(Element::Snow, Color::Green, 9)];
        second.extend(filler(6, Color::Yellow));
        let mut t = table(first, second);
        t.deal_opening_hands().unwrap();
        let [a, b] = [t.seats[0].conn, t.seats[1].conn];

        assert_eq!(t.submit_play(a, 0).unwrap(), card(Element::Fire, Color::Red, 3));
        t.submit_play(b, 0).unwrap();
        assert!(t.all_played());

        let RoundResult::Continue(report) = t.resolve_round().unwrap() else {
            panic!("round should not end the match");
        };
        assert_eq!(report.versus, Versus::FirstWins);
        assert_eq!(t.seats[0].play.won().len(), 1);
        assert_eq!(t.seats[1].play.out().len(), 1);
        assert!(t.seats[0].play.out().is_empty() && t.seats[1].play.won().is_empty());
        assert_eq!(t.seats[1].play.hand().len(), INITIAL_HAND_SIZE - 1);
        assert_eq!(t.round(), 2);
    }

    #[test]
    fn test_duplicate_play_has_no_side_effect() {
        let mut t = table(filler(6, Color::Red), filler(6, Color::Blue));
        t.deal_opening_hands().unwrap();
        let a = t.seats[0].conn;
        t.submit_play(a, 0).unwrap();
        assert_eq!(t.submit_play(a, 0), Err(PlayError::DuplicatePlay));
        assert_eq!(t.seats[0].play.hand().len(), INITIAL_HAND_SIZE - 1);
        assert_eq!(t.submit_play(Uuid::new_v4(), 0), Err(PlayError::NotSeated));
    }

    #[test]
    fn test_forced_play_is_seeded_and_from_hand() {
        let run = || {
            let mut t = table(filler(6, Color::Red), filler(6, Color::Blue));
            t.deal_opening_hands().unwrap();
            let a = t.seats[0].conn;
            let hand_b = t.seats[1].play.hand().to_vec();
            t.submit_play(a, 2).unwrap();
            let forced = t.force_missing_plays().unwrap();
            assert_eq!(forced.len(), 1);
            let (seat, card) = forced[0];
            assert_eq!(seat, 1);
            assert_eq!(t.played[&t.seats[1].conn], card);
            assert!(hand_b.contains(&card));
            assert!(t.all_played());
            card
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_empty_hand_at_timeout_loses() {
        let mut t = table(filler(6, Color::Red), filler(6, Color::Blue));
        t.deal_opening_hands().unwrap();
        t.seats[1].play.hand.clear();
        let over = t.force_missing_plays().unwrap_err();
        assert_eq!(over.outcome, MatchOutcome::Winner(0));
        assert_eq!(over.reason, EndReason::EmptyHand);

        let mut t = table(filler(6, Color::Red), filler(6, Color::Blue));
        t.deal_opening_hands().unwrap();
        t.seats[0].play.hand.clear();
        t.seats[1].play.hand.clear();
        assert_eq!(t.force_missing_plays().unwrap_err().outcome, MatchOutcome::Draw);
    }

    #[test]
    fn test_simultaneous_win_is_a_draw() {
        let mut t = table(filler(6, Color::Red), filler(6, Color::Blue));
        t.deal_opening_hands().unwrap();
        // Two cards of one color banked on each side.
        t.seats[0].play.won = filler(2, Color::Red);
        t.seats[1].play.won = filler(2, Color::Blue);
        let [a, b] = [t.seats[0].conn, t.seats[1].conn];
        t.seats[0].play.hand[0] = card(Element::Fire, Color::Red, 5);
        t.seats[1].play.hand[0] = card(Element::Snow, Color::Blue, 5);
        t.submit_play(a, 0).unwrap();
        t.submit_play(b, 0).unwrap();
        // Fire beats snow, so only the first seat banks its card.
        let RoundResult::Over(_, over) = t.resolve_round().unwrap() else {
            panic!("first seat completed a set");
        };
        assert_eq!(over.outcome, MatchOutcome::Winner(0));

        let mut t = table(filler(6, Color::Red), filler(6, Color::Blue));
        t.deal_opening_hands().unwrap();
        t.seats[0].play.won = filler(3, Color::Red);
        t.seats[1].play.won = filler(3, Color::Blue);
        let [a, b] = [t.seats[0].conn, t.seats[1].conn];
        t.submit_play(a, 0).unwrap();
        t.submit_play(b, 0).unwrap();
        let RoundResult::Over(_, over) = t.resolve_round().unwrap() else {
            panic!("both seats hold a set");
        };
        assert_eq!(over.outcome, MatchOutcome::Draw);
        assert_eq!(t.phase(), RoomPhase::GameOver);
    }

    #[test]
    fn test_deck_out_on_deal() {
        let mut t = table(filler(5, Color::Red), filler(6, Color::Blue));
        t.deal_opening_hands().unwrap();
        let over = t.deal_round().unwrap_err();
        assert_eq!(over, GameOver { outcome: MatchOutcome::Winner(1), reason: EndReason::DeckOut });

        let mut t = table(filler(3, Color::Red), filler(4, Color::Blue));
        assert_eq!(t.deal_opening_hands().unwrap_err().outcome, MatchOutcome::Draw);
        assert_eq!(t.phase(), RoomPhase::GameOver);
    }

    #[test]
    fn test_abandon_only_once() {
        let mut t = table(filler(6, Color::Red), filler(6, Color::Blue));
        let a = t.seats[0].conn;
        assert_eq!(t.abandon(&a).map(|o| o.outcome), Some(MatchOutcome::Winner(1)));
        assert_eq!(t.abandon(&a), None);
    }
}
