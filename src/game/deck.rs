//! In-match card zones of one player: draw pile, hand, the card in play,
//! and the win / out piles.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::config::game::WINNING_SET_SIZE;
use crate::game::error::RulesError;
use crate::game::types::{Card, Element};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayState {
    pub(crate) draw_pile: Vec<Card>,
    pub(crate) hand: Vec<Card>,
    pub(crate) in_play: Option<Card>,
    pub(crate) won: Vec<Card>,
    pub(crate) out: Vec<Card>,
}

impl PlayState {
    /// A fresh play state whose draw pile is `cards`, top of the pile last.
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            draw_pile: cards,
            ..Self::default()
        }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.draw_pile.shuffle(rng);
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn won(&self) -> &[Card] {
        &self.won
    }

    pub fn out(&self) -> &[Card] {
        &self.out
    }

    pub fn cards_left(&self) -> usize {
        self.draw_pile.len()
    }

    /// Move `n` cards from the draw pile to the hand.
    ///
    /// Nothing is drawn unless all `n` cards are available.
    pub fn draw(&mut self, n: usize) -> Result<Vec<Card>, RulesError> {
        let left = self.draw_pile.len();
        if left < n {
            return Err(RulesError::DeckExhausted { wanted: n, left });
        }
        let drawn: Vec<Card> = self.draw_pile.drain(left - n..).rev().collect();
        self.hand.extend(drawn.iter().copied());
        Ok(drawn)
    }

    /// Take the card at `index` out of the hand and put it in play.
    pub fn play_from_hand(&mut self, index: usize) -> Result<Card, RulesError> {
        if self.in_play.is_some() {
            return Err(RulesError::NotInRequiredState("a card is already in play"));
        }
        if index >= self.hand.len() {
            return Err(RulesError::IndexOutOfRange {
                index,
                len: self.hand.len(),
            });
        }
        let card = self.hand.remove(index);
        self.in_play = Some(card);
        Ok(card)
    }

    /// Move the card in play to the win pile if `won`, else to the out pile.
    pub fn resolve_play(&mut self, won: bool) -> Result<Card, RulesError> {
        let card = self
            .in_play
            .take()
            .ok_or(RulesError::NotInRequiredState("no card in play"))?;
        if won {
            self.won.push(card);
        } else {
            self.out.push(card);
        }
        Ok(card)
    }

    /// True when the win pile holds a complete set: three cards of one
    /// color, one card of every element, or three cards of one element.
    pub fn check_win_condition(&self) -> bool {
        let same_color = self
            .won
            .iter()
            .any(|c| self.won.iter().filter(|o| o.color == c.color).count() >= WINNING_SET_SIZE);
        let elements: HashSet<Element> = self.won.iter().map(|c| c.element).collect();
        let every_element = elements.len() == Element::ALL.len();
        let same_element = Element::ALL
            .iter()
            .any(|e| self.won.iter().filter(|c| c.element == *e).count() >= WINNING_SET_SIZE);
        same_color || every_element || same_element
    }
}
