use serde::Serialize;

use crate::config::game::{MAX_DECK_SIZE, MIN_DECK_SIZE};
use crate::game::deck::PlayState;
use crate::game::error::RulesError;
use crate::game::types::{Card, CardKey};

/// A player's owned cards and deck list, outside of any match.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerModel {
    pub username: String,
    collection: Vec<CardKey>,
    deck: Vec<CardKey>,
    #[serde(skip)]
    playing: bool,
}

impl PlayerModel {
    pub fn new(username: String) -> Self {
        Self {
            username,
            collection: Vec::new(),
            deck: Vec::new(),
            playing: false,
        }
    }

    pub fn collection(&self) -> &[CardKey] {
        &self.collection
    }

    pub fn deck(&self) -> &[CardKey] {
        &self.deck
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Add purchased cards to the collection.
    pub fn grant(&mut self, keys: impl IntoIterator<Item = CardKey>) {
        self.collection.extend(keys);
    }

    /// Fill the deck from the collection, up to the deck size limit.
    pub fn build_starter_deck(&mut self) {
        self.deck = self.collection.iter().take(MAX_DECK_SIZE).cloned().collect();
    }

    pub fn add_card_to_deck(&mut self, key: &str) -> Result<(), RulesError> {
        self.require_idle()?;
        key.parse::<Card>()?;
        if self.deck.len() >= MAX_DECK_SIZE {
            return Err(RulesError::DeckFull(MAX_DECK_SIZE));
        }
        if !self.has_spare_copy(key, None) {
            return Err(RulesError::NotOwned(key.to_string()));
        }
        self.deck.push(key.to_string());
        Ok(())
    }

    pub fn remove_card_from_deck(&mut self, index: usize) -> Result<CardKey, RulesError> {
        self.require_idle()?;
        self.check_deck_index(index)?;
        Ok(self.deck.remove(index))
    }

    /// Swap the deck entry at `index` for `key`, returning the replaced key.
    pub fn replace_card_in_deck(&mut self, index: usize, key: &str) -> Result<CardKey, RulesError> {
        self.require_idle()?;
        self.check_deck_index(index)?;
        key.parse::<Card>()?;
        if !self.has_spare_copy(key, Some(index)) {
            return Err(RulesError::NotOwned(key.to_string()));
        }
        Ok(std::mem::replace(&mut self.deck[index], key.to_string()))
    }

    /// Enter the play-ready state and hand out the match zones built from the deck.
    pub fn start_play(&mut self) -> Result<PlayState, RulesError> {
        self.require_idle()?;
        if self.deck.len() < MIN_DECK_SIZE {
            return Err(RulesError::DeckTooSmall {
                min: MIN_DECK_SIZE,
                len: self.deck.len(),
            });
        }
        let cards = self
            .deck
            .iter()
            .map(|key| key.parse::<Card>())
            .collect::<Result<Vec<_>, _>>()?;
        self.playing = true;
        Ok(PlayState::new(cards))
    }

    pub fn end_play(&mut self) -> Result<(), RulesError> {
        if !self.playing {
            return Err(RulesError::NotInRequiredState("not playing"));
        }
        self.playing = false;
        Ok(())
    }

    fn require_idle(&self) -> Result<(), RulesError> {
        if self.playing {
            return Err(RulesError::NotInRequiredState("deck is locked during a match"));
        }
        Ok(())
    }

    fn check_deck_index(&self, index: usize) -> Result<(), RulesError> {
        if index >= self.deck.len() {
            return Err(RulesError::IndexOutOfRange {
                index,
                len: self.deck.len(),
            });
        }
        Ok(())
    }

    // Owned copies must exceed the copies already in the deck, not counting `skip`.
    fn has_spare_copy(&self, key: &str, skip: Option<usize>) -> bool {
        let owned = self.collection.iter().filter(|k| *k == key).count();
        let used = self
            .deck
            .iter()
            .enumerate()
            .filter(|(i, k)| Some(*i) != skip && *k == key)
            .count();
        owned > used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<CardKey> {
        (1..=n).map(|p| format!("fire-red-{}", (p - 1) % 12 + 1)).collect()
    }

    #[test]
    fn test_deck_editing_respects_ownership() {
        let mut player = PlayerModel::new("alice".into());
        player.grant(vec!["water-blue-3".to_string()]);

        assert!(player.add_card_to_deck("water-blue-3").is_ok());
        assert_eq!(
            player.add_card_to_deck("water-blue-3"),
            Err(RulesError::NotOwned("water-blue-3".into()))
        );
        assert!(matches!(
            player.add_card_to_deck("nope"),
            Err(RulesError::UnknownCard(_))
        ));
        assert_eq!(player.remove_card_from_deck(0).unwrap(), "water-blue-3");
        assert!(player.remove_card_from_deck(0).is_err());
    }

    #[test]
    fn test_replace_can_reuse_the_slot_copy() {
        let mut player = PlayerModel::new("bob".into());
        player.grant(vec!["snow-green-1".to_string(), "fire-red-2".to_string()]);
        player.add_card_to_deck("snow-green-1").unwrap();

        // Replacing a card with itself only needs the copy already in that slot.
        assert!(player.replace_card_in_deck(0, "snow-green-1").is_ok());
        assert_eq!(player.replace_card_in_deck(0, "fire-red-2").unwrap(), "snow-green-1");
        assert_eq!(player.deck(), &["fire-red-2".to_string()]);
    }

    #[test]
    fn test_start_and_end_play() {
        let mut player = PlayerModel::new("carol".into());
        assert!(matches!(player.start_play(), Err(RulesError::DeckTooSmall { .. })));

        player.grant(keys(MIN_DECK_SIZE));
        player.build_starter_deck();
        let play = player.start_play().unwrap();
        assert_eq!(play.cards_left(), MIN_DECK_SIZE);
        assert!(player.is_playing());
        assert!(player.start_play().is_err());
        assert!(player.add_card_to_deck("fire-red-1").is_err());

        assert!(player.end_play().is_ok());
        assert!(player.end_play().is_err());
    }
}
