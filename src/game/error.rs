//! Error types raised by the card rules and the shop.

use thiserror::Error;

/// Errors from deck, hand and play-state operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    /// Not enough cards left in the draw pile
    #[error("deck exhausted: wanted {wanted} card(s), {left} left")]
    DeckExhausted { wanted: usize, left: usize },

    /// Hand or deck index outside the valid range
    #[error("index {index} is out of range (size {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Operation not allowed in the current play state
    #[error("not in required state: {0}")]
    NotInRequiredState(&'static str),

    /// Card key not present in the catalog
    #[error("unknown card '{0}'")]
    UnknownCard(String),

    /// Card key not owned (or all owned copies already in the deck)
    #[error("no spare copy of '{0}' in your collection")]
    NotOwned(String),

    /// Deck already holds the maximum number of cards
    #[error("deck is full ({0} cards)")]
    DeckFull(usize),

    /// Deck too small to start a match
    #[error("deck must contain at least {min} cards (has {len})")]
    DeckTooSmall { min: usize, len: usize },
}

/// Errors from the purchase service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    #[error("purchase service unavailable")]
    ServiceUnavailable,

    #[error("invalid purchase quantity {0}")]
    InvalidQuantity(usize),
}
