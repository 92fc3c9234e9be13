/// Game configuration constants.
///
/// This module defines the main gameplay parameters such as round duration,
/// hand size, deck limits and shop package sizes.
pub const ROUND_DURATION_SECS: u64 = 30; // Time to submit a card each round.

/// Delay (in milliseconds) between game-over announcements.
pub const PACING_DELAY_MILLIS: u64 = 1500;

/// Number of cards each player draws when the room opens.
pub const INITIAL_HAND_SIZE: usize = 5;

/// Number of cards each player draws at the start of every following round.
pub const ROUND_DRAW: usize = 1;

/// Smallest deck accepted when entering a match.
pub const MIN_DECK_SIZE: usize = 10;

/// Largest deck a player can build.
pub const MAX_DECK_SIZE: usize = 20;

/// Cards in one shop package.
pub const PACKAGE_SIZE: usize = 5;

/// Most packages that can be bought in a single purchase.
pub const MAX_PACKAGES_PER_PURCHASE: u32 = 10;

/// Cards granted to every player on first connection.
pub const STARTER_CARDS: usize = 15;

/// Number of cards in the win pile that completes a set.
pub const WINNING_SET_SIZE: usize = 3;
