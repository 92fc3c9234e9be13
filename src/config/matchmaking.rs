/// Matchmaking configuration constants.
///
/// This module defines parameters for the matchmaking queue.
pub const TICK_INTERVAL_MILLIS: u64 = 1000; // Period of the pairing tick.

/// Number of players paired into one room.
pub const PLAYERS_PER_MATCH: usize = 2;
