/// Matchmaking module: FIFO queue of waiting sessions, paired on a fixed tick.

pub mod messages;
pub mod server;
