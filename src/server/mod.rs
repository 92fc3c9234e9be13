//! Server layer root module.
//!
//! - `protocol`: wire envelope, framing codec and command vocabulary
//! - `connection`: TCP and WebSocket transports
//! - `hub`: connection registry and event loop
//! - `session`: per-player state machine and command tables
//! - `matchmaking`: FIFO pairing queue
//! - `game_room`: one actor per match

pub mod connection;
pub mod game_room;
pub mod hub;
pub mod matchmaking;
pub mod protocol;
pub mod router;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
