//! Session layer: per-player state machine and state-selected command tables.

pub mod commands;
pub mod handlers;
pub mod lobby;
pub mod session;

pub use session::{PlayerSession, RoomRef, SessionState, SessionStateKind};
