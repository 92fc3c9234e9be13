//! Real-time session server for a two-player turn-based card game.

pub mod config;
pub mod game;
pub mod server;
