/// Game room module: one actor per match, driving the round state machine.

pub mod messages;
pub mod server;
pub mod table;
