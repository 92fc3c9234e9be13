use actix::prelude::*;

use super::table::{MatchOutcome, RoomId};
use crate::server::hub::ConnId;

/// A seated player plays the card at `card_index` of their hand.
#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct PlayCard {
    pub conn: ConnId,
    pub card_index: usize,
}

/// A seated player disconnected; the match ends as an abandonment.
#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct PlayerLeft {
    pub conn: ConnId,
}

/// Done-signal sent to the room's creator once game over is fully announced.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct RoomFinished {
    pub room_id: RoomId,
    pub players: [ConnId; 2],
    pub outcome: MatchOutcome,
}
