use std::fmt;

use actix::Addr;
use serde::Serialize;

use crate::game::player::PlayerModel;
use crate::server::game_room::server::GameRoom;
use crate::server::game_room::table::RoomId;
use crate::server::hub::ConnId;

/// The room a session is playing in.
#[derive(Clone)]
pub struct RoomRef {
    pub id: RoomId,
    pub addr: Addr<GameRoom>,
}

/// Where a player currently is. The room reference only exists in a match.
#[derive(Clone)]
pub enum SessionState {
    Lobby,
    InQueue,
    InMatch(RoomRef),
}

impl SessionState {
    pub fn kind(&self) -> SessionStateKind {
        match self {
            SessionState::Lobby => SessionStateKind::Lobby,
            SessionState::InQueue => SessionStateKind::InQueue,
            SessionState::InMatch(_) => SessionStateKind::InMatch,
        }
    }

    pub fn room(&self) -> Option<&RoomRef> {
        match self {
            SessionState::InMatch(room) => Some(room),
            _ => None,
        }
    }
}

/// Session state without the room reference; selects the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStateKind {
    Lobby,
    InQueue,
    InMatch,
}

impl SessionStateKind {
    pub const ALL: [SessionStateKind; 3] = [
        SessionStateKind::Lobby,
        SessionStateKind::InQueue,
        SessionStateKind::InMatch,
    ];
}

impl fmt::Display for SessionStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStateKind::Lobby => write!(f, "in the lobby"),
            SessionStateKind::InQueue => write!(f, "in the matchmaking queue"),
            SessionStateKind::InMatch => write!(f, "in a match"),
        }
    }
}

/// Server-side state of one connected player.
pub struct PlayerSession {
    pub conn: ConnId,
    pub state: SessionState,
    pub player: PlayerModel,
}

impl PlayerSession {
    pub fn new(conn: ConnId, player: PlayerModel) -> Self {
        Self {
            conn,
            state: SessionState::Lobby,
            player,
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self.state, SessionState::InQueue)
    }
}
