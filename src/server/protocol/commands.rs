//! Client commands, their payload shapes, and the three server response kinds.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::server::protocol::envelope::Envelope;

pub const RESPONSE_SUCCESS: &str = "RESPONSE_SUCCESS";
pub const RESPONSE_ERROR: &str = "RESPONSE_ERROR";
pub const PROMPT_INPUT: &str = "PROMPT_INPUT";

/// Every command a client can send, in any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    FindMatch,
    LeaveQueue,
    PurchasePackage,
    PurchaseMultiPackage,
    ViewCollection,
    ViewDeck,
    AddCardToDeck,
    RemoveCardFromDeck,
    ReplaceCardToDeck,
    PlayCard,
}

impl Command {
    pub const ALL: [Command; 10] = [
        Command::FindMatch,
        Command::LeaveQueue,
        Command::PurchasePackage,
        Command::PurchaseMultiPackage,
        Command::ViewCollection,
        Command::ViewDeck,
        Command::AddCardToDeck,
        Command::RemoveCardFromDeck,
        Command::ReplaceCardToDeck,
        Command::PlayCard,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Command::FindMatch => "FIND_MATCH",
            Command::LeaveQueue => "LEAVE_QUEUE",
            Command::PurchasePackage => "PURCHASE_PACKAGE",
            Command::PurchaseMultiPackage => "PURCHASE_MULTI_PACKAGE",
            Command::ViewCollection => "VIEW_COLLECTION",
            Command::ViewDeck => "VIEW_DECK",
            Command::AddCardToDeck => "ADD_CARD_TO_DECK",
            Command::RemoveCardFromDeck => "REMOVE_CARD_FROM_DECK",
            Command::ReplaceCardToDeck => "REPLACE_CARD_TO_DECK",
            Command::PlayCard => "PLAY_CARD",
        }
    }

    pub fn from_wire(name: &str) -> Option<Command> {
        Command::ALL.into_iter().find(|c| c.wire_name() == name)
    }

    /// An envelope carrying this command, as a client would send it.
    pub fn envelope(self, payload: Value) -> Envelope {
        Envelope::new(self.wire_name(), payload)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseMultiPackage {
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCardToDeck {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveCardFromDeck {
    pub index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceCardToDeck {
    pub index: usize,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayCard {
    pub card_index: usize,
}

/// `RESPONSE_SUCCESS{message, data}`.
pub fn success(message: impl Into<String>, data: Value) -> Envelope {
    Envelope::new(
        RESPONSE_SUCCESS,
        json!({ "message": message.into(), "data": data }),
    )
}

/// `RESPONSE_ERROR{error}`.
pub fn error(error: impl ToString) -> Envelope {
    Envelope::new(RESPONSE_ERROR, json!({ "error": error.to_string() }))
}

/// `PROMPT_INPUT`: the client may send its next command.
pub fn prompt() -> Envelope {
    Envelope::bare(PROMPT_INPUT)
}
