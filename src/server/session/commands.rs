//! Per-state command tables.
//!
//! Each session state owns one table mapping a [`Command`] to its handler.
//! The tables are built once at startup and checked for duplicates and
//! unreachable commands, so a bad registration stops the server before it
//! accepts a single connection.

use std::collections::HashMap;

use actix::Addr;
use thiserror::Error;

use super::handlers;
use super::session::{PlayerSession, SessionStateKind};
use crate::game::error::{RulesError, ShopError};
use crate::game::shop::PurchaseService;
use crate::server::matchmaking::server::Matchmaker;
use crate::server::protocol::Envelope;
use crate::server::protocol::commands::Command;

/// What a handler produced.
pub enum Reply {
    /// Send this response, then prompt for the next command.
    Respond(Envelope),
    /// Another actor (matchmaker or room) will answer and prompt.
    Forwarded,
}

/// Collaborators a handler may call, borrowed from the session layer.
pub struct Services<'a> {
    pub matchmaker: &'a Addr<Matchmaker>,
    pub shop: &'a mut Box<dyn PurchaseService>,
}

pub type Handler = fn(&mut PlayerSession, &Envelope, &mut Services<'_>) -> Result<Reply, CommandError>;

/// Errors reported to the client as `RESPONSE_ERROR`.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command '{command}' while {state}")]
    UnknownCommand {
        command: String,
        state: SessionStateKind,
    },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("not allowed while {0}")]
    WrongState(SessionStateKind),

    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error(transparent)]
    Shop(#[from] ShopError),
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        CommandError::InvalidPayload(e.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("{command:?} registered twice for state {state:?}")]
    Duplicate {
        state: SessionStateKind,
        command: Command,
    },

    #[error("{0:?} is not reachable from any state")]
    Unreachable(Command),

    #[error("state {0:?} has no commands")]
    EmptyTable(SessionStateKind),
}

#[derive(Default)]
pub struct CommandRouter {
    tables: HashMap<SessionStateKind, HashMap<Command, Handler>>,
}

impl CommandRouter {
    /// Build and validate the lobby, queue and match tables.
    pub fn new() -> Result<Self, RouterError> {
        use Command::*;
        use SessionStateKind::*;

        let mut router = CommandRouter::default();
        router.register(Lobby, FindMatch, handlers::find_match)?;
        router.register(Lobby, LeaveQueue, handlers::leave_queue_idle)?;
        router.register(Lobby, PurchasePackage, handlers::purchase_package)?;
        router.register(Lobby, PurchaseMultiPackage, handlers::purchase_multi_package)?;
        router.register(Lobby, ViewCollection, handlers::view_collection)?;
        router.register(Lobby, ViewDeck, handlers::view_deck)?;
        router.register(Lobby, AddCardToDeck, handlers::add_card_to_deck)?;
        router.register(Lobby, RemoveCardFromDeck, handlers::remove_card_from_deck)?;
        router.register(Lobby, ReplaceCardToDeck, handlers::replace_card_to_deck)?;

        router.register(InQueue, LeaveQueue, handlers::leave_queue)?;

        router.register(InMatch, PlayCard, handlers::play_card)?;

        router.validate()?;
        Ok(router)
    }

    fn register(
        &mut self,
        state: SessionStateKind,
        command: Command,
        handler: Handler,
    ) -> Result<(), RouterError> {
        let table = self.tables.entry(state).or_default();
        if table.insert(command, handler).is_some() {
            return Err(RouterError::Duplicate { state, command });
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), RouterError> {
        for state in SessionStateKind::ALL {
            if self.tables.get(&state).is_none_or(|t| t.is_empty()) {
                return Err(RouterError::EmptyTable(state));
            }
        }
        for command in Command::ALL {
            if !self.tables.values().any(|t| t.contains_key(&command)) {
                return Err(RouterError::Unreachable(command));
            }
        }
        Ok(())
    }

    /// Find the handler for `kind` in the table of `state` only.
    pub fn route(&self, state: SessionStateKind, kind: &str) -> Result<Handler, CommandError> {
        Command::from_wire(kind)
            .and_then(|command| self.tables.get(&state)?.get(&command))
            .copied()
            .ok_or_else(|| CommandError::UnknownCommand {
                command: kind.to_string(),
                state,
            })
    }

    /// Commands accepted in `state`, by wire name.
    pub fn commands_for(&self, state: SessionStateKind) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .tables
            .get(&state)
            .map(|t| t.keys().map(|c| c.wire_name()).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}
