//! Command handlers. Each one validates its payload and preconditions
//! before touching the session, so a rejected command changes nothing.

use log::debug;
use serde_json::json;

use super::commands::{CommandError, Reply, Services};
use super::session::{PlayerSession, SessionState, SessionStateKind};
use crate::config::game::{MAX_PACKAGES_PER_PURCHASE, PACKAGE_SIZE};
use crate::server::game_room::messages::PlayCard;
use crate::server::matchmaking::messages::{Dequeue, Enqueue};
use crate::server::protocol::Envelope;
use crate::server::protocol::commands::{self, AddCardToDeck, PurchaseMultiPackage, RemoveCardFromDeck, ReplaceCardToDeck};

fn require(session: &PlayerSession, state: SessionStateKind) -> Result<(), CommandError> {
    let current = session.state.kind();
    if current != state {
        return Err(CommandError::WrongState(current));
    }
    Ok(())
}

pub fn find_match(
    session: &mut PlayerSession,
    _envelope: &Envelope,
    services: &mut Services<'_>,
) -> Result<Reply, CommandError> {
    require(session, SessionStateKind::Lobby)?;
    session.state = SessionState::InQueue;
    services.matchmaker.do_send(Enqueue { conn: session.conn });
    Ok(Reply::Forwarded)
}

pub fn leave_queue(
    session: &mut PlayerSession,
    _envelope: &Envelope,
    services: &mut Services<'_>,
) -> Result<Reply, CommandError> {
    require(session, SessionStateKind::InQueue)?;
    session.state = SessionState::Lobby;
    services.matchmaker.do_send(Dequeue { conn: session.conn });
    Ok(Reply::Respond(commands::success("You left the matchmaking queue.", json!(null))))
}

/// `LEAVE_QUEUE` from the lobby: nothing to leave.
pub fn leave_queue_idle(
    _session: &mut PlayerSession,
    _envelope: &Envelope,
    _services: &mut Services<'_>,
) -> Result<Reply, CommandError> {
    Ok(Reply::Respond(commands::success("You are not in the matchmaking queue.", json!(null))))
}

pub fn purchase_package(
    session: &mut PlayerSession,
    _envelope: &Envelope,
    services: &mut Services<'_>,
) -> Result<Reply, CommandError> {
    let keys = services.shop.purchase(PACKAGE_SIZE)?;
    session.player.grant(keys.iter().cloned());
    Ok(Reply::Respond(commands::success(
        "You opened a card package.",
        json!({ "cards": keys }),
    )))
}

pub fn purchase_multi_package(
    session: &mut PlayerSession,
    envelope: &Envelope,
    services: &mut Services<'_>,
) -> Result<Reply, CommandError> {
    let PurchaseMultiPackage { amount } = envelope.payload_as()?;
    if !(1..=MAX_PACKAGES_PER_PURCHASE).contains(&amount) {
        return Err(CommandError::InvalidPayload(format!(
            "amount must be between 1 and {}",
            MAX_PACKAGES_PER_PURCHASE
        )));
    }
    let keys = services.shop.purchase(amount as usize * PACKAGE_SIZE)?;
    session.player.grant(keys.iter().cloned());
    debug!("[Session] {} bought {} packages", session.conn, amount);
    Ok(Reply::Respond(commands::success(
        format!("You opened {} card packages.", amount),
        json!({ "cards": keys }),
    )))
}

pub fn view_collection(
    session: &mut PlayerSession,
    _envelope: &Envelope,
    _services: &mut Services<'_>,
) -> Result<Reply, CommandError> {
    Ok(Reply::Respond(commands::success(
        format!("You own {} cards.", session.player.collection().len()),
        json!({ "cards": session.player.collection() }),
    )))
}

pub fn view_deck(
    session: &mut PlayerSession,
    _envelope: &Envelope,
    _services: &mut Services<'_>,
) -> Result<Reply, CommandError> {
    Ok(Reply::Respond(commands::success(
        format!("Your deck holds {} cards.", session.player.deck().len()),
        json!({ "cards": session.player.deck() }),
    )))
}

pub fn add_card_to_deck(
    session: &mut PlayerSession,
    envelope: &Envelope,
    _services: &mut Services<'_>,
) -> Result<Reply, CommandError> {
    let AddCardToDeck { key } = envelope.payload_as()?;
    session.player.add_card_to_deck(&key)?;
    Ok(Reply::Respond(commands::success(
        format!("Added {} to your deck.", key),
        json!({ "cards": session.player.deck() }),
    )))
}

pub fn remove_card_from_deck(
    session: &mut PlayerSession,
    envelope: &Envelope,
    _services: &mut Services<'_>,
) -> Result<Reply, CommandError> {
    let RemoveCardFromDeck { index } = envelope.payload_as()?;
    let removed = session.player.remove_card_from_deck(index)?;
    Ok(Reply::Respond(commands::success(
        format!("Removed {} from your deck.", removed),
        json!({ "cards": session.player.deck() }),
    )))
}

pub fn replace_card_to_deck(
    session: &mut PlayerSession,
    envelope: &Envelope,
    _services: &mut Services<'_>,
) -> Result<Reply, CommandError> {
    let ReplaceCardToDeck { index, key } = envelope.payload_as()?;
    let replaced = session.player.replace_card_in_deck(index, &key)?;
    Ok(Reply::Respond(commands::success(
        format!("Replaced {} with {} in your deck.", replaced, key),
        json!({ "cards": session.player.deck() }),
    )))
}

pub fn play_card(
    session: &mut PlayerSession,
    envelope: &Envelope,
    _services: &mut Services<'_>,
) -> Result<Reply, CommandError> {
    let payload: commands::PlayCard = envelope.payload_as()?;
    let room = session
        .state
        .room()
        .ok_or(CommandError::WrongState(session.state.kind()))?;
    room.addr.do_send(PlayCard {
        conn: session.conn,
        card_index: payload.card_index,
    });
    Ok(Reply::Forwarded)
}
