//! Command builder: user intents → outbound protocol messages.
//!
//! Stateless, no acknowledgment tracking: the protocol has no
//! request/response correlation, so every command is fire-and-forget.

use cardsync_protocol::Outbound;

/// Builds a `create_room` command.
pub fn create_room(deck_count: u32) -> Outbound {
    Outbound::CreateRoom { deck_count }
}

/// Builds a `join_room` command.
pub fn join_room(room_id: impl Into<String>) -> Outbound {
    Outbound::JoinRoom {
        room_id: room_id.into(),
    }
}

/// Builds a `start_game` command.
pub fn start_game() -> Outbound {
    Outbound::StartGame
}

/// Builds a `play_cards` command from selected card identifiers.
///
/// Identifiers may be decorated with a positional suffix for UI
/// disambiguation (`"♠A_0_1"`); only the canonical card token is
/// transmitted.
pub fn play_cards<I>(selected: I) -> Outbound
where
    I: IntoIterator<Item = String>,
{
    let cards = selected
        .into_iter()
        .map(|id| canonical_card(&id))
        .collect();
    Outbound::PlayCards { cards }
}

/// Builds a `pass` command.
pub fn pass() -> Outbound {
    Outbound::Pass
}

/// Builds a `change_name` command.
pub fn change_name(name: impl Into<String>) -> Outbound {
    Outbound::ChangeName { name: name.into() }
}

/// Builds a `throw_brick` command from the local seat at a target seat.
pub fn throw_brick(from_player: usize, to_player: usize) -> Outbound {
    Outbound::ThrowBrick {
        from_player,
        to_player,
    }
}

/// Builds a `show_fire` command for the local seat.
pub fn show_fire(player_index: usize) -> Outbound {
    Outbound::ShowFire { player_index }
}

/// Strips the positional suffix from a decorated card identifier.
fn canonical_card(id: &str) -> String {
    match id.split_once('_') {
        Some((token, _)) => token.to_string(),
        None => id.to_string(),
    }
}
