//! Message types for the tagged-action wire format.
//!
//! Every frame on the wire is a single JSON object with a mandatory string
//! field `action` selecting the schema. Inbound frames are decoded once at
//! this boundary into the closed [`Inbound`] variant; nothing downstream
//! ever sees an untyped map. Outbound frames are flat JSON objects built
//! from [`Outbound`].
//!
//! Player-indexed maps (`player_names`, `player_card_counts`, `scores`,
//! `round_scores`) arrive with decimal string keys; keys that fail integer
//! parsing are dropped silently rather than failing the decode.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Deserializes a string-keyed map into a player-indexed map, dropping
/// keys that are not decimal integers.
fn player_map<'de, D, V>(deserializer: D) -> Result<HashMap<usize, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let raw = HashMap::<String, V>::deserialize(deserializer)?;
    let mut map = HashMap::with_capacity(raw.len());
    for (key, value) in raw {
        match key.parse::<usize>() {
            Ok(index) => {
                map.insert(index, value);
            }
            Err(_) => {
                tracing::debug!(key, "dropping non-numeric player map key");
            }
        }
    }
    Ok(map)
}

/// Decodes one `game_state` field without ever failing it: a
/// wrong-typed value is dropped with a debug log and the field falls
/// back to its default, so the rest of the frame still applies.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(T::deserialize(deserializer).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "dropping wrong-typed field");
        T::default()
    }))
}

/// Optional, lenient variant of [`player_map`] for `game_state` fields.
fn opt_player_map<'de, D, V>(
    deserializer: D,
) -> Result<Option<HashMap<usize, V>>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let raw = match Option::<HashMap<String, V>>::deserialize(deserializer) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(error = %e, "dropping wrong-typed player map");
            None
        }
    };
    Ok(raw.map(|m| {
        m.into_iter()
            .filter_map(|(k, v)| match k.parse::<usize>() {
                Ok(index) => Some((index, v)),
                Err(_) => {
                    tracing::debug!(key = %k, "dropping non-numeric player map key");
                    None
                }
            })
            .collect()
    }))
}

/// The last play shown at the table: an ordered card sequence plus the
/// name of the player who made it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct LastCards {
    /// Cards in play order.
    #[serde(default, deserialize_with = "lenient")]
    pub cards: Vec<String>,
    /// Display name of the originating player.
    #[serde(default, deserialize_with = "lenient")]
    pub player_name: String,
}

/// A full `game_state` update.
///
/// Every field is individually optional AND individually tolerant: a
/// recognized message missing one field, or carrying a wrong-typed value
/// in it, still applies all the others. Boolean turn flags and the
/// optional player-index flags are authoritative per message: absent
/// means false / unset, never "keep the previous value".
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GameStateFrame {
    /// The authoritative set of cards in the local player's hand, in
    /// server order.
    #[serde(default, deserialize_with = "lenient")]
    pub cards: Option<Vec<String>>,
    /// The local player's seat index.
    #[serde(default, deserialize_with = "lenient")]
    pub player_number: Option<usize>,
    /// Seat index → display name.
    #[serde(default, deserialize_with = "opt_player_map")]
    pub player_names: Option<HashMap<usize, String>>,
    /// Seat index → cards remaining.
    #[serde(default, deserialize_with = "opt_player_map")]
    pub player_card_counts: Option<HashMap<usize, usize>>,
    /// Seat index → running total score.
    #[serde(default, deserialize_with = "opt_player_map")]
    pub scores: Option<HashMap<usize, i32>>,
    /// Whether it is the local player's turn.
    #[serde(default, deserialize_with = "lenient")]
    pub current_player: Option<bool>,
    /// The most recent play at the table.
    #[serde(default, deserialize_with = "lenient")]
    pub last_cards: Option<LastCards>,
    /// The local player may fork the current play.
    #[serde(default, deserialize_with = "lenient")]
    pub can_fork: bool,
    /// A fork is pending and the table is waiting for a hook.
    #[serde(default, deserialize_with = "lenient")]
    pub waiting_for_hook: bool,
    /// The local player may hook the pending fork.
    #[serde(default, deserialize_with = "lenient")]
    pub can_hook: bool,
    /// The local player is giving light.
    #[serde(default, deserialize_with = "lenient")]
    pub is_giving_light: bool,
    /// Seat index of the forking player, if any.
    #[serde(default, deserialize_with = "lenient")]
    pub fork_player: Option<usize>,
    /// Seat index of the hooking player, if any.
    #[serde(default, deserialize_with = "lenient")]
    pub hook_player: Option<usize>,
}

/// A decoded inbound protocol message.
///
/// Frames that are not JSON objects or lack the `action` field fail to
/// decode and are discarded by the connection manager. Recognized-but-new
/// actions decode to [`Inbound::Unknown`], which the reducer treats as a
/// strict no-op.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Inbound {
    /// The server created a room for us.
    RoomCreated {
        /// Identifier to share with other players.
        room_id: String,
    },

    /// Result of a join request.
    JoinedRoom {
        /// Whether the join succeeded.
        success: bool,
        /// Rejection reason, present on failure.
        #[serde(default)]
        message: Option<String>,
    },

    /// The game in our room has started.
    GameStarted,

    /// Room membership update.
    RoomState {
        /// Number of players currently seated.
        player_count: usize,
    },

    /// Full authoritative game-state update.
    GameState(GameStateFrame),

    /// The round is over. Payload scores are the new totals, not deltas.
    GameOver {
        /// Seat index → final total score.
        #[serde(deserialize_with = "player_map")]
        scores: HashMap<usize, i32>,
        /// Seat index → this round's score delta.
        #[serde(deserialize_with = "player_map")]
        round_scores: HashMap<usize, i32>,
    },

    /// A peer threw a brick at another player.
    ThrowBrick {
        /// Seat index of the thrower.
        from_player: usize,
        /// Seat index of the target.
        to_player: usize,
    },

    /// A peer showed the fire effect.
    ShowFire {
        /// Seat index of the player showing fire.
        player_index: usize,
    },

    /// An application error reported by the server. Not a connection
    /// fault; surfaced verbatim to presentation.
    Error {
        /// Human-readable error text.
        message: String,
    },

    /// Any action this client does not recognize.
    #[serde(other)]
    Unknown,
}

/// An outbound protocol message. Fire-and-forget: the protocol has no
/// request/response correlation, so there is nothing to track after send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Outbound {
    /// Create a new room with the given number of decks.
    CreateRoom {
        /// Number of decks to shuffle in.
        deck_count: u32,
    },

    /// Join an existing room by id.
    JoinRoom {
        /// The room to join.
        room_id: String,
    },

    /// Start the game in the current room.
    StartGame,

    /// Play the given cards. Card identifiers must be canonical tokens
    /// (positional suffixes already stripped).
    PlayCards {
        /// Canonical card tokens, in play order.
        cards: Vec<String>,
    },

    /// Pass the turn.
    Pass,

    /// Change the local player's display name.
    ChangeName {
        /// The new display name.
        name: String,
    },

    /// Throw a brick at another player.
    ThrowBrick {
        /// Seat index of the thrower (the local player).
        from_player: usize,
        /// Seat index of the target.
        to_player: usize,
    },

    /// Show the fire effect on the local player's seat.
    ShowFire {
        /// Seat index of the local player.
        player_index: usize,
    },
}

// =========================================================================
// Tests
// =========================================================================
