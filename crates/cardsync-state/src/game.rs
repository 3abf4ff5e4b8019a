//! The synchronized game-state aggregate.
//!
//! [`GameState`] is the client's local view of the room and the game as
//! last told by the server. It has exactly one writer, the reducer
//! invoked on the owning driver task, and is exposed to presentation as
//! read-only snapshots.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// The most recent play at the table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LastPlay {
    /// Cards in play order.
    pub cards: Vec<String>,
    /// Display name of the player who made the play.
    pub player_name: String,
}

/// Per-message turn flags.
///
/// These are authoritative per `game_state` message: a flag absent from a
/// payload means false/unset, never "whatever it was before". The reducer
/// therefore overwrites the whole struct on every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TurnFlags {
    /// The local player may fork the current play.
    pub can_fork: bool,
    /// A fork is pending and the table is waiting for a hook.
    pub waiting_for_hook: bool,
    /// The local player may hook the pending fork.
    pub can_hook: bool,
    /// The local player is giving light.
    pub is_giving_light: bool,
    /// Seat index of the forking player, if any.
    pub fork_player: Option<usize>,
    /// Seat index of the hooking player, if any.
    pub hook_player: Option<usize>,
}

/// The client's synchronized view of room and game state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GameState {
    /// The room we created or joined.
    pub room_id: String,
    /// Whether we are seated in a room.
    pub in_room: bool,
    /// Number of players currently in the room.
    pub player_count: usize,
    /// The local player's seat index.
    pub local_player: Option<usize>,
    /// Seat index → display name.
    pub player_names: HashMap<usize, String>,
    /// Seat index → cards remaining in that player's hand.
    pub player_card_counts: HashMap<usize, usize>,
    /// Seat index → running total score. Replaced wholesale by each
    /// authoritative scores payload, never merged.
    pub scores: HashMap<usize, i32>,
    /// Seat index of the player whose turn it is, when it is ours.
    pub current_player: Option<usize>,
    /// The server-declared set of cards in our hand, in server order.
    /// Unordered in meaning; the ordered view lives in the hand
    /// reconciler.
    pub authoritative_hand: Vec<String>,
    /// The most recent play at the table.
    pub last_play: Option<LastPlay>,
    /// Turn flags for the current message.
    pub turn: TurnFlags,
    /// Cards the user has selected for their next play. Cleared when a
    /// round ends.
    pub selected_cards: HashSet<String>,
}

impl GameState {
    /// Resets the transient turn state at the end of a round while
    /// preserving room membership and player identity.
    pub(crate) fn reset_round(&mut self) {
        self.selected_cards.clear();
        self.last_play = None;
        self.current_player = None;
        self.turn = TurnFlags::default();
    }
}
