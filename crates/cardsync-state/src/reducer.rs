//! The state reducer: one inbound message in, field updates and
//! directives out.
//!
//! [`reduce`] is the single transition function for [`GameState`]. It is
//! total (unrecognized actions and semantically short payloads never
//! panic, they just update less) and it owns the one piece of real
//! derived logic in the client: end-of-round detection from card counts,
//! a safety net for a server that may fail to emit `game_over` itself.

use std::collections::HashMap;

use cardsync_protocol::{GameStateFrame, Inbound};

use crate::effects::EffectKind;
use crate::game::{GameState, LastPlay, TurnFlags};

/// A side effect requested by the reducer, applied by the driver after
/// the state update.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Reconcile the local hand order against a fresh authoritative set.
    SyncHand(Vec<String>),
    /// Fire a short-lived visual effect at a seat.
    Effect {
        /// Seat index the effect plays on.
        target: usize,
        /// Which effect to play.
        kind: EffectKind,
    },
    /// Surface a user-visible notice.
    Notify(Notice),
}

/// A user-visible event for the presentation layer to render as it sees
/// fit (alert, toast, banner).
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The server created our room.
    RoomCreated {
        /// Identifier to share with other players.
        room_id: String,
    },
    /// We joined an existing room.
    JoinedRoom,
    /// The server rejected our join request.
    JoinRejected {
        /// Rejection reason as reported by the server.
        reason: String,
    },
    /// The game started.
    GameStarted,
    /// The local hand was populated for the first time.
    HandInitialized,
    /// The round ended. `scores` are the new totals, `round_scores` the
    /// per-player deltas for this round.
    RoundOver {
        /// Seat index → total score.
        scores: HashMap<usize, i32>,
        /// Seat index → this round's delta.
        round_scores: HashMap<usize, i32>,
    },
    /// An application error reported by the server.
    ServerError {
        /// Error text, verbatim.
        message: String,
    },
}

/// Applies one inbound message to the state and returns the directives
/// the driver must carry out.
pub fn reduce(state: &mut GameState, msg: &Inbound) -> Vec<Directive> {
    match msg {
        Inbound::RoomCreated { room_id } => {
            state.room_id = room_id.clone();
            state.in_room = true;
            vec![Directive::Notify(Notice::RoomCreated {
                room_id: room_id.clone(),
            })]
        }

        Inbound::JoinedRoom { success: true, .. } => {
            state.in_room = true;
            vec![Directive::Notify(Notice::JoinedRoom)]
        }

        Inbound::JoinedRoom {
            success: false,
            message,
        } => vec![Directive::Notify(Notice::JoinRejected {
            reason: message.clone().unwrap_or_default(),
        })],

        Inbound::GameStarted => {
            vec![Directive::Notify(Notice::GameStarted)]
        }

        Inbound::RoomState { player_count } => {
            state.player_count = *player_count;
            Vec::new()
        }

        Inbound::GameState(frame) => apply_game_state(state, frame),

        Inbound::GameOver {
            scores,
            round_scores,
        } => apply_game_over(state, scores.clone(), round_scores.clone()),

        Inbound::ThrowBrick { to_player, .. } => vec![Directive::Effect {
            target: *to_player,
            kind: EffectKind::BrickHit,
        }],

        Inbound::ShowFire { player_index } => vec![Directive::Effect {
            target: *player_index,
            kind: EffectKind::FireShow,
        }],

        Inbound::Error { message } => {
            vec![Directive::Notify(Notice::ServerError {
                message: message.clone(),
            })]
        }

        Inbound::Unknown => {
            tracing::debug!("ignoring unrecognized action");
            Vec::new()
        }
    }
}

/// Applies a `game_state` frame field by field. A missing field skips
/// only that field's update, except the turn flags, which are
/// authoritative per message and always overwritten.
fn apply_game_state(state: &mut GameState, frame: &GameStateFrame) -> Vec<Directive> {
    let mut directives = Vec::new();

    if let Some(cards) = &frame.cards {
        state.authoritative_hand = cards.clone();
        directives.push(Directive::SyncHand(cards.clone()));
    }
    if let Some(seat) = frame.player_number {
        state.local_player = Some(seat);
    }
    if let Some(names) = &frame.player_names {
        state.player_names = names.clone();
    }
    if let Some(counts) = &frame.player_card_counts {
        state.player_card_counts = counts.clone();
    }
    if let Some(scores) = &frame.scores {
        state.scores = scores.clone();
    }

    // Derived end-of-round detection: when a frame carries both card
    // counts and scores and exactly one player still holds cards, the
    // round is over even if the server never says so. Remaining cards
    // count against the holder, so the round delta is the negated count.
    // The rest of this frame is skipped, matching the end-of-round reset.
    if let (Some(counts), Some(scores)) = (&frame.player_card_counts, &frame.scores) {
        let holders = counts.values().filter(|&&n| n > 0).count();
        if holders == 1 {
            tracing::info!("exactly one player holds cards, deriving round end");
            let round_scores = counts
                .iter()
                .map(|(&seat, &n)| (seat, -(n as i32)))
                .collect();
            directives.extend(apply_game_over(state, scores.clone(), round_scores));
            return directives;
        }
    }

    if let Some(is_current) = frame.current_player {
        state.current_player = if is_current { state.local_player } else { None };
    }
    if let Some(last) = &frame.last_cards {
        state.last_play = Some(LastPlay {
            cards: last.cards.clone(),
            player_name: last.player_name.clone(),
        });
    }

    state.turn = TurnFlags {
        can_fork: frame.can_fork,
        waiting_for_hook: frame.waiting_for_hook,
        can_hook: frame.can_hook,
        is_giving_light: frame.is_giving_light,
        fork_player: frame.fork_player,
        hook_player: frame.hook_player,
    };

    directives
}

/// Ends the round: the payload scores ARE the new totals, the transient
/// turn state is reset, and the room is kept intact.
fn apply_game_over(
    state: &mut GameState,
    scores: HashMap<usize, i32>,
    round_scores: HashMap<usize, i32>,
) -> Vec<Directive> {
    state.scores = scores.clone();
    state.reset_round();
    vec![Directive::Notify(Notice::RoundOver {
        scores,
        round_scores,
    })]
}

// =========================================================================
// Tests
// =========================================================================
