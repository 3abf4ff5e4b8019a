//! Synchronized client state for CardSync.
//!
//! Three pieces live here, all owned by the connection driver task and
//! exposed to presentation read-only:
//!
//! - [`GameState`] + [`reduce`] — the local view of room/game state and
//!   the transition function that applies one inbound message to it,
//!   returning [`Directive`]s for the driver to carry out.
//! - [`LocalHand`] — the player's ordered hand, reconciled against each
//!   server-authoritative card set without disturbing manual arrangement.
//! - [`EffectScheduler`] — time-bounded visual effect entries with
//!   per-entry expiry.
//!
//! Nothing here performs I/O besides the effect expiry timers; the
//! reducer and reconciler are plain synchronous functions, which is what
//! makes their ordering and no-stale-flags guarantees easy to test.

mod effects;
mod game;
mod hand;
mod reducer;

pub use effects::{EFFECT_TTL, EffectEntry, EffectId, EffectKind, EffectScheduler};
pub use game::{GameState, LastPlay, TurnFlags};
pub use hand::{HandOutcome, LocalHand};
pub use reducer::{Directive, Notice, reduce};
