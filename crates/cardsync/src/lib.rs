//! CardSync: client-state-synchronization core for a networked
//! multiplayer card game.
//!
//! The crate keeps a client's view of a card game synchronized with an
//! authoritative server over a WebSocket connection: it decodes the
//! tagged-action wire protocol, folds every server message into a single
//! [`GameState`] snapshot, reconciles the player's locally-ordered hand
//! against the server's authoritative card set, schedules short-lived
//! visual effects for peer actions, and reconnects automatically when
//! the connection drops.
//!
//! # Quick Start
//!
//! ```no_run
//! use cardsync::{SyncClient, SyncConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     cardsync::init_tracing();
//!
//!     let config = SyncConfig::new("ws://localhost:8000/game");
//!     let (client, mut notices) = SyncClient::start(config);
//!
//!     client.create_room(2).expect("client running");
//!
//!     let mut state = client.state();
//!     tokio::select! {
//!         _ = state.changed() => {
//!             println!("room: {:?}", state.borrow().room_id);
//!         }
//!         Some(notice) = notices.recv() => {
//!             println!("notice: {notice:?}");
//!         }
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! cardsync-transport   dial / send / recv raw payloads (WebSocket)
//! cardsync-protocol    tagged-action JSON wire types + codec
//! cardsync-state       reducer, hand reconciler, effect scheduler
//! cardsync (this)      connection driver, commands, facade
//! ```
//!
//! All mutation runs on one background driver task; presentation
//! observes snapshots through `watch` channels and receives one-shot
//! events on the bounded notice channel.

mod client;
pub mod commands;
mod config;
mod error;

pub use client::{ConnectionState, SyncClient};
pub use config::{DEFAULT_RECONNECT_DELAY, SyncConfig};
pub use error::SyncError;

pub use cardsync_protocol::{GameStateFrame, Inbound, LastCards, Outbound};
pub use cardsync_state::{
    EFFECT_TTL, EffectEntry, EffectId, EffectKind, GameState, HandOutcome, LastPlay, Notice,
    TurnFlags,
};

/// Initializes a `tracing` subscriber that reads the `RUST_LOG`
/// environment variable, defaulting to `info`.
///
/// Convenience for binaries and examples; call it once at startup. Does
/// nothing if a global subscriber is already set.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
