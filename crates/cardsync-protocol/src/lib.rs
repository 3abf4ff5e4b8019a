//! Wire protocol for the CardSync client core.
//!
//! The game server speaks a tagged-action JSON protocol: one JSON object
//! per UTF-8 text frame, with a mandatory string field `action` selecting
//! the schema. This crate defines the typed [`Inbound`] and [`Outbound`]
//! message sets and the [`Codec`] used to move between them and raw frames.
//!
//! Decode is deliberately forgiving at the edges the server is known to be
//! sloppy about: unrecognized actions become [`Inbound::Unknown`], and
//! player-indexed maps silently drop keys that are not decimal integers.
//! A frame that is not a JSON object, or that lacks `action`, is not a
//! protocol message at all and decodes to an error the connection manager
//! discards.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{GameStateFrame, Inbound, LastCards, Outbound};
