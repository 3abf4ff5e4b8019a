//! Client configuration.

use std::time::Duration;

/// How long to wait after a connection drop before redialing.
///
/// Fixed delay, retried indefinitely: no backoff growth and no attempt
/// cap. A casual game client wants "eventually connected", not fast
/// failure.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default capacity of the bounded notice channel.
const DEFAULT_NOTICE_CHANNEL_CAPACITY: usize = 64;

/// Configuration for a [`SyncClient`](crate::SyncClient).
///
/// The only required field is the server endpoint.
///
/// # Example
///
/// ```
/// use cardsync::SyncConfig;
///
/// let config = SyncConfig::new("wss://example.invalid/game");
/// assert_eq!(config.reconnect_delay, cardsync::DEFAULT_RECONNECT_DELAY);
/// ```
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// WebSocket endpoint of the game server (`ws://` or `wss://`).
    pub endpoint: String,
    /// Delay between a connection drop and the next dial attempt.
    pub reconnect_delay: Duration,
    /// Capacity of the bounded notice channel. When presentation cannot
    /// keep up, further notices are dropped with a warning rather than
    /// blocking the driver.
    pub notice_channel_capacity: usize,
}

impl SyncConfig {
    /// Creates a configuration with the given endpoint and default values.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            notice_channel_capacity: DEFAULT_NOTICE_CHANNEL_CAPACITY,
        }
    }

    /// Sets the reconnect delay. Tests use short delays; production
    /// keeps [`DEFAULT_RECONNECT_DELAY`].
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the notice channel capacity. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_notice_channel_capacity(mut self, capacity: usize) -> Self {
        self.notice_channel_capacity = capacity.max(1);
        self
    }
}
