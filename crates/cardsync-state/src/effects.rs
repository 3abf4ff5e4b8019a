//! Short-lived visual effect entries with automatic expiry.
//!
//! Peer actions (brick throws, fire shows) produce [`EffectEntry`] values
//! that presentation renders for a fixed time-to-live. Each entry gets a
//! unique [`EffectId`] and its own expiry timer; removal is matched by id,
//! so overlapping effects on the same seat never interfere.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;

/// How long an effect stays live before its timer removes it.
pub const EFFECT_TTL: Duration = Duration::from_secs(2);

/// Counter for generating unique effect IDs.
static NEXT_EFFECT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one triggered effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EffectId(u64);

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect-{}", self.0)
    }
}

/// Which visual effect to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EffectKind {
    /// A brick hit the target (with the matching cry/shake treatment).
    BrickHit,
    /// The target is showing fire.
    FireShow,
}

/// One live effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectEntry {
    /// Unique token for this trigger.
    pub id: EffectId,
    /// Seat index the effect plays on.
    pub target: usize,
    /// Which effect to play.
    pub kind: EffectKind,
    /// When the effect was triggered.
    pub created_at: Instant,
}

/// Owns the live effect set and the per-entry expiry timers.
///
/// [`trigger`](Self::trigger) must be called from within a Tokio runtime;
/// each call spawns an independent timer task that removes exactly the
/// entry it created. Presentation observes the live set either by polling
/// [`snapshot`](Self::snapshot) or through the watch channel from
/// [`subscribe`](Self::subscribe).
#[derive(Debug)]
pub struct EffectScheduler {
    entries: Arc<Mutex<HashMap<EffectId, EffectEntry>>>,
    publisher: Arc<watch::Sender<Vec<EffectEntry>>>,
    ttl: Duration,
}

impl EffectScheduler {
    /// Creates a scheduler with the standard [`EFFECT_TTL`].
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(Vec::new());
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            publisher: Arc::new(publisher),
            ttl: EFFECT_TTL,
        }
    }

    /// Creates an effect entry and schedules its removal after the TTL.
    /// Returns the entry's unique id.
    pub fn trigger(&self, target: usize, kind: EffectKind) -> EffectId {
        let id = EffectId(NEXT_EFFECT_ID.fetch_add(1, Ordering::Relaxed));
        let entry = EffectEntry {
            id,
            target,
            kind,
            created_at: Instant::now(),
        };
        lock(&self.entries).insert(id, entry);
        publish(&self.entries, &self.publisher);
        tracing::debug!(%id, target, ?kind, "effect triggered");

        let entries = Arc::clone(&self.entries);
        let publisher = Arc::clone(&self.publisher);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            // Removal is matched by id only: entries created later for the
            // same seat or kind are untouched.
            if lock(&entries).remove(&id).is_some() {
                tracing::debug!(%id, "effect expired");
                publish(&entries, &publisher);
            }
        });

        id
    }

    /// Returns the current live set.
    pub fn snapshot(&self) -> Vec<EffectEntry> {
        lock(&self.entries).values().cloned().collect()
    }

    /// Subscribes to live-set updates. The receiver yields a fresh
    /// snapshot whenever an effect is created or expires.
    pub fn subscribe(&self) -> watch::Receiver<Vec<EffectEntry>> {
        self.publisher.subscribe()
    }
}

impl Default for EffectScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(
    entries: &Mutex<HashMap<EffectId, EffectEntry>>,
) -> MutexGuard<'_, HashMap<EffectId, EffectEntry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

fn publish(
    entries: &Mutex<HashMap<EffectId, EffectEntry>>,
    publisher: &watch::Sender<Vec<EffectEntry>>,
) {
    let snapshot: Vec<EffectEntry> = lock(entries).values().cloned().collect();
    let _ = publisher.send(snapshot);
}

// =========================================================================
// Tests
// =========================================================================
