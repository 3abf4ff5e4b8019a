//! The connection manager and client facade.
//!
//! [`SyncClient::start`] spawns one driver task that owns everything
//! mutable: the synchronized game state, the local hand order, and the
//! effect scheduler. The driver multiplexes the connection's receive
//! path, the outbound command queue, and control requests (endpoint
//! switches, manual hand reorders, selection changes) through a single
//! `select!` loop, which is what serializes all state mutation.
//!
//! Connection policy: dial the configured endpoint; on any receive
//! failure or abrupt close, publish `Disconnected`, wait the fixed
//! reconnect delay, and dial again. This repeats indefinitely, with no
//! backoff and no attempt cap. Switching endpoints tears the current epoch down
//! first (the in-flight receive future is dropped with the `select!`
//! branch), so no message from a superseded connection can reach the
//! reducer.

use std::fmt;

use cardsync_protocol::{Codec, Inbound, JsonCodec, Outbound};
use cardsync_state::{
    Directive, EffectEntry, EffectScheduler, GameState, HandOutcome, LocalHand, Notice, reduce,
};
use cardsync_transport::{Connection, Dialer, WebSocketConnection, WebSocketDialer};
use tokio::sync::{mpsc, watch};

use crate::commands;
use crate::config::SyncConfig;
use crate::error::SyncError;

/// Connectivity of the underlying transport, as observed by presentation.
///
/// Only the connection driver writes this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection; a reconnect may be pending.
    #[default]
    Disconnected,
    /// A dial attempt is in flight.
    Connecting,
    /// The connection is up and frames are flowing.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// Control requests from the facade into the driver task.
enum Control {
    /// Tear down the current connection and dial a different endpoint.
    SwitchEndpoint(String),
    /// Manual hand reorder from presentation.
    MoveCard { from: usize, to: usize },
    /// Toggle a card's membership in the play selection.
    SetSelected { card: String, selected: bool },
    /// Clear the play selection (after a play command is issued).
    ClearSelection,
    /// Stop the driver for good.
    Shutdown,
}

/// Why an epoch's `select!` loop exited.
enum EpochEnd {
    /// Receive failure or server close; reconnect after the delay.
    Dropped,
    /// Endpoint switch; reconnect immediately.
    Switched,
    /// Shutdown requested or all facade handles dropped.
    Shutdown,
}

/// What to do after a control request was handled.
enum ControlOutcome {
    Continue,
    Reconnect,
    Shutdown,
}

/// Handle to the client core. Cheap to clone; all clones talk to the
/// same driver task.
///
/// Returned by [`SyncClient::start`] together with the notice receiver.
/// Observers ([`state`](Self::state), [`connection`](Self::connection),
/// [`hand`](Self::hand), [`effects`](Self::effects)) are `watch`
/// receivers: they always hold the latest snapshot and never block the
/// driver.
#[derive(Clone)]
pub struct SyncClient {
    outbound: mpsc::UnboundedSender<Outbound>,
    control: mpsc::UnboundedSender<Control>,
    state_rx: watch::Receiver<GameState>,
    conn_rx: watch::Receiver<ConnectionState>,
    hand_rx: watch::Receiver<Vec<String>>,
    effects_rx: watch::Receiver<Vec<EffectEntry>>,
}

impl SyncClient {
    /// Starts the client: spawns the driver task and begins connecting
    /// to the configured endpoint.
    ///
    /// Returns the facade handle and the receiver for user-visible
    /// [`Notice`]s.
    pub fn start(config: SyncConfig) -> (Self, mpsc::Receiver<Notice>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::channel(config.notice_channel_capacity);
        let (state_tx, state_rx) = watch::channel(GameState::default());
        let (conn_tx, conn_rx) = watch::channel(ConnectionState::Disconnected);
        let (hand_tx, hand_rx) = watch::channel(Vec::new());

        let effects = EffectScheduler::new();
        let effects_rx = effects.subscribe();

        let driver = Driver {
            endpoint: config.endpoint,
            reconnect_delay: config.reconnect_delay,
            dialer: WebSocketDialer,
            codec: JsonCodec,
            state: GameState::default(),
            hand: LocalHand::new(),
            effects,
            outbound_rx,
            control_rx,
            notice_tx,
            state_tx,
            conn_tx,
            hand_tx,
        };
        tokio::spawn(driver.run());

        let client = Self {
            outbound: outbound_tx,
            control: control_tx,
            state_rx,
            conn_rx,
            hand_rx,
            effects_rx,
        };
        (client, notice_rx)
    }

    // -- Observers ------------------------------------------------------

    /// Snapshot stream of the synchronized game state.
    pub fn state(&self) -> watch::Receiver<GameState> {
        self.state_rx.clone()
    }

    /// Snapshot stream of the connection state.
    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.conn_rx.clone()
    }

    /// Snapshot stream of the locally-ordered hand.
    pub fn hand(&self) -> watch::Receiver<Vec<String>> {
        self.hand_rx.clone()
    }

    /// Snapshot stream of the live effect set.
    pub fn effects(&self) -> watch::Receiver<Vec<EffectEntry>> {
        self.effects_rx.clone()
    }

    // -- Commands -------------------------------------------------------

    /// Asks the server to create a room with `deck_count` decks.
    pub fn create_room(&self, deck_count: u32) -> Result<(), SyncError> {
        self.send(commands::create_room(deck_count))
    }

    /// Asks to join an existing room.
    pub fn join_room(&self, room_id: impl Into<String>) -> Result<(), SyncError> {
        self.send(commands::join_room(room_id))
    }

    /// Starts the game in the current room.
    pub fn start_game(&self) -> Result<(), SyncError> {
        self.send(commands::start_game())
    }

    /// Plays the given (possibly UI-decorated) card identifiers and
    /// clears the play selection.
    pub fn play_cards<I>(&self, selected: I) -> Result<(), SyncError>
    where
        I: IntoIterator<Item = String>,
    {
        self.send(commands::play_cards(selected))?;
        self.request(Control::ClearSelection)
    }

    /// Passes the turn.
    pub fn pass(&self) -> Result<(), SyncError> {
        self.send(commands::pass())
    }

    /// Changes the local player's display name.
    pub fn change_name(&self, name: impl Into<String>) -> Result<(), SyncError> {
        self.send(commands::change_name(name))
    }

    /// Throws a brick at `to_player` from the local seat. Dropped if the
    /// local seat is not yet known (no game state received).
    pub fn throw_brick(&self, to_player: usize) -> Result<(), SyncError> {
        match self.state_rx.borrow().local_player {
            Some(from_player) => {
                self.send(commands::throw_brick(from_player, to_player))
            }
            None => {
                tracing::debug!(to_player, "dropping throw_brick: local seat unknown");
                Ok(())
            }
        }
    }

    /// Shows fire on the local seat. Dropped if the local seat is not
    /// yet known.
    pub fn show_fire(&self) -> Result<(), SyncError> {
        match self.state_rx.borrow().local_player {
            Some(seat) => self.send(commands::show_fire(seat)),
            None => {
                tracing::debug!("dropping show_fire: local seat unknown");
                Ok(())
            }
        }
    }

    // -- Mutations and control ------------------------------------------

    /// Moves a card within the local hand order (manual reorder).
    pub fn move_card(&self, from: usize, to: usize) -> Result<(), SyncError> {
        self.request(Control::MoveCard { from, to })
    }

    /// Marks a card as selected or deselected for the next play.
    pub fn set_card_selected(
        &self,
        card: impl Into<String>,
        selected: bool,
    ) -> Result<(), SyncError> {
        self.request(Control::SetSelected {
            card: card.into(),
            selected,
        })
    }

    /// Tears down the current connection and dials a different server
    /// endpoint. No message from the old connection is applied once the
    /// switch is requested and processed.
    pub fn switch_endpoint(&self, endpoint: impl Into<String>) -> Result<(), SyncError> {
        self.request(Control::SwitchEndpoint(endpoint.into()))
    }

    /// Stops the driver task. Observers keep their last snapshots.
    pub fn shutdown(&self) -> Result<(), SyncError> {
        self.request(Control::Shutdown)
    }

    fn send(&self, msg: Outbound) -> Result<(), SyncError> {
        self.outbound.send(msg).map_err(|_| SyncError::Closed)
    }

    fn request(&self, ctrl: Control) -> Result<(), SyncError> {
        self.control.send(ctrl).map_err(|_| SyncError::Closed)
    }
}

/// The driver task: sole owner and mutator of the synchronized state.
struct Driver {
    endpoint: String,
    reconnect_delay: std::time::Duration,
    dialer: WebSocketDialer,
    codec: JsonCodec,
    state: GameState,
    hand: LocalHand,
    effects: EffectScheduler,
    outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    control_rx: mpsc::UnboundedReceiver<Control>,
    notice_tx: mpsc::Sender<Notice>,
    state_tx: watch::Sender<GameState>,
    conn_tx: watch::Sender<ConnectionState>,
    hand_tx: watch::Sender<Vec<String>>,
}

impl Driver {
    /// Connect loop: dial, run the epoch, reconnect after the fixed
    /// delay. Runs until shutdown.
    async fn run(mut self) {
        loop {
            self.set_connection(ConnectionState::Connecting);
            let endpoint = self.endpoint.clone();
            match self.dialer.dial(&endpoint).await {
                Ok(conn) => {
                    tracing::info!(id = %conn.id(), endpoint, "connected");
                    self.set_connection(ConnectionState::Connected);
                    let end = self.run_epoch(&conn).await;
                    let _ = conn.close().await;
                    self.set_connection(ConnectionState::Disconnected);
                    match end {
                        EpochEnd::Dropped => {}
                        EpochEnd::Switched => continue,
                        EpochEnd::Shutdown => return,
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, endpoint, "connect failed");
                    self.set_connection(ConnectionState::Disconnected);
                }
            }

            if !self.wait_before_reconnect().await {
                return;
            }
        }
    }

    /// One connection epoch: receive frames, flush outbound commands,
    /// and handle control requests until the connection drops or a
    /// switch/shutdown is requested.
    ///
    /// A single sequential receive keeps inbound ordering strictly FIFO
    /// within the epoch.
    async fn run_epoch(&mut self, conn: &WebSocketConnection) -> EpochEnd {
        loop {
            tokio::select! {
                frame = conn.recv() => match frame {
                    Ok(Some(data)) => self.handle_frame(&data),
                    Ok(None) => {
                        tracing::info!(id = %conn.id(), "server closed the connection");
                        return EpochEnd::Dropped;
                    }
                    Err(e) => {
                        tracing::warn!(id = %conn.id(), error = %e, "receive failed");
                        return EpochEnd::Dropped;
                    }
                },
                msg = self.outbound_rx.recv() => match msg {
                    Some(msg) => self.send_best_effort(conn, msg).await,
                    None => return EpochEnd::Shutdown,
                },
                ctrl = self.control_rx.recv() => match self.handle_control(ctrl) {
                    ControlOutcome::Continue => {}
                    ControlOutcome::Reconnect => return EpochEnd::Switched,
                    ControlOutcome::Shutdown => return EpochEnd::Shutdown,
                },
            }
        }
    }

    /// Waits the fixed reconnect delay. Control requests are still
    /// served; an endpoint switch cancels the wait and reconnects
    /// immediately. Commands issued while disconnected are dropped.
    /// Returns `false` on shutdown.
    async fn wait_before_reconnect(&mut self) -> bool {
        tracing::info!(delay = ?self.reconnect_delay, "scheduling reconnect");
        let delay = tokio::time::sleep(self.reconnect_delay);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                _ = &mut delay => return true,
                msg = self.outbound_rx.recv() => match msg {
                    Some(msg) => {
                        tracing::debug!(?msg, "dropping command while disconnected");
                    }
                    None => return false,
                },
                ctrl = self.control_rx.recv() => match self.handle_control(ctrl) {
                    ControlOutcome::Continue => {}
                    ControlOutcome::Reconnect => return true,
                    ControlOutcome::Shutdown => return false,
                },
            }
        }
    }

    /// Decodes one frame and applies it. Malformed payloads are
    /// discarded; the read loop stays alive.
    fn handle_frame(&mut self, data: &[u8]) {
        let msg: Inbound = match self.codec.decode(data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(error = %e, "discarding malformed frame");
                return;
            }
        };

        let directives = reduce(&mut self.state, &msg);
        self.publish_state();

        for directive in directives {
            match directive {
                Directive::SyncHand(cards) => {
                    let outcome = self.hand.reconcile(&cards);
                    self.publish_hand();
                    if outcome == HandOutcome::Initialized {
                        self.notify(Notice::HandInitialized);
                    }
                }
                Directive::Effect { target, kind } => {
                    let _ = self.effects.trigger(target, kind);
                }
                Directive::Notify(notice) => self.notify(notice),
            }
        }
    }

    /// Encodes and sends one command. Best-effort: any failure is
    /// logged and the command is dropped, since the user can repeat the
    /// action.
    async fn send_best_effort(&self, conn: &WebSocketConnection, msg: Outbound) {
        let bytes = match self.codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "dropping command: encode failed");
                return;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::warn!(error = %e, "dropping command: send failed");
        }
    }

    fn handle_control(&mut self, ctrl: Option<Control>) -> ControlOutcome {
        match ctrl {
            None | Some(Control::Shutdown) => {
                tracing::info!("client shutting down");
                ControlOutcome::Shutdown
            }
            Some(Control::SwitchEndpoint(endpoint)) => {
                tracing::info!(endpoint, "switching server endpoint");
                self.endpoint = endpoint;
                ControlOutcome::Reconnect
            }
            Some(Control::MoveCard { from, to }) => {
                self.hand.move_card(from, to);
                self.publish_hand();
                ControlOutcome::Continue
            }
            Some(Control::SetSelected { card, selected }) => {
                if selected {
                    self.state.selected_cards.insert(card);
                } else {
                    self.state.selected_cards.remove(&card);
                }
                self.publish_state();
                ControlOutcome::Continue
            }
            Some(Control::ClearSelection) => {
                self.state.selected_cards.clear();
                self.publish_state();
                ControlOutcome::Continue
            }
        }
    }

    fn set_connection(&self, state: ConnectionState) {
        tracing::debug!(%state, "connection state");
        let _ = self.conn_tx.send(state);
    }

    fn publish_state(&self) {
        let _ = self.state_tx.send(self.state.clone());
    }

    fn publish_hand(&self) {
        let _ = self.hand_tx.send(self.hand.cards().to_vec());
    }

    /// Delivers a notice without blocking the driver. If presentation
    /// cannot keep up, the notice is dropped with a warning.
    fn notify(&self, notice: Notice) {
        if let Err(e) = self.notice_tx.try_send(notice) {
            tracing::warn!(error = %e, "dropping notice");
        }
    }
}
