//! End-to-end tests for the client against a real in-process WebSocket
//! server: frames in, snapshots and notices out, commands back on the
//! wire, reconnects and endpoint switches.

use std::time::{Duration, Instant};

use cardsync::{ConnectionState, EffectKind, Notice, SyncClient, SyncConfig, SyncError};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

/// Generous deadline for anything the tests wait on.
const WAIT: Duration = Duration::from_secs(5);

/// Helper: binds a WebSocket server on an OS-assigned port that keeps
/// accepting connections and hands each accepted stream to the test.
async fn spawn_server() -> (String, mpsc::Receiver<ServerWs>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have local addr");

    let (tx, rx) = mpsc::channel(4);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                continue;
            };
            if tx.send(ws).await.is_err() {
                return;
            }
        }
    });

    (format!("ws://{addr}"), rx)
}

async fn accept(server: &mut mpsc::Receiver<ServerWs>) -> ServerWs {
    timeout(WAIT, server.recv())
        .await
        .expect("client should connect in time")
        .expect("listener should be alive")
}

async fn send_action(ws: &mut ServerWs, frame: serde_json::Value) {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("server send should succeed");
}

async fn recv_action(ws: &mut ServerWs) -> serde_json::Value {
    loop {
        let msg = timeout(WAIT, ws.next())
            .await
            .expect("command should arrive in time")
            .expect("stream should be open")
            .expect("frame should be readable");
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str())
                    .expect("commands are JSON");
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn wait_for<T, F>(rx: &mut watch::Receiver<T>, pred: F)
where
    F: FnMut(&T) -> bool,
{
    timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("condition should hold in time")
        .expect("driver should be alive");
}

async fn next_notice(notices: &mut mpsc::Receiver<Notice>) -> Notice {
    timeout(WAIT, notices.recv())
        .await
        .expect("notice should arrive in time")
        .expect("driver should be alive")
}

#[tokio::test]
async fn test_server_frames_update_state_hand_and_notices() {
    let (endpoint, mut server) = spawn_server().await;
    let (client, mut notices) = SyncClient::start(SyncConfig::new(endpoint));
    let mut ws = accept(&mut server).await;

    send_action(&mut ws, json!({"action": "room_created", "room_id": "R1"})).await;
    assert_eq!(
        next_notice(&mut notices).await,
        Notice::RoomCreated {
            room_id: "R1".into()
        }
    );

    let mut state = client.state();
    wait_for(&mut state, |s| s.room_id == "R1" && s.in_room).await;

    send_action(
        &mut ws,
        json!({
            "action": "game_state",
            "cards": ["♠A", "♥3", "♦7"],
            "player_number": 1,
            "player_names": {"0": "alice", "1": "bob"},
            "player_card_counts": {"0": 5, "1": 3},
            "scores": {"0": 0, "1": 0},
            "current_player": true
        }),
    )
    .await;

    assert_eq!(next_notice(&mut notices).await, Notice::HandInitialized);

    let mut hand = client.hand();
    wait_for(&mut hand, |h| h == &["♠A", "♥3", "♦7"]).await;

    wait_for(&mut state, |s| {
        s.local_player == Some(1) && s.current_player == Some(1)
    })
    .await;

    client.shutdown().expect("driver running");
}

#[tokio::test]
async fn test_commands_are_encoded_on_the_wire() {
    let (endpoint, mut server) = spawn_server().await;
    let (client, _notices) = SyncClient::start(SyncConfig::new(endpoint));
    let mut ws = accept(&mut server).await;

    client.create_room(2).expect("driver running");
    assert_eq!(
        recv_action(&mut ws).await,
        json!({"action": "create_room", "deck_count": 2})
    );

    client.join_room("R9").expect("driver running");
    assert_eq!(
        recv_action(&mut ws).await,
        json!({"action": "join_room", "room_id": "R9"})
    );

    client.start_game().expect("driver running");
    assert_eq!(recv_action(&mut ws).await, json!({"action": "start_game"}));

    // Decorated identifiers go out canonical.
    client
        .play_cards(vec!["♠A_0_1".to_string(), "♦3".to_string()])
        .expect("driver running");
    assert_eq!(
        recv_action(&mut ws).await,
        json!({"action": "play_cards", "cards": ["♠A", "♦3"]})
    );

    client.pass().expect("driver running");
    assert_eq!(recv_action(&mut ws).await, json!({"action": "pass"}));

    client.change_name("alice").expect("driver running");
    assert_eq!(
        recv_action(&mut ws).await,
        json!({"action": "change_name", "name": "alice"})
    );
}

#[tokio::test]
async fn test_throw_brick_uses_the_local_seat() {
    let (endpoint, mut server) = spawn_server().await;
    let (client, _notices) = SyncClient::start(SyncConfig::new(endpoint));
    let mut ws = accept(&mut server).await;

    send_action(
        &mut ws,
        json!({"action": "game_state", "player_number": 2}),
    )
    .await;
    let mut state = client.state();
    wait_for(&mut state, |s| s.local_player == Some(2)).await;

    client.throw_brick(0).expect("driver running");
    assert_eq!(
        recv_action(&mut ws).await,
        json!({"action": "throw_brick", "from_player": 2, "to_player": 0})
    );

    client.show_fire().expect("driver running");
    assert_eq!(
        recv_action(&mut ws).await,
        json!({"action": "show_fire", "player_index": 2})
    );
}

#[tokio::test]
async fn test_malformed_and_unknown_frames_are_tolerated() {
    let (endpoint, mut server) = spawn_server().await;
    let (client, _notices) = SyncClient::start(SyncConfig::new(endpoint));
    let mut ws = accept(&mut server).await;

    // Garbage, a type-mangled frame, and an unrecognized action must not
    // kill the read loop or corrupt the state.
    ws.send(Message::Text("not json at all".into()))
        .await
        .unwrap();
    // A wrong-typed field is dropped alone; its siblings still apply.
    send_action(
        &mut ws,
        json!({"action": "game_state", "cards": "oops", "player_number": 3}),
    )
    .await;
    send_action(&mut ws, json!({"action": "mystery_bonus", "value": 7})).await;

    send_action(&mut ws, json!({"action": "room_created", "room_id": "R2"})).await;
    let mut state = client.state();
    wait_for(&mut state, |s| s.room_id == "R2").await;
    let snapshot = state.borrow();
    assert_eq!(snapshot.local_player, Some(3));
    assert!(snapshot.authoritative_hand.is_empty());
}

#[tokio::test]
async fn test_reconnects_after_drop_with_fixed_delay() {
    let (endpoint, mut server) = spawn_server().await;
    let delay = Duration::from_millis(200);
    let config = SyncConfig::new(endpoint).with_reconnect_delay(delay);
    let (client, _notices) = SyncClient::start(config);

    let ws = accept(&mut server).await;
    let mut conn = client.connection();
    wait_for(&mut conn, |c| *c == ConnectionState::Connected).await;
    conn.borrow_and_update();

    let dropped_at = Instant::now();
    drop(ws);

    // Every transition of the drop-and-redial cycle, in order.
    let mut observed = Vec::new();
    loop {
        timeout(WAIT, conn.changed())
            .await
            .expect("transition should arrive in time")
            .expect("driver should be alive");
        let state = *conn.borrow_and_update();
        observed.push(state);
        if state == ConnectionState::Connected {
            break;
        }
    }
    assert_eq!(
        observed,
        [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Connected,
        ]
    );
    assert!(
        dropped_at.elapsed() >= delay,
        "reconnected after only {:?}",
        dropped_at.elapsed()
    );

    // One redial, and the new connection works.
    let mut ws = accept(&mut server).await;
    send_action(&mut ws, json!({"action": "room_created", "room_id": "R3"})).await;
    let mut state = client.state();
    wait_for(&mut state, |s| s.room_id == "R3").await;
}

#[tokio::test]
async fn test_endpoint_switch_connects_to_the_new_server() {
    let (endpoint_a, mut server_a) = spawn_server().await;
    let (endpoint_b, mut server_b) = spawn_server().await;

    // A long reconnect delay proves the switch redials immediately
    // instead of waiting out the drop path.
    let config =
        SyncConfig::new(endpoint_a).with_reconnect_delay(Duration::from_secs(60));
    let (client, _notices) = SyncClient::start(config);
    let mut ws_a = accept(&mut server_a).await;

    client.switch_endpoint(endpoint_b).expect("driver running");
    let mut ws_b = accept(&mut server_b).await;

    send_action(&mut ws_b, json!({"action": "room_created", "room_id": "B1"})).await;
    let mut state = client.state();
    wait_for(&mut state, |s| s.room_id == "B1").await;

    // The superseded connection is closed; anything written to it never
    // reaches the reducer.
    let _ = ws_a
        .send(Message::Text(
            json!({"action": "room_created", "room_id": "A9"})
                .to_string()
                .into(),
        ))
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(state.borrow().room_id, "B1");
}

#[tokio::test]
async fn test_peer_actions_create_effects_that_expire() {
    let (endpoint, mut server) = spawn_server().await;
    let (client, _notices) = SyncClient::start(SyncConfig::new(endpoint));
    let mut ws = accept(&mut server).await;

    send_action(
        &mut ws,
        json!({"action": "throw_brick", "from_player": 0, "to_player": 2}),
    )
    .await;

    let mut effects = client.effects();
    wait_for(&mut effects, |live| {
        live.len() == 1
            && live[0].target == 2
            && live[0].kind == EffectKind::BrickHit
    })
    .await;

    // Runs on the real clock: the entry disappears after its TTL.
    wait_for(&mut effects, |live| live.is_empty()).await;
}

#[tokio::test]
async fn test_manual_reorder_survives_server_updates() {
    let (endpoint, mut server) = spawn_server().await;
    let (client, _notices) = SyncClient::start(SyncConfig::new(endpoint));
    let mut ws = accept(&mut server).await;

    send_action(
        &mut ws,
        json!({"action": "game_state", "cards": ["a", "b", "c", "d"]}),
    )
    .await;
    let mut hand = client.hand();
    wait_for(&mut hand, |h| h == &["a", "b", "c", "d"]).await;

    // User drags "d" to the front.
    client.move_card(3, 0).expect("driver running");
    wait_for(&mut hand, |h| h == &["d", "a", "b", "c"]).await;

    // Server: "b" was played, "e" was drawn.
    send_action(
        &mut ws,
        json!({"action": "game_state", "cards": ["a", "c", "d", "e"]}),
    )
    .await;
    wait_for(&mut hand, |h| h == &["d", "a", "c", "e"]).await;
}

#[tokio::test]
async fn test_selection_is_cleared_by_playing() {
    let (endpoint, mut server) = spawn_server().await;
    let (client, _notices) = SyncClient::start(SyncConfig::new(endpoint));
    let mut ws = accept(&mut server).await;

    client.set_card_selected("♠A", true).expect("driver running");
    client.set_card_selected("♦3", true).expect("driver running");
    let mut state = client.state();
    wait_for(&mut state, |s| s.selected_cards.len() == 2).await;

    client
        .play_cards(vec!["♠A".to_string(), "♦3".to_string()])
        .expect("driver running");
    assert_eq!(
        recv_action(&mut ws).await,
        json!({"action": "play_cards", "cards": ["♠A", "♦3"]})
    );
    wait_for(&mut state, |s| s.selected_cards.is_empty()).await;
}

#[tokio::test]
async fn test_shutdown_closes_the_facade() {
    let (endpoint, mut server) = spawn_server().await;
    let (client, _notices) = SyncClient::start(SyncConfig::new(endpoint));
    let _ws = accept(&mut server).await;

    let mut conn = client.connection();
    wait_for(&mut conn, |c| *c == ConnectionState::Connected).await;
    client.shutdown().expect("driver running");
    wait_for(&mut conn, |c| *c == ConnectionState::Disconnected).await;

    // Once the driver has exited, commands have nowhere to go.
    let deadline = Instant::now() + WAIT;
    loop {
        match client.create_room(1) {
            Err(SyncError::Closed) => break,
            Ok(()) => {
                assert!(Instant::now() < deadline, "facade never closed");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}
