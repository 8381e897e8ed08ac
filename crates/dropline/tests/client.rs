//! Integration tests for the Dropline client against a scripted match
//! server over a real WebSocket.

use std::time::Duration;

use dropline::prelude::*;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

// =========================================================================
// Scripted match server
// =========================================================================

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("should bind");
    let addr = listener.local_addr().expect("should have local addr");
    (listener, format!("ws://{addr}/ws"))
}

async fn accept(listener: &TcpListener) -> ServerWs {
    let (stream, _) = listener.accept().await.expect("should accept");
    tokio_tungstenite::accept_async(stream)
        .await
        .expect("handshake should succeed")
}

/// Next JSON command from the client, or `None` once it hung up.
async fn next_command(ws: &mut ServerWs) -> Option<Value> {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for the client")?;
        match msg {
            Ok(Message::Text(text)) => {
                return Some(serde_json::from_str(text.as_str()).expect("valid JSON"));
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

async fn push(ws: &mut ServerWs, event: Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("server send should succeed");
}

fn board(moves: &[(usize, usize, u8)]) -> Value {
    let mut cells = vec![vec![0u8; 7]; 6];
    for &(row, col, seat) in moves {
        cells[row][col] = seat;
    }
    json!(cells)
}

// =========================================================================
// Client side
// =========================================================================

struct Running {
    intents: mpsc::Sender<Intent>,
    view: watch::Receiver<SessionSnapshot>,
    task: tokio::task::JoinHandle<()>,
}

fn spawn_client(url: &str, recovery: Duration) -> Running {
    let client = Client::builder()
        .server_url(url)
        .recovery_delay(recovery)
        .build()
        .expect("valid config");
    let (intents, intents_rx) = mpsc::channel(16);
    let (view_tx, view) = watch::channel(SessionSnapshot::default());
    let task = tokio::spawn(client.run(intents_rx, view_tx));
    Running { intents, view, task }
}

impl Running {
    async fn send(&self, intent: Intent) {
        self.intents.send(intent).await.expect("client loop alive");
    }

    /// Waits until the published snapshot satisfies `pred`.
    async fn wait_for(&mut self, pred: impl FnMut(&SessionSnapshot) -> bool) -> SessionSnapshot {
        let snap = timeout(Duration::from_secs(5), self.view.wait_for(pred))
            .await
            .expect("timed out waiting for the view")
            .expect("client loop alive");
        snap.clone()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_ai_game_over_websocket() {
    let (listener, url) = listen().await;
    let mut client = spawn_client(&url, Duration::from_secs(2));

    client.send(Intent::StartAi).await;
    let mut ws = accept(&listener).await;
    assert_eq!(
        next_command(&mut ws).await,
        Some(json!({"type": "create_room", "data": {"mode": "ai"}}))
    );

    push(&mut ws, json!({"type": "room_created", "data": {"room_id": "r1", "player_num": 1}})).await;
    push(&mut ws, json!({"type": "update_board", "data": {
        "board": board(&[]), "current_turn": 1, "game_over": false, "winner": 0
    }}))
    .await;

    let snap = client.wait_for(|s| s.board_enabled).await;
    assert_eq!(snap.screen, Screen::Game);
    assert_eq!(snap.status, text::YOUR_TURN);
    assert_eq!(snap.player_num(), Some(PlayerNum::One));

    client.send(Intent::MakeMove(3)).await;
    assert_eq!(
        next_command(&mut ws).await,
        Some(json!({"type": "make_move", "data": {"room_id": "r1", "column": 3, "player_num": 1}}))
    );

    push(&mut ws, json!({"type": "game_over", "data": {
        "board": board(&[(5, 3, 1), (4, 3, 1), (3, 3, 1), (2, 3, 1)]),
        "current_turn": 2, "game_over": true, "winner": 1
    }}))
    .await;

    let snap = client.wait_for(|s| s.status == text::WIN).await;
    assert!(!snap.board_enabled);
    assert_eq!(
        snap.game.and_then(|g| g.winner),
        Some(Winner::Player(PlayerNum::One))
    );

    client.send(Intent::LeaveGame).await;
    client.wait_for(|s| s.screen == Screen::Menu).await;
    assert_eq!(next_command(&mut ws).await, None);
}

#[tokio::test]
async fn test_room_not_found_recovers_to_multiplayer_menu() {
    let (listener, url) = listen().await;
    let mut client = spawn_client(&url, Duration::from_millis(50));

    client.send(Intent::GoToMultiplayerMenu).await;
    client.send(Intent::JoinRoom("missing".into())).await;
    let mut ws = accept(&listener).await;
    assert_eq!(
        next_command(&mut ws).await,
        Some(json!({"type": "join_room", "data": {"room_id": "missing"}}))
    );

    push(&mut ws, json!({"type": "error", "data": {"message": "Room not found"}})).await;
    let snap = client.wait_for(|s| s.status == "Error: Room not found").await;
    assert_eq!(snap.screen, Screen::Game);

    let snap = client.wait_for(|s| s.screen == Screen::MultiplayerMenu).await;
    assert_eq!(snap.status, "Error: Room not found");
    assert!(snap.session.is_none());
    assert_eq!(next_command(&mut ws).await, None);
}

#[tokio::test]
async fn test_server_disconnect_shows_connection_lost() {
    let (listener, url) = listen().await;
    let mut client = spawn_client(&url, Duration::from_secs(2));

    client.send(Intent::StartAi).await;
    let mut ws = accept(&listener).await;
    next_command(&mut ws).await;
    push(&mut ws, json!({"type": "room_created", "data": {"room_id": "r1", "player_num": 1}})).await;
    push(&mut ws, json!({"type": "update_board", "data": {
        "board": board(&[]), "current_turn": 1, "game_over": false, "winner": 0
    }}))
    .await;
    client.wait_for(|s| s.board_enabled).await;

    ws.close(None).await.expect("server close");
    let snap = client.wait_for(|s| s.status == text::CONNECTION_LOST).await;
    assert!(!snap.board_enabled);
    assert!(snap.game.is_some_and(|g| g.game_over));
}

#[tokio::test]
async fn test_unreachable_server_reports_connection_problem() {
    let (listener, url) = listen().await;
    drop(listener);
    let mut client = spawn_client(&url, Duration::from_secs(2));

    client.send(Intent::StartAi).await;
    let snap = client
        .wait_for(|s| s.status == text::CONNECTION_LOST)
        .await;
    assert_eq!(snap.screen, Screen::Game);
    assert!(snap.session.is_none());
}

#[tokio::test]
async fn test_closing_intents_stops_the_client() {
    let (listener, url) = listen().await;
    let mut client = spawn_client(&url, Duration::from_secs(2));

    client.send(Intent::StartAi).await;
    let mut ws = accept(&listener).await;
    next_command(&mut ws).await;

    let Running { intents, view, task } = client;
    drop(intents);
    timeout(Duration::from_secs(5), task)
        .await
        .expect("client loop should stop")
        .expect("client task should not panic");

    assert_eq!(view.borrow().screen, Screen::Menu);
    assert_eq!(next_command(&mut ws).await, None);
}

#[tokio::test]
async fn test_step_by_step_with_pump() {
    let (listener, url) = listen().await;
    let mut client = Client::builder().server_url(&url).build().expect("valid config");

    client.dispatch(Intent::StartAi);
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        next_command(&mut ws).await;
        push(&mut ws, json!({"type": "room_created", "data": {"room_id": "r9", "player_num": 2}})).await;
        ws
    });

    while client.snapshot().session.is_none() {
        timeout(Duration::from_secs(5), client.pump())
            .await
            .expect("timed out waiting for the server");
    }
    let _ws = server.await.expect("server task");

    let snap = client.snapshot();
    assert_eq!(snap.phase, SessionPhase::InGame);
    assert_eq!(snap.player_num(), Some(PlayerNum::Two));
    assert_eq!(snap.status, text::WELCOME);
}
