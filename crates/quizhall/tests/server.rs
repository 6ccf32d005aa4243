//! Integration tests for the Quizhall server, handler, and full connection flow.
//!
//! Every test starts a real server on an OS-assigned port and plays the
//! host and the players with plain `tokio-tungstenite` clients.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use quizhall::prelude::*;
use quizhall_protocol::{
    Connect, HostGameRequest, PlayerReveal, QuestionAnswer, StartGame, Tick,
};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Fixtures and helpers
// =========================================================================

const QUIZZES: &str = r#"[{
    "id": "capitals",
    "name": "Capitals",
    "questions": [
        {
            "id": "q1", "name": "Capital of France?", "time": 3,
            "choices": [
                {"id": "a", "name": "Paris", "correct": true},
                {"id": "b", "name": "Lyon", "correct": false}
            ]
        },
        {
            "id": "q2", "name": "Capital of Japan?", "time": 3,
            "choices": [
                {"id": "a", "name": "Osaka", "correct": false},
                {"id": "b", "name": "Tokyo", "correct": true}
            ]
        }
    ]
}]"#;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server(config: GameConfig) -> String {
    let quizzes = InMemoryQuizRepository::from_json(QUIZZES).expect("fixture parses");
    let server = QuizhallServerBuilder::new()
        .bind("127.0.0.1:0")
        .game_config(config)
        .build(quizzes)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

/// Game config whose clock is slow enough that no tick lands mid-test.
fn frozen_clock() -> GameConfig {
    GameConfig {
        tick: TickConfig::with_period(Duration::from_secs(3600)),
        ..GameConfig::default()
    }
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, packet: ClientPacket) {
    let bytes = PacketCodec::json().encode_client(&packet).expect("encode");
    ws.send(Message::Binary(bytes.into())).await.expect("send");
}

/// Receives the next packet, failing the test after two seconds.
async fn recv(ws: &mut ClientWs) -> ServerPacket {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Binary(data))) => {
                    if let Some(packet) = PacketCodec::json().decode_server(&data).expect("decode") {
                        return packet;
                    }
                }
                Some(Ok(_)) => continue,
                other => panic!("connection ended: {other:?}"),
            }
        }
    })
    .await
    .expect("packet should arrive")
}

/// Asserts nothing arrives for a short while.
async fn expect_silence(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    assert!(result.is_err(), "expected silence, got {result:?}");
}

/// Hosts the fixture quiz and returns the join code.
async fn host(ws: &mut ClientWs) -> JoinCode {
    send(ws, ClientPacket::HostGame(HostGameRequest {
        quiz_id: QuizId::from("capitals"),
    }))
    .await;
    let ServerPacket::HostGame(reply) = recv(ws).await else {
        panic!("expected join code");
    };
    assert_eq!(recv(ws).await, ServerPacket::state(GameState::Lobby));
    reply.code
}

/// Joins as `name` and returns the id the host was told about.
async fn join(addr: &str, host: &mut ClientWs, code: &JoinCode, name: &str) -> (ClientWs, PlayerId) {
    let mut ws = connect(addr).await;
    send(&mut ws, ClientPacket::Connect(Connect {
        code: code.clone(),
        name: name.into(),
    }))
    .await;
    assert_eq!(recv(&mut ws).await, ServerPacket::state(GameState::Lobby));

    let ServerPacket::PlayerJoin(joined) = recv(host).await else {
        panic!("host should hear about the join");
    };
    assert_eq!(joined.player.name, name);
    (ws, joined.player.id)
}

// =========================================================================
// Hosting and joining
// =========================================================================

#[tokio::test]
async fn test_host_gets_join_code_and_lobby() {
    let addr = start_server(frozen_clock()).await;
    let mut host_ws = connect(&addr).await;

    let code = host(&mut host_ws).await;
    assert!(code.is_well_formed(), "code {code} should be six digits");
}

#[tokio::test]
async fn test_wire_format_is_tag_then_json() {
    let addr = start_server(frozen_clock()).await;
    let mut ws = connect(&addr).await;

    let mut frame = vec![1u8];
    frame.extend(serde_json::to_vec(&serde_json::json!({ "quizId": "capitals" })).unwrap());
    ws.send(Message::Binary(frame.into())).await.unwrap();

    let Some(Ok(Message::Binary(reply))) = ws.next().await else {
        panic!("expected a binary frame");
    };
    assert_eq!(reply[0], 1);
    let body: serde_json::Value = serde_json::from_slice(&reply[1..]).unwrap();
    assert_eq!(body["quizId"].as_str().map(str::len), Some(6));

    let Some(Ok(Message::Binary(state))) = ws.next().await else {
        panic!("expected a binary frame");
    };
    assert_eq!(&state[..], b"\x03{\"state\":0}");
}

#[tokio::test]
async fn test_unknown_quiz_gets_no_reply() {
    let addr = start_server(frozen_clock()).await;
    let mut ws = connect(&addr).await;
    send(&mut ws, ClientPacket::HostGame(HostGameRequest {
        quiz_id: QuizId::from("missing"),
    }))
    .await;
    expect_silence(&mut ws).await;
}

#[tokio::test]
async fn test_player_joins_lobby() {
    let addr = start_server(frozen_clock()).await;
    let mut host_ws = connect(&addr).await;
    let code = host(&mut host_ws).await;

    let (_ann, ann_id) = join(&addr, &mut host_ws, &code, "ann").await;
    let (_bo, bo_id) = join(&addr, &mut host_ws, &code, "bo").await;
    assert_ne!(ann_id, bo_id);
}

#[tokio::test]
async fn test_unknown_code_is_silently_dropped() {
    let addr = start_server(frozen_clock()).await;
    let mut host_ws = connect(&addr).await;
    host(&mut host_ws).await;

    let mut ws = connect(&addr).await;
    send(&mut ws, ClientPacket::Connect(Connect {
        code: JoinCode::new("000000"),
        name: "ghost".into(),
    }))
    .await;

    expect_silence(&mut ws).await;
    expect_silence(&mut host_ws).await;
}

#[tokio::test]
async fn test_garbage_does_not_close_the_connection() {
    let addr = start_server(frozen_clock()).await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Binary(vec![0xFF].into())).await.unwrap();
    ws.send(Message::Binary(vec![7, b'x', b'y'].into())).await.unwrap();
    ws.send(Message::Binary(vec![9, b'{', b'}'].into())).await.unwrap();

    let code = host(&mut ws).await;
    assert!(code.is_well_formed());
}

// =========================================================================
// Playing
// =========================================================================

#[tokio::test]
async fn test_question_goes_to_host_only_and_answers_reveal() {
    let addr = start_server(frozen_clock()).await;
    let mut host_ws = connect(&addr).await;
    let code = host(&mut host_ws).await;
    let (mut ann, _) = join(&addr, &mut host_ws, &code, "ann").await;
    let (mut bo, _) = join(&addr, &mut host_ws, &code, "bo").await;

    send(&mut host_ws, ClientPacket::StartGame(StartGame {})).await;

    assert_eq!(recv(&mut host_ws).await, ServerPacket::state(GameState::Play));
    let ServerPacket::QuestionShow(show) = recv(&mut host_ws).await else {
        panic!("host should see the question");
    };
    assert_eq!(show.question.text, "Capital of France?");
    assert!(show.question.choices[0].correct);

    assert_eq!(recv(&mut ann).await, ServerPacket::state(GameState::Play));
    assert_eq!(recv(&mut bo).await, ServerPacket::state(GameState::Play));

    send(&mut ann, ClientPacket::QuestionAnswer(QuestionAnswer { choice: 0 })).await;
    expect_silence(&mut ann).await;
    send(&mut bo, ClientPacket::QuestionAnswer(QuestionAnswer { choice: 1 })).await;

    assert_eq!(
        recv(&mut ann).await,
        ServerPacket::PlayerReveal(PlayerReveal { points: 5000 + 3 * 1000 / 60 })
    );
    assert_eq!(recv(&mut ann).await, ServerPacket::state(GameState::Reveal));
    assert_eq!(recv(&mut bo).await, ServerPacket::PlayerReveal(PlayerReveal { points: 0 }));
    assert_eq!(recv(&mut bo).await, ServerPacket::state(GameState::Reveal));
    assert_eq!(recv(&mut host_ws).await, ServerPacket::state(GameState::Reveal));
}

#[tokio::test]
async fn test_countdown_drives_phases() {
    let config = GameConfig {
        reveal_secs: 2,
        tick: TickConfig::with_period(Duration::from_millis(50)),
        ..GameConfig::default()
    };
    let addr = start_server(config).await;
    let mut host_ws = connect(&addr).await;
    host(&mut host_ws).await;

    send(&mut host_ws, ClientPacket::StartGame(StartGame {})).await;
    assert_eq!(recv(&mut host_ws).await, ServerPacket::state(GameState::Play));
    assert!(matches!(recv(&mut host_ws).await, ServerPacket::QuestionShow(_)));

    for remaining in [2, 1, 0] {
        assert_eq!(recv(&mut host_ws).await, ServerPacket::Tick(Tick { tick: remaining }));
    }
    assert_eq!(recv(&mut host_ws).await, ServerPacket::state(GameState::Reveal));

    for remaining in [1, 0] {
        assert_eq!(recv(&mut host_ws).await, ServerPacket::Tick(Tick { tick: remaining }));
    }
    assert_eq!(recv(&mut host_ws).await, ServerPacket::state(GameState::Intermission));
    let ServerPacket::Leaderboard(board) = recv(&mut host_ws).await else {
        panic!("expected leaderboard after intermission starts");
    };
    assert!(board.entries.is_empty());
}

#[tokio::test]
async fn test_skipping_past_last_question_ends_game() {
    let addr = start_server(frozen_clock()).await;
    let mut host_ws = connect(&addr).await;
    let code = host(&mut host_ws).await;
    let (mut ann, _) = join(&addr, &mut host_ws, &code, "ann").await;

    for _ in 0..3 {
        send(&mut host_ws, ClientPacket::StartGame(StartGame {})).await;
    }

    let states: Vec<ServerPacket> = vec![recv(&mut ann).await, recv(&mut ann).await, recv(&mut ann).await];
    assert_eq!(
        states,
        vec![
            ServerPacket::state(GameState::Play),
            ServerPacket::state(GameState::Play),
            ServerPacket::state(GameState::End),
        ]
    );
    expect_silence(&mut ann).await;
}

// =========================================================================
// Disconnects
// =========================================================================

#[tokio::test]
async fn test_player_disconnect_reaches_host() {
    let addr = start_server(frozen_clock()).await;
    let mut host_ws = connect(&addr).await;
    let code = host(&mut host_ws).await;
    let (ann, ann_id) = join(&addr, &mut host_ws, &code, "ann").await;

    drop(ann);

    let ServerPacket::PlayerDisconnect(gone) = recv(&mut host_ws).await else {
        panic!("expected PlayerDisconnect");
    };
    assert_eq!(gone.player_id, ann_id);
    expect_silence(&mut host_ws).await;
}

#[tokio::test]
async fn test_host_disconnect_ends_game_for_players() {
    let addr = start_server(frozen_clock()).await;
    let mut host_ws = connect(&addr).await;
    let code = host(&mut host_ws).await;
    let (mut ann, _) = join(&addr, &mut host_ws, &code, "ann").await;

    host_ws.close(None).await.unwrap();

    assert_eq!(recv(&mut ann).await, ServerPacket::state(GameState::End));

    // The code no longer admits anyone.
    let mut late = connect(&addr).await;
    send(&mut late, ClientPacket::Connect(Connect {
        code,
        name: "late".into(),
    }))
    .await;
    expect_silence(&mut late).await;
}
