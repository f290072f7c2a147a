//! Integration tests for daemon-CLI IPC communication.
//!
//! These tests drive the real `IpcClient` against a real `IpcServer` and
//! `RequestHandler`:
//! - Play/pause/display via IPC
//! - Per-actor isolation across connections
//! - Rejected commands surfacing as client errors
//! - Connection error handling

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use pomobot::cli::client::IpcClient;
use pomobot::daemon::ipc::{IpcServer, RequestHandler};
use pomobot::daemon::{CommandHandler, PhaseEvent, SessionRegistry};
use pomobot::types::{ActorId, BotConfig};

// ============================================================================
// Test Helpers
// ============================================================================

/// Creates a temporary socket path for testing.
fn create_temp_socket_path() -> PathBuf {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("integration_test.sock");
    // Keep the directory so it's not deleted
    std::mem::forget(dir);
    path
}

/// Creates a request handler over a fresh registry.
fn create_handler() -> (RequestHandler, mpsc::UnboundedReceiver<PhaseEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let registry = Arc::new(SessionRegistry::new(BotConfig::default(), tx));
    (RequestHandler::new(CommandHandler::new(registry)), rx)
}

/// Serves connections until the test ends.
fn spawn_server(socket_path: &PathBuf, handler: RequestHandler) -> tokio::task::JoinHandle<()> {
    let server = IpcServer::new(socket_path).unwrap();
    tokio::spawn(async move {
        while let Ok(stream) = server.accept().await {
            let _ = handler.serve(stream).await;
        }
    })
}

// ============================================================================
// Command Flow via IPC
// ============================================================================

#[tokio::test]
async fn play_via_ipc_starts_work_phase() {
    let socket_path = create_temp_socket_path();
    let (handler, _rx) = create_handler();
    let server = spawn_server(&socket_path, handler);

    let client = IpcClient::with_socket_path(socket_path);
    let response = client.play(ActorId(42)).await;

    assert!(response.is_ok(), "Expected successful response, got: {response:?}");
    let response = response.unwrap();
    assert_eq!(response.message, "Started work timer for <@42>");

    let data = response.data.expect("Response should contain data");
    assert_eq!(data.phase.as_deref(), Some("work"));
    assert_eq!(data.state.as_deref(), Some("running"));
    assert_eq!(data.remaining_seconds, Some(25 * 60));
    assert_eq!(data.completed_pomodoros, Some(0));

    server.abort();
}

#[tokio::test]
async fn pause_via_ipc_freezes_timer() {
    let socket_path = create_temp_socket_path();
    let (handler, _rx) = create_handler();
    let server = spawn_server(&socket_path, handler);
    let client = IpcClient::with_socket_path(socket_path);

    client.play(ActorId(1)).await.unwrap();
    let paused = client.pause(ActorId(1)).await.unwrap();
    let data = paused.data.unwrap();
    assert_eq!(data.state.as_deref(), Some("paused"));

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let display = client.display(ActorId(1)).await.unwrap();
    assert_eq!(display.data.unwrap().elapsed_seconds, data.elapsed_seconds);

    server.abort();
}

#[tokio::test]
async fn full_command_cycle_via_ipc() {
    let socket_path = create_temp_socket_path();
    let (handler, _rx) = create_handler();
    let server = spawn_server(&socket_path, handler);
    let client = IpcClient::with_socket_path(socket_path);
    let actor = ActorId(7);

    let expected = [
        (client.play(actor).await, "running"),
        (client.pause(actor).await, "paused"),
        (client.unpause(actor).await, "running"),
        (client.display(actor).await, "running"),
    ];
    for (response, state) in expected {
        let response = response.unwrap();
        assert_eq!(response.data.unwrap().state.as_deref(), Some(state));
    }

    let stopped = client.stop(actor).await.unwrap();
    assert_eq!(stopped.message, "Stopped timer for <@7>");

    let after = client.display(actor).await.unwrap();
    let data = after.data.unwrap();
    assert_eq!(data.state.as_deref(), Some("idle"));
    assert_eq!(data.phase.as_deref(), Some("work"));
    assert_eq!(data.elapsed_seconds, Some(0));

    server.abort();
}

#[tokio::test]
async fn actors_are_isolated_across_connections() {
    let socket_path = create_temp_socket_path();
    let (handler, _rx) = create_handler();
    let server = spawn_server(&socket_path, handler);
    let client = IpcClient::with_socket_path(socket_path);

    client.play(ActorId(1)).await.unwrap();
    client.play(ActorId(2)).await.unwrap();
    client.pause(ActorId(2)).await.unwrap();

    let one = client.display(ActorId(1)).await.unwrap().data.unwrap();
    let two = client.display(ActorId(2)).await.unwrap().data.unwrap();
    assert_eq!(one.state.as_deref(), Some("running"));
    assert_eq!(two.state.as_deref(), Some("paused"));

    server.abort();
}

// ============================================================================
// Rejected Commands
// ============================================================================

#[tokio::test]
async fn display_for_unknown_actor_is_an_error() {
    let socket_path = create_temp_socket_path();
    let (handler, _rx) = create_handler();
    let server = spawn_server(&socket_path, handler);

    let client = IpcClient::with_socket_path(socket_path);
    let result = client.display(ActorId(404)).await;

    let message = result.unwrap_err().to_string();
    assert_eq!(message, "No timer running for <@404>");

    server.abort();
}

#[tokio::test]
async fn invalid_transition_is_an_error() {
    let socket_path = create_temp_socket_path();
    let (handler, _rx) = create_handler();
    let server = spawn_server(&socket_path, handler);
    let client = IpcClient::with_socket_path(socket_path);

    client.play(ActorId(3)).await.unwrap();
    let again = client.play(ActorId(3)).await.unwrap_err().to_string();
    assert_eq!(again, "Timer is already running for <@3>");

    let unpause = client.unpause(ActorId(3)).await.unwrap_err().to_string();
    assert_eq!(unpause, "Timer is not paused for <@3>");

    let fresh = client.pause(ActorId(4)).await.unwrap_err().to_string();
    assert_eq!(fresh, "Nothing to pause for <@4>");

    server.abort();
}

// ============================================================================
// Connection Errors
// ============================================================================

#[tokio::test]
async fn connection_error_when_daemon_not_running() {
    let socket_path = create_temp_socket_path();
    let client = IpcClient::with_socket_path(socket_path);

    let result = timeout(Duration::from_secs(10), client.display(ActorId(1)))
        .await
        .expect("client should give up after its retries");

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Cannot connect to daemon"), "got: {message}");
}

#[tokio::test]
async fn server_survives_malformed_request() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixStream;

    let socket_path = create_temp_socket_path();
    let (handler, _rx) = create_handler();
    let server = spawn_server(&socket_path, handler);

    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    stream.write_all(b"{\"actorId\":\"nope\"}").await.unwrap();
    stream.shutdown().await.unwrap();
    let mut buffer = Vec::new();
    stream.read_to_end(&mut buffer).await.unwrap();
    let response: pomobot::IpcResponse = serde_json::from_slice(&buffer).unwrap();
    assert!(!response.is_success());

    let client = IpcClient::with_socket_path(socket_path);
    assert!(client.play(ActorId(9)).await.is_ok());

    server.abort();
}
