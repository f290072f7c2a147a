//! IPC server for the pomobot daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - One JSON request and one JSON response per connection
//! - The daemon loop tying the socket, the session registry and the
//!   notification dispatcher together

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use crate::notification::{dispatch_notifications, NotificationSender};
use crate::types::{BotConfig, IpcRequest, IpcResponse};

use super::handler::CommandHandler;
use super::registry::SessionRegistry;

// ============================================================================
// Constants
// ============================================================================

/// Default socket path, relative to the home directory
pub const DEFAULT_SOCKET_PATH: &str = ".pomobot/pomobot.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Resolves [`DEFAULT_SOCKET_PATH`] against the user's home directory.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_socket_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home.join(DEFAULT_SOCKET_PATH))
}

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Socket binding error
    #[error("Failed to bind socket: {0}")]
    BindError(String),

    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Write error
    #[error("Failed to write response: {0}")]
    WriteError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
#[derive(Debug)]
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        // Remove existing socket file if present
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .map_err(|e| IpcError::BindError(format!("{}: {e}", socket_path.display())))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            anyhow::bail!("Connection closed by client");
        }
        if n == MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .map_err(|e| IpcError::WriteError(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| IpcError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to a [`CommandHandler`].
#[derive(Debug, Clone)]
pub struct RequestHandler {
    commands: CommandHandler,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(commands: CommandHandler) -> Self {
        Self { commands }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        self.commands
            .handle(request.actor_id, request.command)
            .await
            .into()
    }

    /// Serves a single connection: one request, one response.
    ///
    /// Malformed requests are answered with an error response before the
    /// connection is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the response cannot be written.
    pub async fn serve(&self, mut stream: UnixStream) -> Result<()> {
        let response = match IpcServer::receive_request(&mut stream).await {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                tracing::debug!("rejecting request: {e:#}");
                IpcResponse::error(format!("Invalid request: {e:#}"))
            }
        };
        IpcServer::send_response(&mut stream, &response).await
    }
}

// ============================================================================
// Daemon
// ============================================================================

/// Runs the daemon until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the socket cannot be
/// bound, or the Ctrl-C handler cannot be installed.
pub async fn run_daemon<S>(config: BotConfig, socket_path: &Path, sender: S) -> Result<()>
where
    S: NotificationSender + Send + Sync + 'static,
{
    run_daemon_until(config, socket_path, sender, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("received Ctrl-C"),
            Err(e) => tracing::error!("failed to listen for Ctrl-C: {e}"),
        }
    })
    .await
}

/// Runs the daemon until `shutdown` resolves.
///
/// Each accepted connection is served on its own task. Phase-end events are
/// delivered through `sender` by a dedicated dispatcher task.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the socket cannot be
/// bound.
pub async fn run_daemon_until<S, F>(
    config: BotConfig,
    socket_path: &Path,
    sender: S,
    shutdown: F,
) -> Result<()>
where
    S: NotificationSender + Send + Sync + 'static,
    F: Future<Output = ()>,
{
    config.validate().context("Invalid daemon configuration")?;
    let server = IpcServer::new(socket_path)?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let dispatcher = tokio::spawn(dispatch_notifications(events_rx, sender));

    let registry = Arc::new(SessionRegistry::new(config, events_tx));
    let handler = RequestHandler::new(CommandHandler::new(registry.clone()));

    tracing::info!(socket = %server.socket_path().display(), "daemon listening");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = server.accept() => match accepted {
                Ok(stream) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handler.serve(stream).await {
                            tracing::warn!("connection failed: {e:#}");
                        }
                    });
                }
                Err(e) => tracing::warn!("{e:#}"),
            },
            () = &mut shutdown => break,
        }
    }

    let sessions = registry.len().await;
    tracing::info!(sessions, "daemon shutting down");
    dispatcher.abort();
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
