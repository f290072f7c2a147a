//! IPC client for talking to the pomobot daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::daemon::default_socket_path;
use crate::types::{ActorId, Command, IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
#[derive(Debug, Clone)]
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        Ok(Self::with_socket_path(default_socket_path()?))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Creates a client for `socket_path`, or the default path if `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is given and the home directory cannot be
    /// determined.
    pub fn for_socket(socket_path: Option<&Path>) -> Result<Self> {
        match socket_path {
            Some(path) => Ok(Self::with_socket_path(path.to_path_buf())),
            None => Self::new(),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Sends `command` for `actor_id` and returns the daemon's response.
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon cannot be reached after retrying, or if
    /// it rejects the command; the rejection's message becomes the error.
    pub async fn send(&self, actor_id: ActorId, command: Command) -> Result<IpcResponse> {
        let request = IpcRequest::new(actor_id, command);
        let response = self.send_request_with_retry(&request).await?;

        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }

    /// Sends a play command to the daemon.
    pub async fn play(&self, actor_id: ActorId) -> Result<IpcResponse> {
        self.send(actor_id, Command::Play).await
    }

    /// Sends a pause command to the daemon.
    pub async fn pause(&self, actor_id: ActorId) -> Result<IpcResponse> {
        self.send(actor_id, Command::Pause).await
    }

    /// Sends an unpause command to the daemon.
    pub async fn unpause(&self, actor_id: ActorId) -> Result<IpcResponse> {
        self.send(actor_id, Command::Unpause).await
    }

    /// Sends a stop command to the daemon.
    pub async fn stop(&self, actor_id: ActorId) -> Result<IpcResponse> {
        self.send(actor_id, Command::Stop).await
    }

    /// Sends a display query to the daemon.
    pub async fn display(&self, actor_id: ActorId) -> Result<IpcResponse> {
        self.send(actor_id, Command::Display).await
    }

    /// Sends a request to the daemon, retrying transport failures only.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut attempt = 1;
        loop {
            match self.send_request(request).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < MAX_RETRIES => {
                    tracing::warn!("request failed (attempt {attempt}/{MAX_RETRIES}): {e:#}");
                    let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Sends a single request to the daemon.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let io_timeout = Duration::from_secs(IO_TIMEOUT_SECS);

        // Connect with timeout
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timed out")?
            .with_context(|| {
                format!(
                    "Cannot connect to daemon at {}; start it with 'pomobot daemon'",
                    self.socket_path.display()
                )
            })?;

        let request_json = serde_json::to_vec(request).context("Failed to serialize request")?;

        timeout(io_timeout, stream.write_all(&request_json))
            .await
            .context("Write timed out")?
            .context("Failed to send request")?;

        timeout(io_timeout, stream.flush())
            .await
            .context("Flush timed out")?
            .context("Failed to flush request")?;

        // Shutdown write side to signal end of request
        stream
            .shutdown()
            .await
            .context("Failed to shut down write side")?;

        let mut buffer = Vec::new();
        timeout(
            io_timeout,
            (&mut stream).take(MAX_RESPONSE_SIZE).read_to_end(&mut buffer),
        )
        .await
        .context("Read timed out")?
        .context("Failed to read response")?;

        if buffer.is_empty() {
            anyhow::bail!("Daemon closed the connection without responding");
        }

        serde_json::from_slice(&buffer).context("Failed to parse response")
    }
}

// ============================================================================
// Tests
// ============================================================================
