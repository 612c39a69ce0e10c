//! TCP command server.
//!
//! Clients exchange newline-delimited JSON with the daemon: one request
//! line in, one response line out, in order, for as long as the connection
//! stays open.
//!
//! ```text
//! client ──> {"command": "led", "params": {"led": 0, "enable": true}}
//! client <── {"bank":1,"enable":true,"error":0,"led":0,"pin":21}
//! ```
//!
//! Each connection runs in its own task. Commands block on register access,
//! so they run on tokio's blocking pool; the response is exactly what
//! [`CommandHandler::dispatch`] returned.
//!
//! # Example Usage
//!
//! ```no_run
//! use controld_command::CommandHandler;
//! use controld_network::{CommandServer, ServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = CommandHandler::new();
//! let server = CommandServer::bind(ServerConfig::default(), handler).await?;
//!
//! let shutdown = CancellationToken::new();
//! server.run(shutdown.clone()).await;
//! # Ok(())
//! # }
//! ```

use crate::request;
use controld_command::{CommandHandler, response};
use controld_core::Error;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Longest accepted request line, in bytes.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Default listening address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Pause after a failed accept before trying again.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Configuration for the command server
///
/// # Example
///
/// ```
/// use controld_network::ServerConfig;
///
/// let config = ServerConfig {
///     bind_addr: "0.0.0.0:5000".parse().unwrap(),
///     max_connections: 8,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,

    /// Maximum number of simultaneous connections
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_connections: 16,
        }
    }
}

/// Errors that can occur during server operations
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to address
    #[error("Failed to bind to {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error
    #[error("Codec error: {0}")]
    Codec(String),
}

impl From<LinesCodecError> for ServerError {
    fn from(e: LinesCodecError) -> Self {
        match e {
            LinesCodecError::Io(e) => ServerError::Io(e),
            other => ServerError::Codec(other.to_string()),
        }
    }
}

/// Releases a connection slot when dropped.
struct Slot(Arc<AtomicUsize>);

impl Drop for Slot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// JSON-lines command server.
pub struct CommandServer {
    listener: TcpListener,
    handler: CommandHandler,
    config: ServerConfig,
    active: Arc<AtomicUsize>,
}

impl CommandServer {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::BindFailed`] if the address is in use or not
    /// permitted.
    pub async fn bind(config: ServerConfig, handler: CommandHandler) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|source| ServerError::BindFailed {
                addr: config.bind_addr,
                source,
            })?;

        info!(
            addr = %listener.local_addr()?,
            max_connections = config.max_connections,
            "command server listening"
        );

        Ok(Self {
            listener,
            handler,
            config,
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address actually bound, useful with port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Connections currently being served.
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Accept and serve connections until `shutdown` is cancelled.
    ///
    /// Connections beyond `max_connections` are closed immediately. A failed
    /// accept (descriptor exhaustion, aborted handshake) is logged and
    /// retried after [`ACCEPT_BACKOFF`]. On shutdown every connection task is
    /// stopped before this returns.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = next_connection(|| self.listener.accept(), &shutdown) => {
                    let Some((stream, addr)) = accepted else {
                        break;
                    };

                    let current = self.active.fetch_add(1, Ordering::SeqCst);
                    let slot = Slot(self.active.clone());
                    if current >= self.config.max_connections {
                        warn!(
                            addr = %addr,
                            max_connections = self.config.max_connections,
                            "connection rejected: maximum connections reached"
                        );
                        drop(slot);
                        drop(stream);
                        continue;
                    }

                    if let Err(e) = stream.set_nodelay(true) {
                        warn!(addr = %addr, error = %e, "failed to set TCP_NODELAY");
                    }

                    info!(addr = %addr, active = current + 1, "client connected");
                    let handler = self.handler.clone();
                    let shutdown = shutdown.clone();
                    connections.spawn(async move {
                        let _slot = slot;
                        if let Err(e) = serve(stream, handler, shutdown).await {
                            warn!(addr = %addr, error = %e, "connection closed with error");
                        }
                        info!(addr = %addr, "client disconnected");
                    });
                }
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished
                        && e.is_panic()
                    {
                        error!(error = %e, "connection task panicked");
                    }
                }
            }
        }

        connections.abort_all();
        while connections.join_next().await.is_some() {}
        info!("command server stopped");
    }
}

/// Wait for the next accepted connection, retrying failures until shutdown.
///
/// Returns `None` once `shutdown` is cancelled.
async fn next_connection<T, F, Fut>(mut accept: F, shutdown: &CancellationToken) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        let error = tokio::select! {
            _ = shutdown.cancelled() => return None,
            accepted = accept() => match accepted {
                Ok(connection) => return Some(connection),
                Err(e) => e,
            },
        };

        error!(error = %error, "accept failed, retrying");
        tokio::select! {
            _ = shutdown.cancelled() => return None,
            _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
        }
    }
}

/// Serve one connection until EOF, error or shutdown.
async fn serve(
    stream: TcpStream,
    handler: CommandHandler,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            line = framed.next() => line,
        };

        let reply = match line {
            None => return Ok(()),
            Some(Ok(line)) if line.trim().is_empty() => continue,
            Some(Ok(line)) => {
                debug!(bytes = line.len(), "request");
                dispatch(&handler, line).await
            }
            // The codec skips the rest of an oversized line and keeps going
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => response::failure(
                &Error::syntax(format!("request longer than {MAX_LINE_LENGTH} bytes")),
            ),
            Some(Err(e)) => return Err(e.into()),
        };

        framed.send(reply.to_string()).await?;
    }
}

/// Run a request line on the blocking pool.
async fn dispatch(handler: &CommandHandler, line: String) -> serde_json::Value {
    let handler = handler.clone();
    match tokio::task::spawn_blocking(move || request::handle_line(&handler, &line)).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, "command task failed");
            response::failure(&Error::cmd_failed("command aborted"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.max_connections, 16);
    }

    #[test]
    fn test_codec_error_mapping() {
        let e: ServerError = LinesCodecError::MaxLineLengthExceeded.into();
        assert!(matches!(e, ServerError::Codec(_)));

        let io = std::io::Error::other("boom");
        let e: ServerError = LinesCodecError::Io(io).into();
        assert!(matches!(e, ServerError::Io(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_accepts_are_retried() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let shutdown = CancellationToken::new();

        let accepted = next_connection(
            move || async move {
                match attempts.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(io::Error::from_raw_os_error(24)),
                    1 => Err(io::Error::from(io::ErrorKind::ConnectionAborted)),
                    n => Ok(n),
                }
            },
            &shutdown,
        )
        .await;

        assert_eq!(accepted, Some(2));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_accept_backoff() {
        let shutdown = CancellationToken::new();
        let canceller = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ACCEPT_BACKOFF * 5).await;
            canceller.cancel();
        });

        let accepted = next_connection(
            || async { Err::<(), _>(io::Error::from_raw_os_error(24)) },
            &shutdown,
        )
        .await;
        assert_eq!(accepted, None);
    }

    #[tokio::test]
    async fn test_bind_reports_address() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            max_connections: 1,
        };
        let server = CommandServer::bind(config, CommandHandler::new())
            .await
            .unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
        assert_eq!(server.active_connections(), 0);
    }

    #[tokio::test]
    async fn test_bind_failure() {
        let first = CommandServer::bind(
            ServerConfig {
                bind_addr: "127.0.0.1:0".parse().unwrap(),
                max_connections: 1,
            },
            CommandHandler::new(),
        )
        .await
        .unwrap();

        let taken = ServerConfig {
            bind_addr: first.local_addr().unwrap(),
            max_connections: 1,
        };
        let result = CommandServer::bind(taken, CommandHandler::new()).await;
        assert!(matches!(result, Err(ServerError::BindFailed { .. })));
    }
}
