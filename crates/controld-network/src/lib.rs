//! Network transport for the controld daemon
//!
//! This crate exposes the command handler over TCP. Requests and responses
//! are newline-delimited JSON, framed with `tokio_util`'s `LinesCodec`.
//!
//! # Components
//!
//! - **CommandServer**: accepts connections and answers request lines
//! - **Request**: request line parsing shared with the console transport
//!
//! # Example
//!
//! ```no_run
//! use controld_command::CommandHandler;
//! use controld_network::{CommandServer, ServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig {
//!     bind_addr: "127.0.0.1:5000".parse()?,
//!     max_connections: 4,
//! };
//!
//! let server = CommandServer::bind(config, CommandHandler::new()).await?;
//! let shutdown = CancellationToken::new();
//! tokio::spawn(server.run(shutdown.clone()));
//!
//! // Later: stop accepting and close every connection
//! shutdown.cancel();
//! # Ok(())
//! # }
//! ```

pub mod request;
mod server;

pub use request::{Request, handle_line};
pub use server::{
    CommandServer, DEFAULT_BIND_ADDR, MAX_LINE_LENGTH, ServerConfig, ServerError,
};
