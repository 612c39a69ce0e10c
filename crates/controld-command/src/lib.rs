//! JSON command engine for the controld daemon.
//!
//! A request is a command name plus a JSON object of parameters; the reply
//! is always a JSON object with an integer `error` field. This crate turns
//! one into the other:
//!
//! - [`binding`]: the generic parameter binding engine every command is
//!   built from, and the shared value conventions (selectors, booleans,
//!   bounded numbers, enumerated strings).
//! - [`handler`]: the name-to-command dispatch table shared by all
//!   transports.
//! - [`commands`]: the concrete command set (`help`, `gpio`, `led`,
//!   `heartbeat`, `system`, `datetime`, `mail`).
//! - [`response`]: the success/failure response shapes.
//!
//! # Example
//!
//! ```
//! use controld_command::{CommandHandler, commands};
//! use controld_core::Mode;
//! use controld_hardware::{Board, BoardConfig};
//! use serde_json::json;
//!
//! let board = Board::new(&BoardConfig {
//!     mode: Mode::Simulated,
//!     ..BoardConfig::default()
//! })
//! .unwrap();
//! let handler = CommandHandler::new();
//! commands::register_all(&handler, &board);
//!
//! let reply = handler.dispatch("led", &json!({"led": 1, "enable": true}));
//! assert_eq!(reply["enable"], json!(true));
//! assert_eq!(reply["error"], json!(0));
//!
//! let reply = handler.dispatch("fly", &json!({}));
//! assert_eq!(reply["error"], json!(2));
//! ```

pub mod binding;
pub mod commands;
pub mod handler;
pub mod response;

pub use binding::{Binding, Command, ParamKind};
pub use handler::{CommandHandler, CommandMap};
