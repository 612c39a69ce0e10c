//! Shared vocabulary for the controld hardware control daemon.
//!
//! Every crate in the workspace speaks in terms of the types defined here:
//! the closed [`ErrorCode`] taxonomy that travels inside every command
//! response, the [`Error`] value that pairs a code with a bounded detail
//! string, control-object identifiers and the parameter/command names that
//! make up the JSON request contract.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, ErrorCode, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
