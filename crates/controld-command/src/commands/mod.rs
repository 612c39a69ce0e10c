//! The daemon's command set.
//!
//! Each module builds one [`Binding`](crate::binding::Binding) over the
//! board's control objects. [`register_all`] installs the whole set.

pub mod gpio;
pub mod gps;
pub mod heartbeat;
pub mod help;
pub mod led;
pub mod mail;
pub mod system;

use crate::handler::CommandHandler;
use controld_hardware::Board;
use std::sync::Arc;
use tracing::info;

/// Register every command against `board` in `handler`.
pub fn register_all(handler: &CommandHandler, board: &Board) {
    handler.register(Arc::new(help::build(handler)));
    handler.register(Arc::new(gpio::build(board)));
    handler.register(Arc::new(led::build(board)));
    handler.register(Arc::new(heartbeat::build(board)));
    handler.register(Arc::new(system::build_system(board)));
    handler.register(Arc::new(system::build_datetime(board)));
    handler.register(Arc::new(mail::build(board)));
    handler.register(Arc::new(gps::build(board)));
    info!(commands = handler.len(), "command set ready");
}
