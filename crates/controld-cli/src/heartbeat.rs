//! Heartbeat task: drives [`Board::heartbeat_tick`] on the configured interval.

use controld_hardware::{Board, lock};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Run until `shutdown` is cancelled.
///
/// The interval is re-read every cycle so `heartbeat` command changes take
/// effect on the next beat.
pub async fn run(board: Arc<Board>, shutdown: CancellationToken) {
    debug!("heartbeat task started");
    loop {
        let interval = match lock(board.heartbeat()) {
            Ok(heartbeat) => heartbeat.interval(),
            Err(e) => {
                warn!(error = %e, "heartbeat unavailable");
                return;
            }
        };

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let tick = {
            let board = board.clone();
            tokio::task::spawn_blocking(move || board.heartbeat_tick())
        };
        match tick.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "heartbeat beat failed"),
            Err(e) => warn!(error = %e, "heartbeat task failed"),
        }
    }
    debug!("heartbeat task stopped");
}
