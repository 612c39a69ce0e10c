//! Process and host information.

use crate::control::Control;
use controld_core::{ControlId, Mode};
use std::time::{Duration, Instant};

const HOSTNAME_SOURCES: [&str; 2] = ["/proc/sys/kernel/hostname", "/etc/hostname"];
const HOSTNAME_FALLBACK: &str = "localhost";

/// System information control object.
#[derive(Debug)]
pub struct SystemInfo {
    id: ControlId,
    mode: Mode,
    started: Instant,
    hostname: String,
}

impl SystemInfo {
    /// Capture host information at startup.
    pub fn new(mode: Mode) -> Self {
        Self {
            id: ControlId::new(0),
            mode,
            started: Instant::now(),
            hostname: read_hostname(),
        }
    }

    /// Daemon version.
    pub fn version(&self) -> &'static str {
        controld_core::VERSION
    }

    /// Time since the board was brought up.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}

impl Control for SystemInfo {
    const KIND: &'static str = "system";

    fn id(&self) -> ControlId {
        self.id
    }
}

fn read_hostname() -> String {
    HOSTNAME_SOURCES
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| HOSTNAME_FALLBACK.to_string())
}
