//! Daemon configuration: JSON file plus command-line overrides.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working real-hardware daemon on the reference board:
//!
//! ```json
//! {
//!   "simulated": true,
//!   "heartbeat": { "led": 3, "interval_ms": 500 },
//!   "server": { "bind_addr": "0.0.0.0:5000", "max_connections": 4 },
//!   "console": false
//! }
//! ```

use anyhow::{Context, Result, bail};
use controld_core::Mode;
use controld_hardware::board::DEFAULT_MEMORY_DEVICE;
use controld_hardware::{
    BoardConfig, GpioBankConfig, GpsConfig, HeartbeatConfig, LedConfig, MailSettings,
};
use controld_network::ServerConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Network server section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub enabled: bool,

    #[serde(flatten)]
    pub config: ServerConfig,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            enabled: true,
            config: ServerConfig::default(),
        }
    }
}

/// Complete daemon configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Use in-memory registers instead of the memory device.
    pub simulated: bool,

    pub memory_device: PathBuf,

    pub gpio: Vec<GpioBankConfig>,

    pub leds: Vec<LedConfig>,

    pub heartbeat: HeartbeatConfig,

    pub server: ServerSection,

    /// Read commands from standard input.
    pub console: bool,

    /// Initial mail settings.
    pub mail: MailSettings,

    pub gps: GpsConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let board = BoardConfig::default();
        Self {
            simulated: false,
            memory_device: PathBuf::from(DEFAULT_MEMORY_DEVICE),
            gpio: board.gpio,
            leds: board.leds,
            heartbeat: board.heartbeat,
            server: ServerSection::default(),
            console: true,
            mail: board.mail,
            gps: board.gps,
        }
    }
}

impl DaemonConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Hardware part of the configuration.
    pub fn board(&self) -> BoardConfig {
        BoardConfig {
            mode: Mode::from_simulated(self.simulated),
            memory_device: self.memory_device.clone(),
            gpio: self.gpio.clone(),
            leds: self.leds.clone(),
            heartbeat: self.heartbeat.clone(),
            mail: self.mail.clone(),
            gps: self.gps.clone(),
        }
    }
}

/// Parsed command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub simulated: bool,
    pub bind: Option<SocketAddr>,
    pub no_console: bool,
    pub no_server: bool,
    pub verbose: bool,
}

impl Args {
    /// Parse arguments (without the program name).
    ///
    /// Returns `None` when help was requested.
    pub fn parse<I>(raw: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = Args::default();
        let mut raw = raw.into_iter();
        while let Some(arg) = raw.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(None),
                "-s" | "--simulated" => args.simulated = true,
                "-v" | "--verbose" => args.verbose = true,
                "--no-console" => args.no_console = true,
                "--no-server" => args.no_server = true,
                "-c" | "--config" => {
                    let Some(path) = raw.next() else {
                        bail!("{arg} requires a path");
                    };
                    args.config = Some(PathBuf::from(path));
                }
                "--bind" => {
                    let Some(addr) = raw.next() else {
                        bail!("--bind requires an address");
                    };
                    let addr = addr
                        .parse()
                        .with_context(|| format!("Invalid bind address: {addr}"))?;
                    args.bind = Some(addr);
                }
                other => bail!("Unknown option: {other}"),
            }
        }
        Ok(Some(args))
    }

    /// Apply command-line overrides on top of the file configuration.
    pub fn apply(&self, config: &mut DaemonConfig) {
        if self.simulated {
            config.simulated = true;
        }
        if let Some(addr) = self.bind {
            config.server.config.bind_addr = addr;
        }
        if self.no_console {
            config.console = false;
        }
        if self.no_server {
            config.server.enabled = false;
        }
    }
}

pub const USAGE: &str = "\
Usage: controld [OPTIONS]

Options:
  -c, --config <PATH>  JSON configuration file
  -s, --simulated      Use simulated registers instead of the memory device
      --bind <ADDR>    Command server address (default: 127.0.0.1:5000)
      --no-console     Do not read commands from standard input
      --no-server      Do not start the command server
  -v, --verbose        Debug logging (RUST_LOG takes precedence)
  -h, --help           Show this help";
