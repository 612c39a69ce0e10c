//! The aggregate that owns every control object.
//!
//! A [`Board`] is built once at startup from a [`BoardConfig`]. The backend
//! [`Mode`] in the config is applied to every register block the board
//! opens and cannot change afterwards.
//!
//! # Construction failures
//!
//! An object that fails to come up (memory device missing, bad pin in the
//! config) is logged and left out of its registry. Requests addressed to it
//! then fail with `PARAM_OUT_OF_RANGE` like any unknown id, instead of
//! bringing the daemon down.
//!
//! # Examples
//!
//! ```
//! use controld_core::{ControlId, Mode};
//! use controld_hardware::board::{Board, BoardConfig};
//!
//! let config = BoardConfig {
//!     mode: Mode::Simulated,
//!     ..BoardConfig::default()
//! };
//! let board = Board::new(&config).unwrap();
//!
//! assert_eq!(board.gpio().len(), 4);
//! assert_eq!(board.leds().len(), 4);
//! assert!(board.gpio().get(ControlId::new(1)).is_some());
//! ```

use crate::control::{Registry, Shared, lock, share};
use crate::error::Result;
use crate::gpio::{AM335X_GPIO_BASES, Gpio};
use crate::gps::{Gps, GpsConfig, GpsSource, SerialGps, SimulatedGps};
use crate::heartbeat::{Heartbeat, HeartbeatConfig};
use crate::led::Led;
use crate::mail::{LogTransport, MailClient, MailSettings, MailTransport};
use crate::system::SystemInfo;
use controld_core::constants::{
    DEFAULT_HEARTBEAT_INTERVAL_MS, MAX_HEARTBEAT_INTERVAL_MS, MIN_HEARTBEAT_INTERVAL_MS,
};
use controld_core::{ControlId, Mode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Default physical memory device.
pub const DEFAULT_MEMORY_DEVICE: &str = "/dev/mem";

/// One GPIO bank to bring up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioBankConfig {
    pub id: u8,
    pub base: u64,
}

/// One LED and the pin it is wired to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedConfig {
    pub id: u8,
    pub bank: u8,
    pub pin: u8,
}

/// Hardware layout and backend selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Register backend for the whole process.
    pub mode: Mode,

    /// Device used for real register access.
    pub memory_device: PathBuf,

    pub gpio: Vec<GpioBankConfig>,

    pub leds: Vec<LedConfig>,

    pub heartbeat: HeartbeatConfig,

    /// Mail settings committed at startup.
    pub mail: MailSettings,

    pub gps: GpsConfig,
}

impl Default for BoardConfig {
    /// BeagleBone Black layout: four GPIO banks, user LEDs on bank 1 pins 21-24.
    fn default() -> Self {
        Self {
            mode: Mode::Real,
            memory_device: PathBuf::from(DEFAULT_MEMORY_DEVICE),
            gpio: AM335X_GPIO_BASES
                .iter()
                .enumerate()
                .map(|(id, base)| GpioBankConfig {
                    id: id as u8,
                    base: *base,
                })
                .collect(),
            leds: (0..4)
                .map(|id| LedConfig {
                    id,
                    bank: 1,
                    pin: 21 + id,
                })
                .collect(),
            heartbeat: HeartbeatConfig::default(),
            mail: MailSettings::default(),
            gps: GpsConfig::default(),
        }
    }
}

/// Summary of what came up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardStats {
    pub mode: Mode,
    pub gpio_banks: usize,
    pub leds: usize,
}

/// Owner of every control object for the process lifetime.
#[derive(Debug)]
pub struct Board {
    mode: Mode,
    gpio: Arc<Registry<Gpio>>,
    leds: Arc<Registry<Led>>,
    heartbeat: Shared<Heartbeat>,
    system: Shared<SystemInfo>,
    mail: Shared<MailClient>,
    gps: Shared<Gps>,
}

impl Board {
    /// Bring up the board with the logging mail transport.
    ///
    /// # Errors
    ///
    /// Only fails if a freshly created LED lock is already poisoned; missing
    /// banks and LEDs are skipped instead.
    pub fn new(config: &BoardConfig) -> Result<Self> {
        Self::with_transport(config, Box::new(LogTransport))
    }

    /// Bring up the board with a custom mail transport.
    ///
    /// # Errors
    ///
    /// See [`Board::new`].
    pub fn with_transport(
        config: &BoardConfig,
        transport: Box<dyn MailTransport>,
    ) -> Result<Self> {
        let gps: Box<dyn GpsSource> = match config.mode {
            Mode::Real => Box::new(SerialGps::new(&config.gps.device, config.gps.baud)),
            Mode::Simulated => Box::new(SimulatedGps::new(config.gps.simulated)),
        };
        Self::with_devices(config, transport, gps)
    }

    /// Bring up the board with a custom mail transport and GPS source.
    ///
    /// # Errors
    ///
    /// See [`Board::new`].
    pub fn with_devices(
        config: &BoardConfig,
        transport: Box<dyn MailTransport>,
        gps: Box<dyn GpsSource>,
    ) -> Result<Self> {
        let mode = config.mode;
        info!(mode = %mode, "bringing up board");

        let mut gpio = Registry::new();
        for bank in &config.gpio {
            let id = ControlId::new(bank.id);
            match Gpio::open(id, bank.base, mode, &config.memory_device) {
                Ok(object) => {
                    if gpio.insert(object).1.is_some() {
                        warn!(gpio = %id, "duplicate GPIO bank id, keeping the last one");
                    }
                }
                Err(e) => warn!(gpio = %id, error = %e, "GPIO bank unavailable"),
            }
        }

        let mut leds = Registry::new();
        for led in &config.leds {
            let id = ControlId::new(led.id);
            match Self::bring_up_led(&gpio, led) {
                Ok(Some(object)) => {
                    leds.insert(object);
                }
                Ok(None) => warn!(led = %id, bank = led.bank, "LED bank not registered"),
                Err(e) => warn!(led = %id, error = %e, "LED unavailable"),
            }
        }

        let heartbeat_led = config
            .heartbeat
            .led
            .and_then(|id| leds.get(ControlId::new(id)));
        let mut heartbeat_config = config.heartbeat.clone();
        if !(MIN_HEARTBEAT_INTERVAL_MS..=MAX_HEARTBEAT_INTERVAL_MS)
            .contains(&heartbeat_config.interval_ms)
        {
            warn!(
                interval_ms = heartbeat_config.interval_ms,
                "heartbeat interval out of range, using default"
            );
            heartbeat_config.interval_ms = DEFAULT_HEARTBEAT_INTERVAL_MS;
        }
        let heartbeat = Heartbeat::new(&heartbeat_config, heartbeat_led)?;

        let board = Self {
            mode,
            gpio: Arc::new(gpio),
            leds: Arc::new(leds),
            heartbeat: share(heartbeat),
            system: share(SystemInfo::new(mode)),
            mail: share(MailClient::new(config.mail.clone(), transport)),
            gps: share(Gps::new(&config.gps.device, gps)),
        };

        let stats = board.stats();
        info!(
            mode = %stats.mode,
            gpio_banks = stats.gpio_banks,
            leds = stats.leds,
            "board ready"
        );
        Ok(board)
    }

    fn bring_up_led(gpio: &Registry<Gpio>, config: &LedConfig) -> Result<Option<Led>> {
        let Some(bank) = gpio.get(ControlId::new(config.bank)) else {
            return Ok(None);
        };
        Led::new(ControlId::new(config.id), bank, config.pin).map(Some)
    }

    /// Backend mode every register block was opened with.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn gpio(&self) -> &Arc<Registry<Gpio>> {
        &self.gpio
    }

    pub fn leds(&self) -> &Arc<Registry<Led>> {
        &self.leds
    }

    pub fn heartbeat(&self) -> &Shared<Heartbeat> {
        &self.heartbeat
    }

    pub fn system(&self) -> &Shared<SystemInfo> {
        &self.system
    }

    pub fn mail(&self) -> &Shared<MailClient> {
        &self.mail
    }

    pub fn gps(&self) -> &Shared<Gps> {
        &self.gps
    }

    /// Run one heartbeat beat.
    pub fn heartbeat_tick(&self) -> Result<()> {
        lock(&self.heartbeat)?.beat()
    }

    pub fn stats(&self) -> BoardStats {
        BoardStats {
            mode: self.mode,
            gpio_banks: self.gpio.len(),
            leds: self.leds.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Control;
    use std::path::Path;

    fn simulated() -> BoardConfig {
        BoardConfig {
            mode: Mode::Simulated,
            ..BoardConfig::default()
        }
    }

    #[test]
    fn test_default_layout() {
        let config = BoardConfig::default();
        assert_eq!(config.mode, Mode::Real);
        assert_eq!(config.gpio.len(), 4);
        assert_eq!(config.gpio[1].base, 0x4804_C000);
        assert_eq!(config.leds[0], LedConfig { id: 0, bank: 1, pin: 21 });
        assert_eq!(config.leds[3].pin, 24);
    }

    #[test]
    fn test_simulated_board() {
        let board = Board::new(&simulated()).unwrap();
        let stats = board.stats();
        assert_eq!(stats.mode, Mode::Simulated);
        assert_eq!(stats.gpio_banks, 4);
        assert_eq!(stats.leds, 4);
        assert_eq!(lock(board.system()).unwrap().mode(), Mode::Simulated);
        assert!(!lock(board.gps()).unwrap().read().unwrap().fix);
    }

    #[test]
    fn test_real_board_gps_needs_its_device() {
        let config = BoardConfig {
            memory_device: PathBuf::from("/nonexistent/controld-mem"),
            gps: GpsConfig {
                device: PathBuf::from("/nonexistent/ttyS1"),
                ..GpsConfig::default()
            },
            ..BoardConfig::default()
        };
        let board = Board::new(&config).unwrap();
        let gps = lock(board.gps()).unwrap();
        assert!(gps.read().is_err());
        assert_eq!(gps.device(), Path::new("/nonexistent/ttyS1"));
    }

    #[test]
    fn test_real_board_without_device_registers_nothing() {
        let config = BoardConfig {
            memory_device: PathBuf::from("/nonexistent/controld-mem"),
            ..BoardConfig::default()
        };
        let board = Board::new(&config).unwrap();
        assert!(board.gpio().is_empty());
        assert!(board.leds().is_empty());
        assert_eq!(lock(board.heartbeat()).unwrap().led(), None);
    }

    #[test]
    fn test_led_on_missing_bank_skipped() {
        let config = BoardConfig {
            leds: vec![
                LedConfig { id: 0, bank: 1, pin: 21 },
                LedConfig { id: 1, bank: 9, pin: 0 },
                LedConfig { id: 2, bank: 1, pin: 40 },
            ],
            ..simulated()
        };
        let board = Board::new(&config).unwrap();
        assert_eq!(board.leds().ids(), vec![ControlId::new(0)]);
    }

    #[test]
    fn test_heartbeat_tick_toggles_led() {
        let board = Board::new(&simulated()).unwrap();
        board.heartbeat_tick().unwrap();

        let led = board.leds().get(ControlId::new(0)).unwrap();
        assert!(lock(&led).unwrap().is_enabled().unwrap());
        assert_eq!(lock(board.heartbeat()).unwrap().beats(), 1);
    }

    #[test]
    fn test_invalid_heartbeat_interval_falls_back() {
        let config = BoardConfig {
            heartbeat: HeartbeatConfig {
                interval_ms: 1,
                ..HeartbeatConfig::default()
            },
            ..simulated()
        };
        let board = Board::new(&config).unwrap();
        let heartbeat = lock(board.heartbeat()).unwrap();
        assert_eq!(heartbeat.interval().as_millis(), 1000);
        assert_eq!(heartbeat.id(), ControlId::new(0));
    }

    #[test]
    fn test_config_deserializes_partial() {
        let config: BoardConfig = serde_json::from_str(r#"{"mode": "simulated"}"#).unwrap();
        assert_eq!(config.mode, Mode::Simulated);
        assert_eq!(config.gpio.len(), 4);
    }
}
