//! GPS receiver.
//!
//! The receiver hangs off a serial port (`/dev/ttyS1` on the reference
//! board). Position data comes from a [`GpsSource`]; the [`Gps`] control
//! object only owns the source and the device it was configured with.
//!
//! ```
//! use controld_hardware::gps::{Gps, GpsFix, SimulatedGps};
//!
//! let fix = GpsFix {
//!     fix: true,
//!     latitude: 45.4642,
//!     longitude: 9.19,
//!     satellites: 7,
//! };
//! let gps = Gps::new("/dev/ttyS1", Box::new(SimulatedGps::new(fix)));
//!
//! assert_eq!(gps.read().unwrap(), fix);
//! ```

use crate::control::Control;
use crate::error::{HardwareError, Result};
use controld_core::ControlId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::trace;

/// Default serial device of the receiver.
pub const DEFAULT_GPS_DEVICE: &str = "/dev/ttyS1";

/// Default line speed of the receiver.
pub const DEFAULT_GPS_BAUD: u32 = 9600;

const SERIAL_TIMEOUT: Duration = Duration::from_millis(100);

/// One position reading.
///
/// Coordinates are decimal degrees, north and east positive. Without a fix
/// they carry no meaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsFix {
    pub fix: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub satellites: u8,
}

/// Receiver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    /// Serial device the receiver is attached to.
    pub device: PathBuf,

    pub baud: u32,

    /// Reading reported by the simulated receiver.
    pub simulated: GpsFix,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_GPS_DEVICE),
            baud: DEFAULT_GPS_BAUD,
            simulated: GpsFix::default(),
        }
    }
}

/// Where readings come from.
pub trait GpsSource: Send + std::fmt::Debug {
    /// Latest reading.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::ConfigurationError`] if the receiver cannot
    /// be reached.
    fn read(&self) -> Result<GpsFix>;
}

/// Source that always reports the reading it was built with.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGps {
    fix: GpsFix,
}

impl SimulatedGps {
    pub fn new(fix: GpsFix) -> Self {
        Self { fix }
    }
}

impl GpsSource for SimulatedGps {
    fn read(&self) -> Result<GpsFix> {
        Ok(self.fix)
    }
}

/// Receiver on a serial device.
///
/// Sentence decoding is not wired up: a port that opens reports no fix, one
/// that does not is an error.
#[derive(Debug, Clone)]
pub struct SerialGps {
    device: PathBuf,
    baud: u32,
}

impl SerialGps {
    pub fn new(device: impl Into<PathBuf>, baud: u32) -> Self {
        Self {
            device: device.into(),
            baud,
        }
    }
}

impl GpsSource for SerialGps {
    fn read(&self) -> Result<GpsFix> {
        serialport::new(self.device.to_string_lossy(), self.baud)
            .timeout(SERIAL_TIMEOUT)
            .open()
            .map_err(|e| {
                HardwareError::configuration(format!(
                    "GPS device {}: {e}",
                    self.device.display()
                ))
            })?;
        Ok(GpsFix::default())
    }
}

/// GPS control object.
#[derive(Debug)]
pub struct Gps {
    id: ControlId,
    device: PathBuf,
    source: Box<dyn GpsSource>,
}

impl Gps {
    pub fn new(device: impl Into<PathBuf>, source: Box<dyn GpsSource>) -> Self {
        Self {
            id: ControlId::new(0),
            device: device.into(),
            source,
        }
    }

    /// Take a reading from the source.
    pub fn read(&self) -> Result<GpsFix> {
        let fix = self.source.read()?;
        trace!(fix = fix.fix, satellites = fix.satellites, "gps reading");
        Ok(fix)
    }

    pub fn device(&self) -> &Path {
        &self.device
    }
}

impl Control for Gps {
    const KIND: &'static str = "gps";

    fn id(&self) -> ControlId {
        self.id
    }
}
