//! Register-level hardware access for the controld daemon.
//!
//! This crate owns everything that touches the board: memory-mapped register
//! blocks, the GPIO banks built on them, the LEDs wired to GPIO pins and the
//! non-register control objects (heartbeat, system information, mail, GPS).
//!
//! # Backends
//!
//! Every [`RegisterBlock`] is opened in one of two [`Mode`]s, chosen once per
//! process:
//!
//! - **Real**: the block's physical range is mapped from the memory device
//!   (`/dev/mem` by default) and accessed with volatile 32-bit loads/stores.
//! - **Simulated**: each block is backed by a zeroed in-memory mirror, so the
//!   daemon runs on any host with identical observable register behavior.
//!
//! ```
//! use controld_hardware::register::{Field, RegisterBlock};
//!
//! let mut block = RegisterBlock::simulated(0x4804_C000, 0x1000);
//! block.write_field(0x13C, Field::new(21, 4), 0b1010).unwrap();
//!
//! assert_eq!(block.read(0x13C).unwrap(), 0b1010 << 21);
//! assert!(block.read_bit(0x13C, 22).unwrap());
//! ```
//!
//! # Concurrency
//!
//! Control objects are handed out as [`Shared`] handles. The mutex inside is
//! the object's exclusive lock: one command, or one heartbeat beat, holds it
//! for the whole of its hardware access. When two locks are needed they are
//! always taken heartbeat, then LED, then GPIO bank.
//!
//! # Error Handling
//!
//! Operations return [`Result<T>`][error::Result] with a [`HardwareError`],
//! which converts into the wire-level [`controld_core::Error`] with the
//! matching error code.
//!
//! [`Mode`]: controld_core::Mode

pub mod board;
pub mod control;
pub mod error;
pub mod gpio;
pub mod gps;
pub mod heartbeat;
pub mod led;
pub mod mail;
pub mod register;
pub mod system;

// Re-export commonly used types for convenience
pub use board::{Board, BoardConfig, BoardStats, GpioBankConfig, LedConfig};
pub use control::{Control, Registry, Shared, lock, share};
pub use error::{HardwareError, Result};
pub use gpio::Gpio;
pub use gps::{Gps, GpsConfig, GpsFix, GpsSource, SerialGps, SimulatedGps};
pub use heartbeat::{Heartbeat, HeartbeatConfig};
pub use led::Led;
pub use mail::{LogTransport, MailClient, MailMessage, MailSettings, MailTransport};
pub use register::{Field, RegisterBlock};
pub use system::SystemInfo;
