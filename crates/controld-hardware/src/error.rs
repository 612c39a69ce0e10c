//! Error types for hardware operations.
//!
//! This module defines error types specific to register access and control
//! object construction: memory device failures, out-of-block offsets, lock
//! poisoning and configuration problems. Command callbacks convert them into
//! the wire-level [`controld_core::Error`] through the `From` impl below.

use controld_core::ErrorCode;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The physical memory device could not be opened.
    #[error("Failed to map {device}: {message}")]
    MapFailed { device: String, message: String },

    /// Register offset lies outside the mapped block.
    #[error("Register offset {offset:#x} outside block of {len:#x} bytes")]
    OutOfBounds { offset: usize, len: usize },

    /// Register offset is not word aligned.
    #[error("Register offset {offset:#x} is not word aligned")]
    Misaligned { offset: usize },

    /// Argument outside the range the peripheral accepts.
    #[error("Out of range: {message}")]
    OutOfRange { message: String },

    /// Bit-field layout does not fit in a register word.
    #[error("Invalid field: offset {offset}, width {width}")]
    InvalidField { offset: u8, width: u8 },

    /// A control object's lock was poisoned by a panicking holder.
    #[error("Lock poisoned: {object}")]
    LockPoisoned { object: String },

    /// Device configuration error.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Outbound delivery failed.
    #[error("Delivery failed: {message}")]
    DeliveryFailed { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new map failure.
    pub fn map_failed(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MapFailed {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create a new out-of-range error.
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange {
            message: message.into(),
        }
    }

    /// Create a new lock poisoned error.
    pub fn lock_poisoned(object: impl Into<String>) -> Self {
        Self::LockPoisoned {
            object: object.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a new delivery error.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            message: message.into(),
        }
    }

    /// Wire code a command reports for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::OutOfRange { .. } => ErrorCode::ParamOutOfRange,
            _ => ErrorCode::CmdFailed,
        }
    }
}

impl From<HardwareError> for controld_core::Error {
    fn from(error: HardwareError) -> Self {
        controld_core::Error::new(error.code(), error.to_string())
    }
}
