use crate::{
    constants::{DIRECTION_INPUT, DIRECTION_OUTPUT},
    error::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a control object, unique within its concrete type.
///
/// GPIO banks are numbered 0-3 and LEDs 0-3 on the reference board, so the
/// id space is deliberately small.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ControlId(u8);

impl ControlId {
    /// Create a control id.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        ControlId(id)
    }

    /// Get the raw id as u8.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for ControlId {
    fn from(id: u8) -> Self {
        ControlId(id)
    }
}

impl TryFrom<u64> for ControlId {
    type Error = Error;

    fn try_from(id: u64) -> Result<Self> {
        u8::try_from(id)
            .map(ControlId)
            .map_err(|_| Error::out_of_range(format!("Control id {id} out of range")))
    }
}

impl std::str::FromStr for ControlId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: u8 = s
            .parse()
            .map_err(|_| Error::syntax(format!("Invalid control id: {s}")))?;
        Ok(ControlId(id))
    }
}

/// Backend selection for register access, fixed for the whole process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Physical memory-mapped registers.
    #[default]
    Real,
    /// In-process byte buffers standing in for registers.
    Simulated,
}

impl Mode {
    /// Build the mode from a `--simulated` style flag.
    #[must_use]
    pub fn from_simulated(simulated: bool) -> Self {
        if simulated { Mode::Simulated } else { Mode::Real }
    }

    #[must_use]
    pub fn is_simulated(self) -> bool {
        self == Mode::Simulated
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::Real => write!(f, "real"),
            Mode::Simulated => write!(f, "simulated"),
        }
    }
}

/// Pad direction of a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// Wire spelling of the direction.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Input => DIRECTION_INPUT,
            Direction::Output => DIRECTION_OUTPUT,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = Error;

    /// Exact, case-sensitive match against the direction vocabulary.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            DIRECTION_INPUT => Ok(Direction::Input),
            DIRECTION_OUTPUT => Ok(Direction::Output),
            other => Err(Error::out_of_range(format!("Unknown direction: {other}"))),
        }
    }
}
