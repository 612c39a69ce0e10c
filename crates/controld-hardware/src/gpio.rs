//! AM335x GPIO bank.
//!
//! Each bank drives 32 pins through four registers: `OE` selects the pad
//! direction (bit set = input), `DATAOUT` holds the driven level, `DATAIN`
//! samples the pad and `REVISION` identifies the IP block.

use crate::control::Control;
use crate::error::{HardwareError, Result};
use crate::register::{Field, RegisterBlock};
use controld_core::{ControlId, Direction, Mode};
use std::path::Path;
use tracing::info;

/// Size of one GPIO register block.
pub const GPIO_BLOCK_SIZE: usize = 0x1000;

/// Pins per bank.
pub const GPIO_PIN_COUNT: u8 = 32;

/// Physical base addresses of banks 0-3.
pub const AM335X_GPIO_BASES: [u64; 4] = [0x44E0_7000, 0x4804_C000, 0x481A_C000, 0x481A_E000];

/// Register offsets within a bank.
pub mod regs {
    pub const REVISION: usize = 0x000;
    pub const OE: usize = 0x134;
    pub const DATAIN: usize = 0x138;
    pub const DATAOUT: usize = 0x13C;
}

const REVISION_MINOR: Field = Field::new(0, 6);
const REVISION_MAJOR: Field = Field::new(8, 3);

/// One GPIO bank.
#[derive(Debug)]
pub struct Gpio {
    id: ControlId,
    registers: RegisterBlock,
}

impl Gpio {
    /// Wrap an already opened register block.
    ///
    /// # Errors
    ///
    /// Returns an error if the revision register cannot be read.
    pub fn new(id: ControlId, registers: RegisterBlock) -> Result<Self> {
        let revision = registers.read(regs::REVISION)?;
        info!(
            gpio = %id,
            mode = %registers.mode(),
            major = REVISION_MAJOR.read_from(revision),
            minor = REVISION_MINOR.read_from(revision),
            "GPIO bank ready"
        );
        Ok(Self { id, registers })
    }

    /// Open the bank at `base` in the given mode.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::MapFailed`] if the memory device cannot be
    /// opened in real mode.
    pub fn open(id: ControlId, base: u64, mode: Mode, device: &Path) -> Result<Self> {
        Self::new(id, RegisterBlock::open(base, GPIO_BLOCK_SIZE, mode, device)?)
    }

    fn check_pin(pin: u8) -> Result<u8> {
        if pin >= GPIO_PIN_COUNT {
            return Err(HardwareError::out_of_range(format!(
                "pin {pin} not in 0-{}",
                GPIO_PIN_COUNT - 1
            )));
        }
        Ok(pin)
    }

    /// Drive a pin high or low.
    pub fn set_output(&mut self, pin: u8, high: bool) -> Result<()> {
        let pin = Self::check_pin(pin)?;
        self.registers.write_bit(regs::DATAOUT, pin, high)
    }

    /// Level currently driven on a pin.
    pub fn output(&self, pin: u8) -> Result<bool> {
        let pin = Self::check_pin(pin)?;
        self.registers.read_bit(regs::DATAOUT, pin)
    }

    /// Driven levels of the whole bank.
    pub fn outputs(&self) -> Result<u32> {
        self.registers.read(regs::DATAOUT)
    }

    /// Sampled level of a pin.
    pub fn input(&self, pin: u8) -> Result<bool> {
        let pin = Self::check_pin(pin)?;
        self.registers.read_bit(regs::DATAIN, pin)
    }

    /// Sampled levels of the whole bank.
    pub fn inputs(&self) -> Result<u32> {
        self.registers.read(regs::DATAIN)
    }

    /// Configure the pad direction of a pin.
    pub fn set_direction(&mut self, pin: u8, direction: Direction) -> Result<()> {
        let pin = Self::check_pin(pin)?;
        self.registers
            .write_bit(regs::OE, pin, direction == Direction::Input)
    }

    /// Configured pad direction of a pin.
    pub fn direction(&self, pin: u8) -> Result<Direction> {
        let pin = Self::check_pin(pin)?;
        if self.registers.read_bit(regs::OE, pin)? {
            Ok(Direction::Input)
        } else {
            Ok(Direction::Output)
        }
    }

    pub fn registers(&self) -> &RegisterBlock {
        &self.registers
    }

    /// Raw register access, e.g. to inject input levels in simulation.
    pub fn registers_mut(&mut self) -> &mut RegisterBlock {
        &mut self.registers
    }
}

impl Control for Gpio {
    const KIND: &'static str = "gpio";

    fn id(&self) -> ControlId {
        self.id
    }
}
