//! Register access over real or simulated memory.
//!
//! A [`RegisterBlock`] is a window of 32-bit little-endian registers starting
//! at a physical base address. Its backend is chosen once, from the process
//! [`Mode`], when the block is opened:
//!
//! - [`Mode::Real`] maps `[base, base + len)` of the physical memory device
//!   (normally `/dev/mem`) and accesses each register with a volatile 32-bit
//!   load or store. Nothing is cached and writes are never coalesced.
//! - [`Mode::Simulated`] keeps a zero-initialised byte buffer per block and
//!   stores exactly what was written. No device side effects are emulated.
//!
//! Field accessors always do read, mask/shift, write-back of the full word,
//! so bits outside the field are preserved in either mode.
//!
//! ```
//! use controld_core::Mode;
//! use controld_hardware::register::{Field, RegisterBlock};
//!
//! let mut block = RegisterBlock::simulated(0x4804_C000, 0x1000);
//! let field = Field::new(4, 4);
//!
//! block.write(0x13C, 0xFFFF_FFFF).unwrap();
//! block.write_field(0x13C, field, 0x3).unwrap();
//!
//! assert_eq!(block.read(0x13C).unwrap(), 0xFFFF_FF3F);
//! assert_eq!(block.mode(), Mode::Simulated);
//! ```

use crate::error::{HardwareError, Result};
use controld_core::Mode;
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::path::Path;
use std::ptr;

/// Register width in bytes.
pub const WORD_SIZE: usize = 4;

/// Register width in bits.
pub const WORD_BITS: u8 = 32;

/// A contiguous bit-field within a register word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    offset: u8,
    width: u8,
}

impl Field {
    /// Define a field at compile time.
    ///
    /// # Panics
    ///
    /// Panics if the field is empty or does not fit in a 32-bit word. Meant
    /// for `const` register layouts, where the check runs at compile time.
    #[must_use]
    pub const fn new(offset: u8, width: u8) -> Self {
        assert!(width > 0, "field width must be non-zero");
        assert!(
            offset as u16 + width as u16 <= WORD_BITS as u16,
            "field must fit in a register word"
        );
        Self { offset, width }
    }

    /// Define a field from runtime values.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InvalidField`] if the field is empty or does
    /// not fit in a word.
    pub fn checked(offset: u8, width: u8) -> Result<Self> {
        if width == 0 || offset as u16 + width as u16 > WORD_BITS as u16 {
            return Err(HardwareError::InvalidField { offset, width });
        }
        Ok(Self { offset, width })
    }

    /// Single-bit field, e.g. one GPIO pin.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::OutOfRange`] if `bit` is not below 32.
    pub fn bit(bit: u8) -> Result<Self> {
        if bit >= WORD_BITS {
            return Err(HardwareError::out_of_range(format!(
                "bit {bit} outside {WORD_BITS}-bit register"
            )));
        }
        Ok(Self { offset: bit, width: 1 })
    }

    #[must_use]
    pub fn offset(&self) -> u8 {
        self.offset
    }

    #[must_use]
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Right-aligned mask covering the field width.
    #[inline(always)]
    #[must_use]
    pub fn mask(&self) -> u32 {
        if self.width >= WORD_BITS {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// Extract the field from a register word.
    #[inline(always)]
    #[must_use]
    pub fn read_from(&self, word: u32) -> u32 {
        (word >> self.offset) & self.mask()
    }

    /// Inject `value` into `word`, leaving every other bit untouched.
    ///
    /// Bits of `value` beyond the field width are discarded.
    #[inline(always)]
    #[must_use]
    pub fn write_to(&self, word: u32, value: u32) -> u32 {
        let cleared = word & !(self.mask() << self.offset);
        let shifted = (value & self.mask()) << self.offset;
        cleared | shifted
    }
}

/// Storage behind a register block.
#[derive(Debug)]
enum Backend {
    /// Per-block byte mirror.
    Simulated(Vec<u8>),
    /// Shared mapping of the memory device starting at `base`.
    Mapped(MmapMut),
}

/// A block of memory-mapped registers.
#[derive(Debug)]
pub struct RegisterBlock {
    base: u64,
    len: usize,
    mode: Mode,
    backend: Backend,
}

impl RegisterBlock {
    /// Open a block in the given mode.
    ///
    /// `device` is only consulted in [`Mode::Real`].
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::MapFailed`] if the memory device cannot be
    /// opened for reading and writing.
    pub fn open(base: u64, len: usize, mode: Mode, device: &Path) -> Result<Self> {
        match mode {
            Mode::Simulated => Ok(Self::simulated(base, len)),
            Mode::Real => Self::mapped(base, len, device),
        }
    }

    /// Zero-initialised in-memory block.
    #[must_use]
    pub fn simulated(base: u64, len: usize) -> Self {
        Self {
            base,
            len,
            mode: Mode::Simulated,
            backend: Backend::Simulated(vec![0; len]),
        }
    }

    /// Block backed by a mapping of a physical memory device.
    ///
    /// `base` need not be page aligned, but it must be word aligned.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Misaligned`] for a base that is not word
    /// aligned and [`HardwareError::MapFailed`] if the device cannot be
    /// opened or mapped.
    pub fn mapped(base: u64, len: usize, device: &Path) -> Result<Self> {
        if base % WORD_SIZE as u64 != 0 {
            return Err(HardwareError::Misaligned {
                offset: base as usize,
            });
        }
        let map_failed =
            |e: std::io::Error| HardwareError::map_failed(device.display().to_string(), e.to_string());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(device)
            .map_err(map_failed)?;

        // SAFETY: the mapping is owned by this block and only touched through
        // bounds-checked, word-aligned volatile accesses. No reference into
        // it is handed out, so concurrent device-side changes are fine.
        let map = unsafe { MmapOptions::new().offset(base).len(len).map_mut(&file) }
            .map_err(map_failed)?;

        Ok(Self {
            base,
            len,
            mode: Mode::Real,
            backend: Backend::Mapped(map),
        })
    }

    /// Physical base address.
    #[must_use]
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Block length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn check(&self, offset: usize) -> Result<()> {
        if offset % WORD_SIZE != 0 {
            return Err(HardwareError::Misaligned { offset });
        }
        if offset.checked_add(WORD_SIZE).is_none_or(|end| end > self.len) {
            return Err(HardwareError::OutOfBounds {
                offset,
                len: self.len,
            });
        }
        Ok(())
    }

    /// Read a full register word.
    ///
    /// # Errors
    ///
    /// Returns an error for misaligned or out-of-block offsets.
    pub fn read(&self, offset: usize) -> Result<u32> {
        self.check(offset)?;
        let word = match &self.backend {
            Backend::Simulated(buffer) => {
                let mut bytes = [0u8; WORD_SIZE];
                bytes.copy_from_slice(&buffer[offset..offset + WORD_SIZE]);
                u32::from_le_bytes(bytes)
            }
            // SAFETY: `check` keeps `offset..offset + 4` inside the mapping,
            // and base and offset are both word aligned.
            Backend::Mapped(map) => u32::from_le(unsafe {
                ptr::read_volatile(map.as_ptr().add(offset).cast::<u32>())
            }),
        };
        Ok(word)
    }

    /// Write a full register word.
    ///
    /// # Errors
    ///
    /// Returns an error for misaligned or out-of-block offsets.
    pub fn write(&mut self, offset: usize, value: u32) -> Result<()> {
        self.check(offset)?;
        match &mut self.backend {
            Backend::Simulated(buffer) => {
                buffer[offset..offset + WORD_SIZE].copy_from_slice(&value.to_le_bytes());
            }
            // SAFETY: as in `read`.
            Backend::Mapped(map) => unsafe {
                ptr::write_volatile(map.as_mut_ptr().add(offset).cast::<u32>(), value.to_le());
            },
        }
        Ok(())
    }

    /// Read one field of a register.
    ///
    /// # Errors
    ///
    /// Same as [`RegisterBlock::read`].
    pub fn read_field(&self, offset: usize, field: Field) -> Result<u32> {
        Ok(field.read_from(self.read(offset)?))
    }

    /// Read-modify-write one field of a register.
    ///
    /// # Errors
    ///
    /// Same as [`RegisterBlock::write`].
    pub fn write_field(&mut self, offset: usize, field: Field, value: u32) -> Result<()> {
        let word = self.read(offset)?;
        self.write(offset, field.write_to(word, value))
    }

    /// Read a single bit.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::OutOfRange`] for `bit >= 32`, otherwise the
    /// same as [`RegisterBlock::read`].
    pub fn read_bit(&self, offset: usize, bit: u8) -> Result<bool> {
        Ok(self.read_field(offset, Field::bit(bit)?)? != 0)
    }

    /// Set or clear a single bit.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::OutOfRange`] for `bit >= 32`, otherwise the
    /// same as [`RegisterBlock::write`].
    pub fn write_bit(&mut self, offset: usize, bit: u8, set: bool) -> Result<()> {
        self.write_field(offset, Field::bit(bit)?, u32::from(set))
    }
}
