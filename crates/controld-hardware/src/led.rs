//! LEDs wired to GPIO pins.
//!
//! An LED does not own registers; it borrows one pin of a shared GPIO bank.
//! Lock order is always LED first, then the bank.

use crate::control::{Control, Shared, lock};
use crate::error::Result;
use crate::gpio::Gpio;
use controld_core::{ControlId, Direction};

/// An LED driven by one GPIO pin (active high).
#[derive(Debug)]
pub struct Led {
    id: ControlId,
    gpio: Shared<Gpio>,
    bank: ControlId,
    pin: u8,
}

impl Led {
    /// Bind an LED to `pin` of `gpio` and configure the pin as output.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin is out of range or the bank lock is
    /// poisoned.
    pub fn new(id: ControlId, gpio: Shared<Gpio>, pin: u8) -> Result<Self> {
        let bank = {
            let mut bank = lock(&gpio)?;
            bank.set_direction(pin, Direction::Output)?;
            bank.id()
        };
        Ok(Self {
            id,
            gpio,
            bank,
            pin,
        })
    }

    /// Switch the LED on or off.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        lock(&self.gpio)?.set_output(self.pin, enabled)
    }

    /// Whether the LED is currently driven on.
    pub fn is_enabled(&self) -> Result<bool> {
        lock(&self.gpio)?.output(self.pin)
    }

    /// Invert the LED under a single bank lock and return the new state.
    pub fn toggle(&mut self) -> Result<bool> {
        let mut gpio = lock(&self.gpio)?;
        let enabled = !gpio.output(self.pin)?;
        gpio.set_output(self.pin, enabled)?;
        Ok(enabled)
    }

    /// Id of the GPIO bank the LED is wired to.
    pub fn bank(&self) -> ControlId {
        self.bank
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }
}

impl Control for Led {
    const KIND: &'static str = "led";

    fn id(&self) -> ControlId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::share;
    use crate::gpio::{GPIO_BLOCK_SIZE, regs};
    use crate::register::RegisterBlock;

    fn bank() -> Shared<Gpio> {
        let mut registers = RegisterBlock::simulated(0, GPIO_BLOCK_SIZE);
        // Every pad starts as input, like the SoC after reset
        registers.write(regs::OE, u32::MAX).unwrap();
        share(Gpio::new(ControlId::new(1), registers).unwrap())
    }

    #[test]
    fn test_new_configures_output() {
        let gpio = bank();
        let led = Led::new(ControlId::new(0), gpio.clone(), 21).unwrap();
        assert_eq!(
            lock(&gpio).unwrap().direction(21).unwrap(),
            Direction::Output
        );
        assert_eq!(led.bank(), ControlId::new(1));
        assert_eq!(led.pin(), 21);
    }

    #[test]
    fn test_enable_drives_pin() {
        let gpio = bank();
        let mut led = Led::new(ControlId::new(0), gpio.clone(), 22).unwrap();

        led.set_enabled(true).unwrap();
        assert!(led.is_enabled().unwrap());
        assert!(lock(&gpio).unwrap().output(22).unwrap());

        led.set_enabled(false).unwrap();
        assert!(!led.is_enabled().unwrap());
    }

    #[test]
    fn test_toggle() {
        let gpio = bank();
        let mut led = Led::new(ControlId::new(0), gpio, 23).unwrap();
        assert!(led.toggle().unwrap());
        assert!(!led.toggle().unwrap());
        assert!(!led.is_enabled().unwrap());
    }

    #[test]
    fn test_invalid_pin() {
        assert!(Led::new(ControlId::new(0), bank(), 32).is_err());
    }
}
