//! `gpio`: drive, configure and sample one pin of a GPIO bank.

use crate::binding::{self, Binding};
use controld_core::constants::{
    COMMAND_GPIO, PARAM_BANK, PARAM_DIRECTION, PARAM_INPUT, PARAM_OUTPUT, PARAM_PIN,
};
use controld_core::{ControlId, Direction};
use controld_hardware::gpio::GPIO_PIN_COUNT;
use controld_hardware::{Board, Gpio};
use serde_json::json;

const USAGE: &str = r#"gpio {"bank": <id>, "pin": <0-31>, ["output": <bool>], ["direction": "input"|"output"]}"#;

/// Bank and pin selected by the request.
#[derive(Debug, Default)]
pub struct PinSession {
    bank: ControlId,
    pin: u8,
}

pub fn build(board: &Board) -> Binding<PinSession, Gpio> {
    let banks = board.gpio().clone();
    Binding::new(COMMAND_GPIO, USAGE, move |session: &PinSession| {
        binding::lookup(&banks, session.bank)
    })
    .required(PARAM_BANK, |session, value| {
        session.bank = binding::selector(PARAM_BANK, value)?;
        Ok(())
    })
    .required(PARAM_PIN, |session, value| {
        let pin = binding::bounded(PARAM_PIN, value, 0..=u64::from(GPIO_PIN_COUNT - 1))?;
        session.pin = pin as u8;
        Ok(())
    })
    .mutator(PARAM_DIRECTION, |session, gpio, value| {
        let direction: Direction = binding::enumerated(PARAM_DIRECTION, value)?;
        gpio.set_direction(session.pin, direction)?;
        Ok(())
    })
    .mutator(PARAM_OUTPUT, |session, gpio, value| {
        gpio.set_output(session.pin, binding::boolean(PARAM_OUTPUT, value)?)?;
        Ok(())
    })
    .accessor(PARAM_BANK, |session, _| Ok(json!(session.bank)))
    .accessor(PARAM_PIN, |session, _| Ok(json!(session.pin)))
    .accessor(PARAM_OUTPUT, |session, gpio| Ok(json!(gpio.output(session.pin)?)))
    .accessor(PARAM_INPUT, |session, gpio| Ok(json!(gpio.input(session.pin)?)))
    .accessor(PARAM_DIRECTION, |session, gpio| {
        Ok(json!(gpio.direction(session.pin)?.as_str()))
    })
}
