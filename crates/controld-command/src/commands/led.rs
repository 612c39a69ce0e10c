//! `led`: switch an LED and report where it is wired.

use crate::binding::{self, Binding};
use controld_core::ControlId;
use controld_core::constants::{COMMAND_LED, PARAM_BANK, PARAM_ENABLE, PARAM_LED, PARAM_PIN};
use controld_hardware::{Board, Control, Led};
use serde_json::json;

const USAGE: &str = r#"led {"led": <id>, ["enable": <bool>]}"#;

#[derive(Debug, Default)]
pub struct LedSession {
    led: ControlId,
}

pub fn build(board: &Board) -> Binding<LedSession, Led> {
    let leds = board.leds().clone();
    Binding::new(COMMAND_LED, USAGE, move |session: &LedSession| {
        binding::lookup(&leds, session.led)
    })
    .required(PARAM_LED, |session, value| {
        session.led = binding::selector(PARAM_LED, value)?;
        Ok(())
    })
    .mutator(PARAM_ENABLE, |_, led, value| {
        led.set_enabled(binding::boolean(PARAM_ENABLE, value)?)?;
        Ok(())
    })
    .accessor(PARAM_LED, |_, led| Ok(json!(led.id())))
    .accessor(PARAM_ENABLE, |_, led| Ok(json!(led.is_enabled()?)))
    .accessor(PARAM_BANK, |_, led| Ok(json!(led.bank())))
    .accessor(PARAM_PIN, |_, led| Ok(json!(led.pin())))
}
