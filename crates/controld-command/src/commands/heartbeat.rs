//! `heartbeat`: pause, resume and retime the heartbeat.

use crate::binding::{self, Binding};
use controld_core::constants::{
    COMMAND_HEARTBEAT, MAX_HEARTBEAT_INTERVAL_MS, MIN_HEARTBEAT_INTERVAL_MS, PARAM_BEATS,
    PARAM_ENABLE, PARAM_INTERVAL, PARAM_LED,
};
use controld_hardware::{Board, Heartbeat};
use serde_json::json;
use std::time::Duration;

const USAGE: &str = r#"heartbeat [{"enable": <bool>, "interval": <ms>}]"#;

pub fn build(board: &Board) -> Binding<(), Heartbeat> {
    Binding::fixed(COMMAND_HEARTBEAT, USAGE, board.heartbeat().clone())
        .mutator(PARAM_ENABLE, |_, heartbeat, value| {
            heartbeat.set_enabled(binding::boolean(PARAM_ENABLE, value)?);
            Ok(())
        })
        .mutator(PARAM_INTERVAL, |_, heartbeat, value| {
            let ms = binding::bounded(
                PARAM_INTERVAL,
                value,
                MIN_HEARTBEAT_INTERVAL_MS..=MAX_HEARTBEAT_INTERVAL_MS,
            )?;
            heartbeat.set_interval(Duration::from_millis(ms))?;
            Ok(())
        })
        .accessor(PARAM_ENABLE, |_, heartbeat| Ok(json!(heartbeat.is_enabled())))
        .accessor(PARAM_INTERVAL, |_, heartbeat| {
            Ok(json!(heartbeat.interval().as_millis() as u64))
        })
        .accessor(PARAM_BEATS, |_, heartbeat| Ok(json!(heartbeat.beats())))
        .accessor(PARAM_LED, |_, heartbeat| Ok(json!(heartbeat.led())))
}
