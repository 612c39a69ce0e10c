//! `system` and `datetime`: read-only host information.

use crate::binding::Binding;
use chrono::{DateTime, Local};
use controld_core::constants::{
    COMMAND_DATETIME, COMMAND_SYSTEM, PARAM_DATE, PARAM_HOSTNAME, PARAM_SIMULATED, PARAM_TIME,
    PARAM_TIMESTAMP, PARAM_TIMEZONE, PARAM_UPTIME, PARAM_VERSION,
};
use controld_hardware::{Board, SystemInfo};
use serde_json::json;

const SYSTEM_USAGE: &str = "system";
const DATETIME_USAGE: &str = "datetime";

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const TIMEZONE_FORMAT: &str = "%:z";

pub fn build_system(board: &Board) -> Binding<(), SystemInfo> {
    Binding::fixed(COMMAND_SYSTEM, SYSTEM_USAGE, board.system().clone())
        .accessor(PARAM_VERSION, |_, system| Ok(json!(system.version())))
        .accessor(PARAM_UPTIME, |_, system| Ok(json!(system.uptime().as_secs())))
        .accessor(PARAM_SIMULATED, |_, system| {
            Ok(json!(system.mode().is_simulated()))
        })
        .accessor(PARAM_HOSTNAME, |_, system| Ok(json!(system.hostname())))
}

/// Wall-clock reading taken once per request, so all fields agree.
#[derive(Debug)]
pub struct ClockSession {
    now: DateTime<Local>,
}

impl Default for ClockSession {
    fn default() -> Self {
        Self { now: Local::now() }
    }
}

pub fn build_datetime(board: &Board) -> Binding<ClockSession, SystemInfo> {
    let system = board.system().clone();
    Binding::<ClockSession, SystemInfo>::fixed(COMMAND_DATETIME, DATETIME_USAGE, system)
        .accessor(PARAM_TIMESTAMP, |clock, _| Ok(json!(clock.now.timestamp())))
        .accessor(PARAM_DATE, |clock, _| {
            Ok(json!(clock.now.format(DATE_FORMAT).to_string()))
        })
        .accessor(PARAM_TIME, |clock, _| {
            Ok(json!(clock.now.format(TIME_FORMAT).to_string()))
        })
        .accessor(PARAM_TIMEZONE, |clock, _| {
            Ok(json!(clock.now.format(TIMEZONE_FORMAT).to_string()))
        })
}
