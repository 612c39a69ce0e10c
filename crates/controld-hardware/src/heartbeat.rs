//! Periodic heartbeat state.
//!
//! The timer itself lives with the daemon; this object holds what it needs
//! between ticks and performs one beat when asked. A beat toggles the bound
//! LED, taking the LED lock exactly as a `led` command would.

use crate::control::{Control, Shared, lock};
use crate::error::{HardwareError, Result};
use crate::led::Led;
use controld_core::ControlId;
use controld_core::constants::{
    DEFAULT_HEARTBEAT_INTERVAL_MS, MAX_HEARTBEAT_INTERVAL_MS, MIN_HEARTBEAT_INTERVAL_MS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

/// Heartbeat settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Start beating immediately.
    pub enabled: bool,

    /// Period between beats in milliseconds.
    pub interval_ms: u64,

    /// LED toggled on every beat, if any.
    pub led: Option<u8>,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            led: Some(0),
        }
    }
}

/// Heartbeat control object.
#[derive(Debug)]
pub struct Heartbeat {
    id: ControlId,
    enabled: bool,
    interval: Duration,
    beats: u64,
    led: Option<Shared<Led>>,
    led_id: Option<ControlId>,
}

impl Heartbeat {
    /// Create a heartbeat bound to an optional LED.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::OutOfRange`] if the configured interval is
    /// outside the accepted range.
    pub fn new(config: &HeartbeatConfig, led: Option<Shared<Led>>) -> Result<Self> {
        let led_id = match &led {
            Some(shared) => Some(lock(shared)?.id()),
            None => None,
        };
        let mut heartbeat = Self {
            id: ControlId::new(0),
            enabled: config.enabled,
            interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS),
            beats: 0,
            led,
            led_id,
        };
        heartbeat.set_interval(Duration::from_millis(config.interval_ms))?;
        Ok(heartbeat)
    }

    /// Perform one beat: toggle the LED if enabled.
    pub fn beat(&mut self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if let Some(led) = &self.led {
            let on = lock(led)?.toggle()?;
            trace!(beats = self.beats + 1, on, "heartbeat");
        }
        self.beats += 1;
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Change the period between beats.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::OutOfRange`] outside
    /// `MIN_HEARTBEAT_INTERVAL_MS..=MAX_HEARTBEAT_INTERVAL_MS`.
    pub fn set_interval(&mut self, interval: Duration) -> Result<()> {
        let ms = interval.as_millis();
        if !(u128::from(MIN_HEARTBEAT_INTERVAL_MS)..=u128::from(MAX_HEARTBEAT_INTERVAL_MS))
            .contains(&ms)
        {
            return Err(HardwareError::out_of_range(format!(
                "interval {ms}ms not in {MIN_HEARTBEAT_INTERVAL_MS}-{MAX_HEARTBEAT_INTERVAL_MS}ms"
            )));
        }
        self.interval = interval;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Beats performed since start.
    pub fn beats(&self) -> u64 {
        self.beats
    }

    /// Id of the LED toggled by the heartbeat.
    pub fn led(&self) -> Option<ControlId> {
        self.led_id
    }
}

impl Control for Heartbeat {
    const KIND: &'static str = "heartbeat";

    fn id(&self) -> ControlId {
        self.id
    }
}
