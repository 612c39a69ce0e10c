//! `gps`: current position from the receiver.

use crate::binding::Binding;
use controld_core::constants::{
    COMMAND_GPS, PARAM_DEVICE, PARAM_FIX, PARAM_LATITUDE, PARAM_LONGITUDE, PARAM_SATELLITES,
};
use controld_core::Result;
use controld_hardware::{Board, Gps, GpsFix};
use serde_json::json;
use std::cell::OnceCell;

const USAGE: &str = "gps";

/// One receiver reading per request, so all fields agree.
#[derive(Debug, Default)]
pub struct GpsSession {
    reading: OnceCell<GpsFix>,
}

impl GpsSession {
    fn reading(&self, gps: &Gps) -> Result<GpsFix> {
        if let Some(fix) = self.reading.get() {
            return Ok(*fix);
        }
        let fix = gps.read()?;
        Ok(*self.reading.get_or_init(|| fix))
    }
}

pub fn build(board: &Board) -> Binding<GpsSession, Gps> {
    let gps = board.gps().clone();
    Binding::<GpsSession, Gps>::fixed(COMMAND_GPS, USAGE, gps)
        .accessor(PARAM_FIX, |session, gps| Ok(json!(session.reading(gps)?.fix)))
        .accessor(PARAM_LATITUDE, |session, gps| {
            Ok(json!(session.reading(gps)?.latitude))
        })
        .accessor(PARAM_LONGITUDE, |session, gps| {
            Ok(json!(session.reading(gps)?.longitude))
        })
        .accessor(PARAM_SATELLITES, |session, gps| {
            Ok(json!(session.reading(gps)?.satellites))
        })
        .accessor(PARAM_DEVICE, |_, gps| {
            Ok(json!(gps.device().display().to_string()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Command;
    use crate::response;
    use controld_core::{ErrorCode, Mode};
    use controld_hardware::{BoardConfig, GpsConfig, GpsSource, LogTransport};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn board(simulated: GpsFix) -> Board {
        Board::new(&BoardConfig {
            mode: Mode::Simulated,
            gps: GpsConfig {
                simulated,
                ..GpsConfig::default()
            },
            ..BoardConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_no_fix_by_default() {
        let board = board(GpsFix::default());
        let reply = build(&board).execute(&json!({}));
        assert_eq!(
            reply,
            json!({
                "fix": false,
                "latitude": 0.0,
                "longitude": 0.0,
                "satellites": 0,
                "device": "/dev/ttyS1",
                "error": 0
            })
        );
    }

    #[test]
    fn test_reports_simulated_fix() {
        let board = board(GpsFix {
            fix: true,
            latitude: 51.5074,
            longitude: -0.1278,
            satellites: 8,
        });
        let reply = build(&board).execute(&json!({}));
        assert_eq!(reply["fix"], json!(true));
        assert_eq!(reply["latitude"], json!(51.5074));
        assert_eq!(reply["longitude"], json!(-0.1278));
        assert_eq!(reply["satellites"], json!(8));
    }

    #[derive(Debug, Default, Clone)]
    struct CountingGps {
        reads: Arc<AtomicUsize>,
    }

    impl GpsSource for CountingGps {
        fn read(&self) -> controld_hardware::Result<GpsFix> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(GpsFix {
                fix: true,
                satellites: n as u8,
                ..GpsFix::default()
            })
        }
    }

    #[test]
    fn test_one_reading_per_request() {
        let source = CountingGps::default();
        let board = Board::with_devices(
            &BoardConfig {
                mode: Mode::Simulated,
                ..BoardConfig::default()
            },
            Box::new(LogTransport),
            Box::new(source.clone()),
        )
        .unwrap();
        let gps = build(&board);

        assert_eq!(gps.execute(&json!({}))["satellites"], json!(0));
        assert_eq!(gps.execute(&json!({}))["satellites"], json!(1));
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_receiver_fails_command() {
        let board = Board::new(&BoardConfig {
            memory_device: "/nonexistent/controld-mem".into(),
            gps: GpsConfig {
                device: "/nonexistent/ttyS1".into(),
                ..GpsConfig::default()
            },
            ..BoardConfig::default()
        })
        .unwrap();
        let reply = build(&board).execute(&json!({}));
        assert_eq!(response::error_code(&reply), Some(ErrorCode::CmdFailed));
    }
}
