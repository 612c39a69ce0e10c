//! Names and limits shared by the command engine and its transports.
//!
//! Command names and parameter keys form the JSON request contract. They are
//! kept here so transports, commands and tests spell them identically.
//!
//! ```
//! use controld_core::constants::*;
//!
//! assert_eq!(COMMAND_GPIO, "gpio");
//! assert_eq!(PARAM_BANK, "bank");
//! ```

// ============================================================================
// Response Fields
// ============================================================================

/// Integer result code carried by every response (`0` is success).
pub const RESPONSE_ERROR: &str = "error";

/// Free-text detail attached to failed responses.
pub const RESPONSE_DETAIL: &str = "detail";

/// Upper bound, in bytes, of an error detail string.
pub const ERROR_DETAILS_SIZE_MAX: usize = 256;

// ============================================================================
// Command Names
// ============================================================================

pub const COMMAND_HELP: &str = "help";
pub const COMMAND_GPIO: &str = "gpio";
pub const COMMAND_LED: &str = "led";
pub const COMMAND_HEARTBEAT: &str = "heartbeat";
pub const COMMAND_SYSTEM: &str = "system";
pub const COMMAND_DATETIME: &str = "datetime";
pub const COMMAND_MAIL: &str = "mail";
pub const COMMAND_GPS: &str = "gps";

// ============================================================================
// Parameter Keys
// ============================================================================

// help
pub const PARAM_COMMAND: &str = "command";
pub const PARAM_COMMANDS: &str = "commands";
pub const PARAM_USAGE: &str = "usage";

// gpio / led
pub const PARAM_BANK: &str = "bank";
pub const PARAM_PIN: &str = "pin";
pub const PARAM_OUTPUT: &str = "output";
pub const PARAM_INPUT: &str = "input";
pub const PARAM_DIRECTION: &str = "direction";
pub const PARAM_LED: &str = "led";
pub const PARAM_ENABLE: &str = "enable";

// heartbeat
pub const PARAM_INTERVAL: &str = "interval";
pub const PARAM_BEATS: &str = "beats";

// system / datetime
pub const PARAM_VERSION: &str = "version";
pub const PARAM_UPTIME: &str = "uptime";
pub const PARAM_SIMULATED: &str = "simulated";
pub const PARAM_HOSTNAME: &str = "hostname";
pub const PARAM_DATE: &str = "date";
pub const PARAM_TIME: &str = "time";
pub const PARAM_TIMESTAMP: &str = "timestamp";
pub const PARAM_TIMEZONE: &str = "timezone";

// mail
pub const PARAM_SERVER: &str = "server";
pub const PARAM_USERNAME: &str = "username";
pub const PARAM_PASSWORD: &str = "password";
pub const PARAM_SUBJECT: &str = "subject";
pub const PARAM_TO: &str = "to";
pub const PARAM_CC: &str = "cc";
pub const PARAM_APPLY: &str = "apply";
pub const PARAM_MESSAGE: &str = "message";
pub const PARAM_SENT: &str = "sent";

// gps
pub const PARAM_FIX: &str = "fix";
pub const PARAM_LATITUDE: &str = "latitude";
pub const PARAM_LONGITUDE: &str = "longitude";
pub const PARAM_SATELLITES: &str = "satellites";
pub const PARAM_DEVICE: &str = "device";

// ============================================================================
// Direction Vocabulary
// ============================================================================

/// Pin configured as input.
pub const DIRECTION_INPUT: &str = "input";

/// Pin configured as output.
pub const DIRECTION_OUTPUT: &str = "output";

// ============================================================================
// Heartbeat Limits
// ============================================================================

/// Default heartbeat period in milliseconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 1000;

/// Shortest accepted heartbeat period in milliseconds.
pub const MIN_HEARTBEAT_INTERVAL_MS: u64 = 100;

/// Longest accepted heartbeat period in milliseconds (one hour).
pub const MAX_HEARTBEAT_INTERVAL_MS: u64 = 3_600_000;
