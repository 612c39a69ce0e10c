//! Request line framing shared by the transports.
//!
//! A request line is a JSON object naming the command and carrying its
//! parameters:
//!
//! ```text
//! {"command": "gpio", "params": {"bank": 1, "pin": 21, "output": true}}
//! ```
//!
//! `params` may be omitted. A line that is not JSON, or not an object, is a
//! `SYNTAX` error; a missing or non-string `command` is `CMD_MISSING`.

use controld_command::{CommandHandler, response};
use controld_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key naming the command in a request line.
pub const REQUEST_COMMAND: &str = "command";

/// Key carrying the parameters in a request line.
pub const REQUEST_PARAMS: &str = "params";

/// A parsed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub command: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    pub fn new(command: impl Into<String>, params: Value) -> Self {
        Self {
            command: command.into(),
            params,
        }
    }

    /// Parse one request line.
    ///
    /// # Errors
    ///
    /// `SYNTAX` for malformed JSON or a non-object line, `CMD_MISSING` when
    /// no command name is given.
    pub fn parse(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line.trim())
            .map_err(|e| Error::syntax(format!("invalid request: {e}")))?;
        let Value::Object(mut fields) = value else {
            return Err(Error::syntax("request must be a JSON object"));
        };

        let command = match fields.remove(REQUEST_COMMAND) {
            Some(Value::String(command)) if !command.is_empty() => command,
            _ => return Err(Error::cmd_missing("request has no command name")),
        };
        let params = fields.remove(REQUEST_PARAMS).unwrap_or(Value::Null);
        Ok(Self { command, params })
    }

    /// Render as a single request line, without the trailing newline.
    pub fn to_line(&self) -> String {
        serde_json::json!({ REQUEST_COMMAND: self.command, REQUEST_PARAMS: self.params })
            .to_string()
    }
}

/// Parse and dispatch one request line.
///
/// Blocks on hardware access; call it from a blocking context.
pub fn handle_line(handler: &CommandHandler, line: &str) -> Value {
    match Request::parse(line) {
        Ok(request) => handler.dispatch(&request.command, &request.params),
        Err(e) => response::failure(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use controld_core::ErrorCode;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_parse_full_request() {
        let request =
            Request::parse(r#"{"command": "led", "params": {"led": 0, "enable": true}}"#).unwrap();
        assert_eq!(
            request,
            Request::new("led", json!({"led": 0, "enable": true}))
        );
    }

    #[test]
    fn test_params_optional() {
        let request = Request::parse(r#"{"command": "help"}"#).unwrap();
        assert_eq!(request.params, Value::Null);
    }

    #[rstest]
    #[case("not json", ErrorCode::Syntax)]
    #[case("[1, 2]", ErrorCode::Syntax)]
    #[case("", ErrorCode::Syntax)]
    #[case(r#"{"params": {}}"#, ErrorCode::CmdMissing)]
    #[case(r#"{"command": 5}"#, ErrorCode::CmdMissing)]
    #[case(r#"{"command": ""}"#, ErrorCode::CmdMissing)]
    fn test_rejected_lines(#[case] line: &str, #[case] code: ErrorCode) {
        assert_eq!(Request::parse(line).unwrap_err().code(), code);
    }

    #[test]
    fn test_to_line_parses_back() {
        let request = Request::new("gpio", json!({"bank": 1, "pin": 2}));
        assert_eq!(Request::parse(&request.to_line()).unwrap(), request);
    }

    #[test]
    fn test_handle_line_reports_framing_errors() {
        let handler = CommandHandler::new();
        let reply = handle_line(&handler, "{");
        assert_eq!(response::error_code(&reply), Some(ErrorCode::Syntax));

        let reply = handle_line(&handler, r#"{"command": "gpio"}"#);
        assert_eq!(response::error_code(&reply), Some(ErrorCode::CmdInvalid));
    }
}
