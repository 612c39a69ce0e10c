//! The response contract shared by every transport.
//!
//! A response is always a JSON object carrying an integer `error` field.
//! Success (`0`) comes with the command's accessor fields; a failure carries
//! only the code and a `detail` string.
//!
//! ```
//! use controld_command::response;
//! use controld_core::{Error, ErrorCode};
//! use serde_json::{Map, json};
//!
//! let mut fields = Map::new();
//! fields.insert("pin".into(), json!(21));
//! assert_eq!(response::success(fields), json!({"pin": 21, "error": 0}));
//!
//! let failed = response::failure(&Error::param_missing("bank"));
//! assert_eq!(response::error_code(&failed), Some(ErrorCode::ParamMissing));
//! ```

use controld_core::constants::{RESPONSE_DETAIL, RESPONSE_ERROR};
use controld_core::{Error, ErrorCode};
use serde_json::{Map, Value};

/// Successful response from accessor contributions.
pub fn success(mut fields: Map<String, Value>) -> Value {
    fields.insert(RESPONSE_ERROR.to_string(), Value::from(ErrorCode::None.as_u32()));
    Value::Object(fields)
}

/// Failed response; no accessor fields are included.
pub fn failure(error: &Error) -> Value {
    let mut fields = Map::new();
    fields.insert(RESPONSE_ERROR.to_string(), Value::from(error.code().as_u32()));
    fields.insert(RESPONSE_DETAIL.to_string(), Value::from(error.detail()));
    Value::Object(fields)
}

/// Render a command outcome.
pub fn render(outcome: controld_core::Result<Map<String, Value>>) -> Value {
    match outcome {
        Ok(fields) => success(fields),
        Err(error) => failure(&error),
    }
}

/// Error code carried by a response, if it has a valid one.
pub fn error_code(response: &Value) -> Option<ErrorCode> {
    let code = response.get(RESPONSE_ERROR)?.as_u64()?;
    ErrorCode::try_from(u32::try_from(code).ok()?).ok()
}

/// Detail text of a failed response.
pub fn detail(response: &Value) -> Option<&str> {
    response.get(RESPONSE_DETAIL)?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_adds_error_zero() {
        let response = success(Map::new());
        assert_eq!(response, json!({"error": 0}));
        assert_eq!(error_code(&response), Some(ErrorCode::None));
        assert_eq!(detail(&response), None);
    }

    #[test]
    fn test_failure_has_no_fields() {
        let response = failure(&Error::out_of_range("led 9 not registered"));
        assert_eq!(
            response,
            json!({"error": 7, "detail": "led 9 not registered"})
        );
    }

    #[test]
    fn test_render() {
        let mut fields = Map::new();
        fields.insert("enable".into(), json!(true));
        assert_eq!(render(Ok(fields))["enable"], json!(true));
        assert_eq!(
            error_code(&render(Err(Error::syntax("bad")))),
            Some(ErrorCode::Syntax)
        );
    }

    #[test]
    fn test_error_code_rejects_garbage() {
        assert_eq!(error_code(&json!({})), None);
        assert_eq!(error_code(&json!({"error": "0"})), None);
        assert_eq!(error_code(&json!({"error": 99})), None);
    }
}
