//! Command error taxonomy.
//!
//! Errors on the command path are data, not control flow: a parameter
//! callback returns an [`Error`], the binding engine renders its code into
//! the response and the transports forward that response untouched.

use crate::constants::ERROR_DETAILS_SIZE_MAX;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of result codes a caller can ever observe in a response.
///
/// The numeric values are part of the wire contract and must not be
/// reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
#[repr(u32)]
pub enum ErrorCode {
    /// Success.
    None = 0,
    /// Malformed value: wrong JSON type or unparseable request.
    Syntax = 1,
    /// No command registered under the requested name.
    CmdInvalid = 2,
    /// Request did not name a command.
    CmdMissing = 3,
    /// Command was valid but the operation could not be carried out.
    CmdFailed = 4,
    /// Parameter value is well-formed but refers to nothing meaningful.
    ParamInvalid = 5,
    /// A required parameter was absent.
    ParamMissing = 6,
    /// Parameter value is outside the accepted range or vocabulary.
    ParamOutOfRange = 7,
    /// Parameter exists but may not be read or written by the caller.
    ParamAccessDenied = 8,
}

impl ErrorCode {
    /// All codes in numeric order.
    pub const ALL: [ErrorCode; 9] = [
        ErrorCode::None,
        ErrorCode::Syntax,
        ErrorCode::CmdInvalid,
        ErrorCode::CmdMissing,
        ErrorCode::CmdFailed,
        ErrorCode::ParamInvalid,
        ErrorCode::ParamMissing,
        ErrorCode::ParamOutOfRange,
        ErrorCode::ParamAccessDenied,
    ];

    /// Numeric value as carried in the `error` field of a response.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Canonical upper-case name of the code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::None => "NONE",
            ErrorCode::Syntax => "SYNTAX",
            ErrorCode::CmdInvalid => "CMD_INVALID",
            ErrorCode::CmdMissing => "CMD_MISSING",
            ErrorCode::CmdFailed => "CMD_FAILED",
            ErrorCode::ParamInvalid => "PARAM_INVALID",
            ErrorCode::ParamMissing => "PARAM_MISSING",
            ErrorCode::ParamOutOfRange => "PARAM_OUT_OF_RANGE",
            ErrorCode::ParamAccessDenied => "PARAM_ACCESS_DENIED",
        }
    }

    /// Check if this code means success.
    #[must_use]
    pub fn is_none(self) -> bool {
        self == ErrorCode::None
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.as_u32()
    }
}

impl TryFrom<u32> for ErrorCode {
    type Error = String;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        ErrorCode::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("Unknown error code: {value}"))
    }
}

/// A failed command outcome: code plus free-text detail.
///
/// The detail is capped at [`ERROR_DETAILS_SIZE_MAX`] bytes; longer text is
/// truncated on a character boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {detail}")]
pub struct Error {
    code: ErrorCode,
    detail: String,
}

impl Error {
    /// Create an error with a detail message.
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        let mut detail = detail.into();
        if detail.len() > ERROR_DETAILS_SIZE_MAX {
            let mut cut = ERROR_DETAILS_SIZE_MAX;
            while !detail.is_char_boundary(cut) {
                cut -= 1;
            }
            detail.truncate(cut);
        }
        Self { code, detail }
    }

    /// Wrong JSON type or unparseable value.
    pub fn syntax(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::Syntax, detail)
    }

    /// Unknown command name.
    pub fn cmd_invalid(name: impl Into<String>) -> Self {
        Self::new(ErrorCode::CmdInvalid, name)
    }

    /// Request without a command name.
    pub fn cmd_missing(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::CmdMissing, detail)
    }

    /// Operation failed after validation.
    pub fn cmd_failed(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::CmdFailed, detail)
    }

    /// Value refers to nothing meaningful.
    pub fn param_invalid(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParamInvalid, detail)
    }

    /// Required parameter absent; the detail is the key name.
    pub fn param_missing(key: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParamMissing, key)
    }

    /// Value outside the accepted range.
    pub fn out_of_range(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParamOutOfRange, detail)
    }

    /// Parameter may not be accessed.
    pub fn access_denied(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParamAccessDenied, detail)
    }

    /// The error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The detail text.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorCode::None, 0, "NONE")]
    #[case(ErrorCode::Syntax, 1, "SYNTAX")]
    #[case(ErrorCode::CmdInvalid, 2, "CMD_INVALID")]
    #[case(ErrorCode::CmdMissing, 3, "CMD_MISSING")]
    #[case(ErrorCode::CmdFailed, 4, "CMD_FAILED")]
    #[case(ErrorCode::ParamInvalid, 5, "PARAM_INVALID")]
    #[case(ErrorCode::ParamMissing, 6, "PARAM_MISSING")]
    #[case(ErrorCode::ParamOutOfRange, 7, "PARAM_OUT_OF_RANGE")]
    #[case(ErrorCode::ParamAccessDenied, 8, "PARAM_ACCESS_DENIED")]
    fn test_code_values(#[case] code: ErrorCode, #[case] value: u32, #[case] name: &str) {
        assert_eq!(code.as_u32(), value);
        assert_eq!(code.to_string(), name);
        assert_eq!(ErrorCode::try_from(value).unwrap(), code);
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(ErrorCode::try_from(9).is_err());
    }

    #[test]
    fn test_code_serializes_as_number() {
        let json = serde_json::to_string(&ErrorCode::ParamMissing).unwrap();
        assert_eq!(json, "6");
        let code: ErrorCode = serde_json::from_str("7").unwrap();
        assert_eq!(code, ErrorCode::ParamOutOfRange);
    }

    #[test]
    fn test_error_display() {
        let error = Error::param_missing("bank");
        assert_eq!(error.code(), ErrorCode::ParamMissing);
        assert_eq!(error.to_string(), "PARAM_MISSING: bank");
    }

    #[test]
    fn test_detail_is_bounded() {
        let error = Error::cmd_failed("x".repeat(ERROR_DETAILS_SIZE_MAX + 40));
        assert_eq!(error.detail().len(), ERROR_DETAILS_SIZE_MAX);
    }

    #[test]
    fn test_detail_truncates_on_char_boundary() {
        // 'é' is two bytes; the leading 'a' puts the cap inside one
        let text = format!("a{}", "é".repeat(ERROR_DETAILS_SIZE_MAX));
        let error = Error::cmd_failed(text);
        assert_eq!(error.detail().len(), ERROR_DETAILS_SIZE_MAX - 1);
        assert!(error.detail().chars().skip(1).all(|c| c == 'é'));
    }
}
