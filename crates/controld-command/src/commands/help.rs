//! `help`: list commands or show one command's usage.

use crate::binding::{self, Binding};
use crate::handler::{CommandHandler, CommandMap};
use controld_core::Error;
use controld_core::constants::{COMMAND_HELP, PARAM_COMMAND, PARAM_COMMANDS, PARAM_USAGE};
use serde_json::json;

const USAGE: &str = r#"help [{"command": "<name>"}]"#;

#[derive(Debug, Default)]
pub struct HelpSession {
    usage: Option<String>,
}

/// Build `help` over the handler it will be registered in.
///
/// Holds the map weakly, so registering it does not keep the handler alive.
pub fn build(handler: &CommandHandler) -> Binding<HelpSession, CommandMap> {
    let commands = handler.downgrade();
    Binding::new(COMMAND_HELP, USAGE, move |_: &HelpSession| {
        commands
            .upgrade()
            .ok_or_else(|| Error::cmd_failed("command handler is gone"))
    })
    .optional(PARAM_COMMAND, |session, map, value| {
        let name = binding::string(PARAM_COMMAND, value)?;
        let command = map
            .get(name)
            .ok_or_else(|| Error::param_invalid(format!("no command named {name}")))?;
        session.usage = Some(command.usage().to_string());
        Ok(())
    })
    .accessor(PARAM_COMMANDS, |_, map| Ok(json!(map.names())))
    .optional_accessor(
        PARAM_USAGE,
        |session| session.usage.is_some(),
        |session, _| Ok(json!(session.usage)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Command;
    use crate::response;
    use controld_core::ErrorCode;
    use serde_json::Value;
    use std::sync::Arc;

    fn handler() -> CommandHandler {
        let handler = CommandHandler::new();
        handler.register(Arc::new(build(&handler)));
        handler
    }

    #[test]
    fn test_lists_commands() {
        let reply = handler().dispatch(COMMAND_HELP, &Value::Null);
        assert_eq!(reply, json!({"commands": ["help"], "error": 0}));
    }

    #[test]
    fn test_usage_of_known_command() {
        let reply = handler().dispatch(COMMAND_HELP, &json!({"command": "help"}));
        assert_eq!(reply["usage"], json!(USAGE));
        assert_eq!(reply["commands"], json!(["help"]));
    }

    #[test]
    fn test_unknown_command_is_param_invalid() {
        let reply = handler().dispatch(COMMAND_HELP, &json!({"command": "nope"}));
        assert_eq!(response::error_code(&reply), Some(ErrorCode::ParamInvalid));
    }

    #[test]
    fn test_non_string_command_is_syntax() {
        let reply = handler().dispatch(COMMAND_HELP, &json!({"command": 3}));
        assert_eq!(response::error_code(&reply), Some(ErrorCode::Syntax));
    }

    #[test]
    fn test_dropped_handler() {
        let help = {
            let handler = CommandHandler::new();
            build(&handler)
        };
        let reply = help.execute(&json!({}));
        assert_eq!(response::error_code(&reply), Some(ErrorCode::CmdFailed));
    }
}
