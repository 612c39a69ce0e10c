//! `mail`: stage settings, apply them and send notifications.
//!
//! Mutators run in declaration order, so a single request can stage
//! settings, apply them and send a message.

use crate::binding::{self, Binding};
use controld_core::constants::{
    COMMAND_MAIL, PARAM_APPLY, PARAM_CC, PARAM_MESSAGE, PARAM_PASSWORD, PARAM_SENT,
    PARAM_SERVER, PARAM_SUBJECT, PARAM_TO, PARAM_USERNAME,
};
use controld_hardware::{Board, MailClient};
use serde_json::json;

const USAGE: &str = r#"mail [{"server": <url>, "username": <s>, "password": <s>, "subject": <s>, "to": <addr>|[<addr>], "cc": <addr>|[<addr>], "apply": <bool>, "message": <s>}]"#;

pub fn build(board: &Board) -> Binding<(), MailClient> {
    Binding::fixed(COMMAND_MAIL, USAGE, board.mail().clone())
        .mutator(PARAM_SERVER, |_, mail, value| {
            mail.set_server(binding::string(PARAM_SERVER, value)?);
            Ok(())
        })
        .mutator(PARAM_USERNAME, |_, mail, value| {
            mail.set_username(binding::string(PARAM_USERNAME, value)?);
            Ok(())
        })
        .mutator(PARAM_PASSWORD, |_, mail, value| {
            mail.set_password(binding::string(PARAM_PASSWORD, value)?);
            Ok(())
        })
        .mutator(PARAM_SUBJECT, |_, mail, value| {
            mail.set_subject(binding::string(PARAM_SUBJECT, value)?);
            Ok(())
        })
        .mutator(PARAM_TO, |_, mail, value| {
            mail.add_to(binding::strings(PARAM_TO, value)?)?;
            Ok(())
        })
        .mutator(PARAM_CC, |_, mail, value| {
            mail.add_cc(binding::strings(PARAM_CC, value)?)?;
            Ok(())
        })
        .mutator(PARAM_APPLY, |_, mail, value| {
            if binding::boolean(PARAM_APPLY, value)? {
                mail.apply_settings();
            }
            Ok(())
        })
        .mutator(PARAM_MESSAGE, |_, mail, value| {
            mail.send(binding::string(PARAM_MESSAGE, value)?)?;
            Ok(())
        })
        .accessor(PARAM_SERVER, |_, mail| Ok(json!(mail.settings().server)))
        .accessor(PARAM_USERNAME, |_, mail| Ok(json!(mail.settings().username)))
        .accessor(PARAM_SUBJECT, |_, mail| Ok(json!(mail.settings().subject)))
        .accessor(PARAM_TO, |_, mail| Ok(json!(mail.settings().to)))
        .accessor(PARAM_CC, |_, mail| Ok(json!(mail.settings().cc)))
        .accessor(PARAM_SENT, |_, mail| Ok(json!(mail.sent())))
}
