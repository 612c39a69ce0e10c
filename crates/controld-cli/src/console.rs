//! Interactive console on standard input.
//!
//! Each line is `<command> [<json-object>]`; the response is written back as
//! one JSON line. `quit` or `exit` stops the daemon, end of input only stops
//! the console.

use controld_command::{CommandHandler, response};
use controld_core::Error;
use serde_json::Value;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// How the console loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// The operator asked to stop the daemon.
    Quit,
    /// Input closed.
    Eof,
    /// The daemon is shutting down.
    Shutdown,
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Empty,
    Quit,
    Request { command: String, params: Value },
    Invalid(Error),
}

impl ConsoleInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ConsoleInput::Empty;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        if matches!(command, "quit" | "exit") {
            return ConsoleInput::Quit;
        }

        let params = if rest.is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(rest) {
                Ok(params) => params,
                Err(e) => return ConsoleInput::Invalid(Error::syntax(format!("invalid parameters: {e}"))),
            }
        };
        ConsoleInput::Request {
            command: command.to_string(),
            params,
        }
    }
}

/// Serve the console on the process's standard streams.
pub async fn run_stdio(handler: CommandHandler, shutdown: CancellationToken) -> io::Result<ConsoleExit> {
    run(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        handler,
        shutdown,
    )
    .await
}

/// Serve the console over any line source and sink.
pub async fn run<R, W>(
    reader: R,
    mut writer: W,
    handler: CommandHandler,
    shutdown: CancellationToken,
) -> io::Result<ConsoleExit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => return Ok(ConsoleExit::Shutdown),
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            return Ok(ConsoleExit::Eof);
        };

        let reply = match ConsoleInput::parse(&line) {
            ConsoleInput::Empty => continue,
            ConsoleInput::Quit => return Ok(ConsoleExit::Quit),
            ConsoleInput::Invalid(e) => response::failure(&e),
            ConsoleInput::Request { command, params } => {
                debug!(command = %command, "console request");
                let handler = handler.clone();
                tokio::task::spawn_blocking(move || handler.dispatch(&command, &params))
                    .await
                    .unwrap_or_else(|e| {
                        error!(error = %e, "command task failed");
                        response::failure(&Error::cmd_failed("command aborted"))
                    })
            }
        };

        writer.write_all(reply.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use controld_command::commands;
    use controld_core::{ErrorCode, Mode};
    use controld_hardware::{Board, BoardConfig};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("", ConsoleInput::Empty)]
    #[case("   ", ConsoleInput::Empty)]
    #[case("quit", ConsoleInput::Quit)]
    #[case(" exit ", ConsoleInput::Quit)]
    #[case("help", ConsoleInput::Request { command: "help".into(), params: Value::Null })]
    #[case(
        r#"led {"led": 0, "enable": true}"#,
        ConsoleInput::Request { command: "led".into(), params: json!({"led": 0, "enable": true}) }
    )]
    fn test_parse(#[case] line: &str, #[case] expected: ConsoleInput) {
        assert_eq!(ConsoleInput::parse(line), expected);
    }

    #[test]
    fn test_parse_bad_params() {
        let ConsoleInput::Invalid(e) = ConsoleInput::parse("led {led: 0}") else {
            panic!("expected invalid input");
        };
        assert_eq!(e.code(), ErrorCode::Syntax);
    }

    fn handler() -> (Board, CommandHandler) {
        let board = Board::new(&BoardConfig {
            mode: Mode::Simulated,
            ..BoardConfig::default()
        })
        .unwrap();
        let handler = CommandHandler::new();
        commands::register_all(&handler, &board);
        (board, handler)
    }

    async fn session(input: &str) -> (ConsoleExit, Vec<Value>) {
        let (_board, handler) = handler();
        let mut output = Vec::new();
        let exit = run(input.as_bytes(), &mut output, handler, CancellationToken::new())
            .await
            .unwrap();
        let replies = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        (exit, replies)
    }

    #[tokio::test]
    async fn test_session_until_quit() {
        let (exit, replies) = session(
            "led {\"led\": 0, \"enable\": true}\n\nled {\"led\": 0}\nled {oops}\nquit\nhelp\n",
        )
        .await;

        assert_eq!(exit, ConsoleExit::Quit);
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[1]["enable"], json!(true));
        assert_eq!(response::error_code(&replies[2]), Some(ErrorCode::Syntax));
    }

    #[tokio::test]
    async fn test_session_until_eof() {
        let (exit, replies) = session("nope\n").await;
        assert_eq!(exit, ConsoleExit::Eof);
        assert_eq!(response::error_code(&replies[0]), Some(ErrorCode::CmdInvalid));
    }

    #[tokio::test]
    async fn test_shutdown_stops_console() {
        let (_board, handler) = handler();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let (reader, _writer) = tokio::io::duplex(64);
        let exit = run(BufReader::new(reader), tokio::io::sink(), handler, shutdown)
            .await
            .unwrap();
        assert_eq!(exit, ConsoleExit::Shutdown);
    }
}
