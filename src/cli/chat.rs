//! Interactive chat front end.
//!
//! Reads chat lines, runs the prefixed ones as timer commands for a single
//! actor against an in-process registry, and writes the replies back. Phase
//! notices are printed by a [`ConsoleNotificationSender`] as they happen.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::daemon::{CommandHandler, SessionRegistry};
use crate::notification::{dispatch_notifications, ConsoleNotificationSender};
use crate::types::{ActorId, BotConfig, Command};

/// Parses a chat line.
///
/// Returns `None` for lines that do not start with `prefix`, so ordinary
/// chatter is ignored. Anything after the command word is ignored too.
pub fn parse_chat_command(line: &str, prefix: &str) -> Option<Result<Command, String>> {
    let rest = line.trim_start().strip_prefix(prefix)?;
    let word = rest.split_whitespace().next().unwrap_or_default();
    if word.is_empty() {
        return Some(Err(format!("Missing command after '{prefix}'")));
    }
    Some(word.parse())
}

/// Help line listing the available commands.
pub fn usage(prefix: &str) -> String {
    let commands: Vec<_> = Command::ALL
        .iter()
        .map(|c| format!("{prefix}{}", c.as_str()))
        .collect();
    format!("Commands: {}", commands.join(", "))
}

/// Runs the chat loop over `input` until it is exhausted.
///
/// # Errors
///
/// Returns an error if reading input or writing a reply fails.
pub async fn chat_loop<R, W>(
    handler: &CommandHandler,
    actor_id: ActorId,
    prefix: &str,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let reply = match parse_chat_command(&line, prefix) {
            None => continue,
            Some(Ok(command)) => handler.handle(actor_id, command).await.message,
            Some(Err(e)) => format!("{} {e}. {}", actor_id.mention(), usage(prefix)),
        };
        output
            .write_all(format!("{reply}\n").as_bytes())
            .await
            .context("Failed to write reply")?;
        output.flush().await.context("Failed to flush reply")?;
    }
    Ok(())
}

/// Runs the chat front end on stdin/stdout until end of input.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or stdin/stdout fail.
pub async fn run_chat(actor_id: ActorId, prefix: &str, config: BotConfig) -> Result<()> {
    config.validate().context("Invalid timer configuration")?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let dispatcher = tokio::spawn(dispatch_notifications(
        events_rx,
        ConsoleNotificationSender::new(),
    ));
    let handler = CommandHandler::new(Arc::new(SessionRegistry::new(config, events_tx)));

    println!("{}", usage(prefix));
    let result = chat_loop(
        &handler,
        actor_id,
        prefix,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await;

    dispatcher.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_known_commands() {
            assert_eq!(parse_chat_command("^play", "^"), Some(Ok(Command::Play)));
            assert_eq!(parse_chat_command("^pause", "^"), Some(Ok(Command::Pause)));
            assert_eq!(parse_chat_command("^unpause", "^"), Some(Ok(Command::Unpause)));
            assert_eq!(parse_chat_command("^stop", "^"), Some(Ok(Command::Stop)));
            assert_eq!(parse_chat_command("^display", "^"), Some(Ok(Command::Display)));
        }

        #[test]
        fn test_parse_ignores_case_whitespace_and_arguments() {
            assert_eq!(parse_chat_command("  ^PLAY", "^"), Some(Ok(Command::Play)));
            assert_eq!(
                parse_chat_command("^display please", "^"),
                Some(Ok(Command::Display))
            );
        }

        #[test]
        fn test_parse_ignores_unprefixed_lines() {
            assert_eq!(parse_chat_command("play", "^"), None);
            assert_eq!(parse_chat_command("hello there", "^"), None);
            assert_eq!(parse_chat_command("", "^"), None);
        }

        #[test]
        fn test_parse_unknown_command() {
            let result = parse_chat_command("^explode", "^").unwrap();
            assert_eq!(result, Err("Unknown command: explode".to_string()));
        }

        #[test]
        fn test_parse_bare_prefix() {
            assert!(matches!(parse_chat_command("^", "^"), Some(Err(_))));
        }

        #[test]
        fn test_custom_prefix() {
            assert_eq!(parse_chat_command("!stop", "!"), Some(Ok(Command::Stop)));
            assert_eq!(parse_chat_command("^stop", "!"), None);
        }

        #[test]
        fn test_usage_lists_every_command() {
            assert_eq!(
                usage("^"),
                "Commands: ^play, ^pause, ^unpause, ^stop, ^display"
            );
        }
    }

    mod loop_tests {
        use super::*;

        fn create_handler() -> CommandHandler {
            let (tx, _rx) = mpsc::unbounded_channel();
            let config = BotConfig::default()
                .with_durations(Duration::from_secs(60), Duration::from_secs(30));
            CommandHandler::new(Arc::new(SessionRegistry::new(config, tx)))
        }

        #[tokio::test(start_paused = true)]
        async fn test_chat_loop_replies_to_commands_only() {
            let handler = create_handler();
            let input = "hi all\n^play\n^pause\nbrb\n^dance\n^stop\n";
            let mut output = Vec::new();

            chat_loop(&handler, ActorId(8), "^", input.as_bytes(), &mut output)
                .await
                .unwrap();

            let output = String::from_utf8(output).unwrap();
            let lines: Vec<_> = output.lines().collect();
            assert_eq!(
                lines,
                vec![
                    "Started work timer for <@8>",
                    "Paused work timer for <@8> at 0:00",
                    "<@8> Unknown command: dance. Commands: ^play, ^pause, ^unpause, ^stop, ^display",
                    "Stopped timer for <@8>",
                ]
            );
        }
    }
}
