//! pomobot - per-user pomodoro timers for chat bots
//!
//! Runs the timer daemon, talks to it over a Unix socket, or drives an
//! in-process timer from chat-style input on stdin.

use anyhow::Result;
use clap::{CommandFactory, Parser};

use pomobot::cli::{run_chat, Cli, Commands, Display, IpcClient, NotifyTarget};
use pomobot::daemon::{default_socket_path, run_daemon};
use pomobot::notification::{ConsoleNotificationSender, LogNotificationSender};
use pomobot::ActorId;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Daemon(args) => {
            let config = args.timer.resolve()?;
            let socket_path = match args.socket {
                Some(path) => path,
                None => default_socket_path()?,
            };
            match args.notify {
                NotifyTarget::Console => {
                    run_daemon(config, &socket_path, ConsoleNotificationSender::new()).await?;
                }
                NotifyTarget::Log => {
                    run_daemon(config, &socket_path, LogNotificationSender::new()).await?;
                }
            }
        }
        Commands::Chat(args) => {
            let config = args.timer.resolve()?;
            run_chat(ActorId(args.actor), &args.prefix, config).await?;
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
        other => {
            if let Some((timer_command, args)) = other.timer_command() {
                let client = IpcClient::for_socket(args.socket.as_deref())?;
                let response = client.send(args.actor_id(), timer_command).await?;
                Display::show_response(timer_command, &response);
            }
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
