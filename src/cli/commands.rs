//! Command definitions for the pomobot CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{ActorId, BotConfig, Command};

// ============================================================================
// CLI Structure
// ============================================================================

/// pomobot - a per-user pomodoro timer for chat bots
#[derive(Parser, Debug)]
#[command(
    name = "pomobot",
    version,
    about = "Per-user pomodoro timers for chat bots",
    long_about = "Keeps an independent work/break pomodoro timer for every chat user.\n\
                  Run `pomobot daemon` and drive it with the timer commands, or try it\n\
                  interactively with `pomobot chat`.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the actor's timer, or continue it if paused
    Play(ActorArgs),

    /// Pause the actor's running timer
    Pause(ActorArgs),

    /// Resume the actor's paused timer
    Unpause(ActorArgs),

    /// Stop the actor's timer
    Stop(ActorArgs),

    /// Show the actor's phase and elapsed time
    Display(ActorArgs),

    /// Run the timer daemon on a Unix socket
    Daemon(DaemonArgs),

    /// Read chat lines from stdin and answer on stdout
    Chat(ChatArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    /// The timer command and its arguments, for the client subcommands.
    pub fn timer_command(&self) -> Option<(Command, &ActorArgs)> {
        match self {
            Commands::Play(args) => Some((Command::Play, args)),
            Commands::Pause(args) => Some((Command::Pause, args)),
            Commands::Unpause(args) => Some((Command::Unpause, args)),
            Commands::Stop(args) => Some((Command::Stop, args)),
            Commands::Display(args) => Some((Command::Display, args)),
            _ => None,
        }
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// Arguments shared by the timer commands
#[derive(Args, Debug, Clone)]
pub struct ActorArgs {
    /// Chat user id the command acts for
    #[arg(short, long)]
    pub actor: u64,

    /// Daemon socket path (defaults to ~/.pomobot/pomobot.sock)
    #[arg(short, long)]
    pub socket: Option<PathBuf>,
}

impl ActorArgs {
    /// The actor as a typed id.
    pub fn actor_id(&self) -> ActorId {
        ActorId(self.actor)
    }
}

/// Timer settings accepted by `daemon` and `chat`
#[derive(Args, Debug, Clone, Default)]
pub struct TimerArgs {
    /// Work duration in minutes (1-120)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=120)
    )]
    pub work: Option<u32>,

    /// Break duration in minutes (1-60)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=60)
    )]
    pub break_time: Option<u32>,

    /// Completion check interval in milliseconds (10-60000)
    #[arg(
        long,
        value_parser = clap::value_parser!(u64).range(10..=60_000)
    )]
    pub poll_ms: Option<u64>,

    /// JSON config file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Length of both phases in seconds, replacing the minute settings
    #[arg(
        long,
        hide = true,
        value_parser = clap::value_parser!(u64).range(1..=7200)
    )]
    pub phase_secs: Option<u64>,
}

impl TimerArgs {
    /// Resolves the effective configuration: defaults, then the config
    /// file, then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded.
    pub fn resolve(&self) -> anyhow::Result<BotConfig> {
        let mut config = match &self.config {
            Some(path) => BotConfig::load(path)?,
            None => BotConfig::default(),
        };
        if let Some(work) = self.work {
            config = config.with_work_minutes(work);
        }
        if let Some(brk) = self.break_time {
            config = config.with_break_minutes(brk);
        }
        if let Some(ms) = self.poll_ms {
            config = config.with_poll_interval_ms(ms);
        }
        if let Some(secs) = self.phase_secs {
            let span = Duration::from_secs(secs);
            config = config.with_durations(span, span);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Arguments for the daemon command
#[derive(Args, Debug, Clone)]
pub struct DaemonArgs {
    #[command(flatten)]
    pub timer: TimerArgs,

    /// Socket path to listen on (defaults to ~/.pomobot/pomobot.sock)
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Where phase-end notices go
    #[arg(short, long, value_enum, default_value_t = NotifyTarget::Console)]
    pub notify: NotifyTarget,
}

/// Sink for the daemon's phase-end notices
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyTarget {
    /// One mention line per notice on stdout
    Console,
    /// Notices go to the log (visible at info level)
    Log,
}

/// Arguments for the chat command
#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Chat user id the typed lines come from
    #[arg(short, long)]
    pub actor: u64,

    /// Command prefix
    #[arg(short, long, default_value = "^")]
    pub prefix: String,

    #[command(flatten)]
    pub timer: TimerArgs,
}

// ============================================================================
// Tests
// ============================================================================
