//! CLI module for pomobot.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `client`: IPC client for daemon communication
//! - `display`: Output formatting and display logic
//! - `chat`: Line-based chat front end

pub mod chat;
pub mod client;
pub mod commands;
pub mod display;

pub use chat::{chat_loop, parse_chat_command, run_chat};
pub use client::IpcClient;
pub use commands::{ActorArgs, ChatArgs, Cli, Commands, DaemonArgs, NotifyTarget, TimerArgs};
pub use display::Display;
