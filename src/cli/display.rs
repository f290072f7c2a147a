//! Display utilities for the pomobot CLI.
//!
//! This module provides formatted output for:
//! - Daemon replies to timer commands
//! - Error messages

use crate::types::{Command, IpcResponse, ResponseData};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Prints the daemon's reply to `command`.
    pub fn show_response(command: Command, response: &IpcResponse) {
        println!("{}", Self::format_response(command, response));
    }

    /// Renders the daemon's reply to `command`.
    ///
    /// The first line is the daemon's message; `display` adds a status block
    /// and the state-changing commands add the time left.
    pub fn format_response(command: Command, response: &IpcResponse) -> String {
        let mut lines = vec![response.message.clone()];

        if let Some(data) = &response.data {
            match command {
                Command::Display => lines.extend(Self::status_lines(data)),
                Command::Stop => {}
                Command::Play | Command::Pause | Command::Unpause => {
                    if let Some(remaining) = data.remaining_seconds {
                        lines.push(format!("  Remaining: {}", Self::format_time(remaining)));
                    }
                }
            }
        }

        lines.join("\n")
    }

    fn status_lines(data: &ResponseData) -> Vec<String> {
        let mut lines = vec!["─────────────────────────────".to_string()];
        if let Some(phase) = &data.phase {
            lines.push(format!("Phase:     {phase}"));
        }
        if let Some(state) = &data.state {
            lines.push(format!("State:     {state}"));
        }
        if let Some(elapsed) = data.elapsed_seconds {
            lines.push(format!("Elapsed:   {}", Self::format_time(elapsed)));
        }
        if let Some(remaining) = data.remaining_seconds {
            lines.push(format!("Remaining: {}", Self::format_time(remaining)));
        }
        if let Some(count) = data.completed_pomodoros {
            lines.push(format!("Pomodoros: {count}"));
        }
        if data.watcher_failed == Some(true) {
            lines.push("Warning:   phases no longer advance automatically".to_string());
        }
        lines
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {message}");
    }

    /// Formats a number of seconds as `mm:ss`.
    pub fn format_time(total_seconds: u64) -> String {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        format!("{minutes:02}:{seconds:02}")
    }
}

// ============================================================================
// Tests
// ============================================================================
