//! Notification text.

use crate::daemon::PhaseEvent;
use crate::types::Phase;

/// Renders the chat line announcing a finished phase.
///
/// The line starts with the actor's mention so chat front ends can post it
/// as-is.
#[must_use]
pub fn render_phase_message(event: &PhaseEvent) -> String {
    let who = event.actor_id.mention();
    match event.ended_phase {
        Phase::Work => format!(
            "{who} work phase complete, time for a break! ({} done)",
            pomodoro_count(event.completed_pomodoros)
        ),
        Phase::Break => format!("{who} break is over, back to work!"),
    }
}

fn pomodoro_count(n: u32) -> String {
    if n == 1 {
        "1 pomodoro".to_string()
    } else {
        format!("{n} pomodoros")
    }
}
