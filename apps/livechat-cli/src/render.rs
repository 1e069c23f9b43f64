//! Terminal presentation of chat snapshots.

use std::io::Write;

use chrono::{Local, TimeZone};
use livechat_connection::{ChatError, ChatMessage, ChatSnapshot, ConnectionState, SenderKind};
use tokio::sync::watch;

/// Formats one message as `[HH:MM:SS] author: text` in local time.
pub fn format_message(msg: &ChatMessage) -> String {
    format_message_in(msg, &Local)
}

pub fn format_message_in<Tz>(msg: &ChatMessage, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let time = msg.sent_at.with_timezone(tz).format("%H:%M:%S");
    let marker = match msg.sender {
        SenderKind::Local => " (you)",
        SenderKind::Remote => "",
    };
    format!("[{time}] {}{marker}: {}", msg.author, msg.text)
}

fn state_line(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "* disconnected",
        ConnectionState::Connecting => "* connecting...",
        ConnectionState::Connected => "* connected",
    }
}

/// Lines describing what changed between two snapshots.
///
/// The message log is append-only, so new messages are the tail past the
/// previous length.
pub fn render_changes(prev: &ChatSnapshot, next: &ChatSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    if prev.state != next.state {
        lines.push(state_line(next.state).to_string());
    }
    if next.error != prev.error
        && let Some(error) = &next.error
    {
        lines.push(format!("! {error}"));
    }
    if next.users != prev.users {
        lines.push(format_users(&next.users));
    }

    let seen = prev.messages.len().min(next.messages.len());
    lines.extend(next.messages[seen..].iter().map(format_message));

    lines
}

pub fn format_users(users: &[String]) -> String {
    if users.is_empty() {
        "* nobody online".to_string()
    } else {
        format!("* online ({}): {}", users.len(), users.join(", "))
    }
}

/// Line to print after a send attempt, if any.
///
/// A send while disconnected already surfaces through the error state, which
/// the render loop prints, so it gets no extra line here.
pub fn send_notice(result: &Result<ChatMessage, ChatError>) -> Option<String> {
    match result {
        Ok(_) | Err(ChatError::NotConnected) => None,
        Err(e) => Some(format!("! {e}")),
    }
}

/// Prints every snapshot change to `out` until the manager goes away.
pub async fn render_loop<W: Write>(mut rx: watch::Receiver<ChatSnapshot>, mut out: W) {
    let mut prev = rx.borrow_and_update().clone();
    while rx.changed().await.is_ok() {
        let next = rx.borrow_and_update().clone();
        for line in render_changes(&prev, &next) {
            if writeln!(out, "{line}").is_err() {
                return;
            }
        }
        let _ = out.flush();
        prev = next;
    }
}
