// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Terminal Output

use chatsync_core::{DeliveryStatus, Message, Timestamp};
use chrono::{Local, LocalResult, TimeZone};
use console::style;

/// Prints a success line.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Prints an informational line.
pub fn info(msg: &str) {
    println!("{} {}", style("→").cyan(), msg);
}

/// Prints a warning line.
pub fn warning(msg: &str) {
    println!("{} {}", style("!").yellow().bold(), msg);
}

/// Formats a millisecond timestamp as local `HH:MM`.
pub fn format_time(timestamp: Timestamp) -> String {
    match Local.timestamp_millis_opt(timestamp as i64) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.format("%H:%M").to_string(),
        LocalResult::None => "--:--".to_string(),
    }
}

/// Formats one transcript line.
pub fn format_message(message: &Message) -> String {
    let time = style(format_time(message.timestamp())).dim();
    let sender = if message.is_mine() {
        style("you".to_string()).green().bold()
    } else {
        style(message.sender().to_string()).cyan().bold()
    };
    let marker = match message.status() {
        DeliveryStatus::Confirmed => String::new(),
        DeliveryStatus::Pending => format!(" {}", style("(sending)").dim()),
        DeliveryStatus::Failed => format!(" {}", style("(failed, /retry to resend)").red()),
    };
    format!("{} {}: {}{}", time, sender, message.text(), marker)
}

/// Prints messages in display order.
pub fn print_transcript(messages: &[Message]) {
    if messages.is_empty() {
        info("No messages yet.");
        return;
    }
    for message in messages {
        println!("{}", format_message(message));
    }
}
