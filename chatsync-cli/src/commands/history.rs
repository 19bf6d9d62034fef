// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! History Command
//!
//! Prints a conversation's stored messages.

use std::time::Duration;

use anyhow::{Context, Result};
use chatsync_core::network::{HistorySource, HttpHistorySource};

use crate::config::CliConfig;
use crate::display;

/// Fetches and prints the history of a conversation.
pub fn run(config: &CliConfig, conversation: &str) -> Result<()> {
    let user = config.local_user_id()?;
    let chat_config = config.chat_config();
    let source = HttpHistorySource::new(
        &chat_config.api_base_url,
        Duration::from_millis(chat_config.history_timeout_ms),
    )?;

    let mut messages = source
        .fetch_history(conversation, &user)
        .with_context(|| format!("Failed to load history of '{}'", conversation))?;
    messages.sort_by_key(|m| m.timestamp());

    display::print_transcript(&messages);
    Ok(())
}
