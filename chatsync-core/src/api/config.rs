// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration Types

use std::env;

use crate::network::TransportConfig;
use crate::store::DEFAULT_FUZZY_WINDOW_MS;

/// Environment variable overriding the history API base URL.
pub const API_URL_ENV: &str = "CHATSYNC_API_URL";
/// Environment variable overriding the socket base URL.
pub const SOCKET_URL_ENV: &str = "CHATSYNC_SOCKET_URL";

/// Configuration for a reconciliation controller.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of the history service (`http://` or `https://`).
    pub api_base_url: String,
    /// Base URL of the real-time channel (`ws://` or `wss://`).
    pub socket_base_url: String,
    /// Transport and reconnect settings. `server_url` is filled in per user.
    pub transport: TransportConfig,
    /// Timestamp tolerance for fuzzy duplicate detection.
    pub fuzzy_window_ms: u64,
    /// Timeout for one history fetch.
    pub history_timeout_ms: u64,
    /// Queue backfill requests for the embedder instead of fetching inline.
    pub deferred_backfill: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            api_base_url: "http://localhost:3000".to_string(),
            socket_base_url: "ws://localhost:3000".to_string(),
            transport: TransportConfig::default(),
            fuzzy_window_ms: DEFAULT_FUZZY_WINDOW_MS,
            history_timeout_ms: 10_000,
            deferred_backfill: false,
        }
    }
}

impl ChatConfig {
    /// Creates a config for the given endpoints.
    pub fn new(api_base_url: impl Into<String>, socket_base_url: impl Into<String>) -> Self {
        ChatConfig {
            api_base_url: api_base_url.into(),
            socket_base_url: socket_base_url.into(),
            ..Default::default()
        }
    }

    /// Default config with endpoints taken from the environment when set.
    pub fn from_env() -> Self {
        let mut config = ChatConfig::default();
        if let Some(url) = non_empty_var(API_URL_ENV) {
            config.api_base_url = url;
        }
        if let Some(url) = non_empty_var(SOCKET_URL_ENV) {
            config.socket_base_url = url;
        }
        config
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
