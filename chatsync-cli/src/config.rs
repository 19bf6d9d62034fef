// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Configuration

use std::path::PathBuf;

use anyhow::{bail, Result};
use chatsync_core::{ChatConfig, FileIdentityStore};

/// Read poll timeout for the interactive loop.
const CLI_IO_TIMEOUT_MS: u64 = 250;

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Data directory for the identity file.
    pub data_dir: PathBuf,
    /// History API base URL.
    pub api_url: String,
    /// Real-time channel base URL.
    pub socket_url: String,
    /// User id given on the command line or in the environment.
    pub user_override: Option<String>,
}

impl CliConfig {
    /// Returns the identity file path.
    pub fn identity_path(&self) -> PathBuf {
        self.data_dir.join("identity.json")
    }

    /// Returns the identity store.
    pub fn identity_store(&self) -> FileIdentityStore {
        FileIdentityStore::new(self.identity_path())
    }

    /// Resolves the local user: override first, then the identity file.
    pub fn local_user_id(&self) -> Result<String> {
        if let Some(user) = self
            .user_override
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
        {
            return Ok(user.to_string());
        }
        match self.identity_store().load()? {
            Some(user) => Ok(user),
            None => bail!("Not logged in. Run 'chatsync login <user-id>' first."),
        }
    }

    /// Builds the controller configuration.
    pub fn chat_config(&self) -> ChatConfig {
        let mut config = ChatConfig::new(&self.api_url, &self.socket_url);
        config.transport.io_timeout_ms = CLI_IO_TIMEOUT_MS;
        config.transport.background_connect = true;
        config
    }
}
