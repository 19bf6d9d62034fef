// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identity Commands
//!
//! Stores and shows the local user id.

use anyhow::Result;

use crate::config::CliConfig;
use crate::display;

/// Stores the local user id.
pub fn login(config: &CliConfig, user_id: &str) -> Result<()> {
    let store = config.identity_store();
    store.save(user_id)?;

    display::success(&format!("Logged in as {}", user_id.trim()));
    println!("  Identity file: {:?}", store.path());
    Ok(())
}

/// Removes the stored user id.
pub fn logout(config: &CliConfig) -> Result<()> {
    config.identity_store().clear()?;
    display::success("Logged out");
    Ok(())
}

/// Prints the local user id.
pub fn whoami(config: &CliConfig) -> Result<()> {
    let user = config.local_user_id()?;
    println!("{}", user);
    Ok(())
}
