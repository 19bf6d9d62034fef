// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chatsync CLI
//!
//! Terminal chat client over the chatsync reconciliation core.

mod commands;
mod config;
mod display;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "chatsync")]
#[command(version, about = "Live chat with optimistic sends and history backfill")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (default: ~/.chatsync)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// History API base URL
    #[arg(
        long,
        global = true,
        env = "CHATSYNC_API_URL",
        default_value = "http://localhost:3000"
    )]
    api_url: String,

    /// Real-time channel base URL
    #[arg(
        long,
        global = true,
        env = "CHATSYNC_SOCKET_URL",
        default_value = "ws://localhost:3000"
    )]
    socket_url: String,

    /// Act as this user instead of the stored identity
    #[arg(long, global = true, env = "CHATSYNC_USER_ID")]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the local user id
    Login {
        /// Your user id
        user_id: String,
    },

    /// Forget the stored user id
    Logout,

    /// Show the local user id
    Whoami,

    /// Print a conversation's history
    History {
        /// Conversation id
        conversation: String,
    },

    /// Send one message and exit
    Send {
        /// Conversation id
        conversation: String,

        /// Message text
        text: String,
    },

    /// Open an interactive chat
    Chat {
        /// Conversation id
        conversation: String,
    },
}

fn init_logging() {
    // Logs go to stderr so stdout stays the transcript.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatsync=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    // Resolve data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chatsync")
    });

    let config = CliConfig {
        data_dir,
        api_url: cli.api_url,
        socket_url: cli.socket_url,
        user_override: cli.user,
    };

    match cli.command {
        Commands::Login { user_id } => commands::identity::login(&config, &user_id)?,
        Commands::Logout => commands::identity::logout(&config)?,
        Commands::Whoami => commands::identity::whoami(&config)?,
        Commands::History { conversation } => commands::history::run(&config, &conversation)?,
        Commands::Send { conversation, text } => {
            commands::chat::send(&config, &conversation, &text)?;
        }
        Commands::Chat { conversation } => commands::chat::run(&config, &conversation)?,
    }

    Ok(())
}
