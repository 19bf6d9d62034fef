// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chat Commands
//!
//! One-shot send and the interactive chat loop.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use chatsync_core::api::CallbackHandler;
use chatsync_core::network::{HttpHistorySource, WebSocketTransport};
use chatsync_core::{
    ChatEvent, ControllerState, DeliveryStatus, MessageId, ReconciliationController,
    StoreChange, SystemClock,
};
use console::Term;
use tracing::debug;

use crate::config::CliConfig;
use crate::display;

/// Idle wait between loop iterations when stdin is quiet.
const INPUT_POLL: Duration = Duration::from_millis(50);

type Controller = ReconciliationController<WebSocketTransport>;

fn connect(config: &CliConfig, conversation: &str) -> Result<Controller> {
    let user = config.local_user_id()?;
    let chat_config = config.chat_config();
    let history = HttpHistorySource::new(
        &chat_config.api_base_url,
        Duration::from_millis(chat_config.history_timeout_ms),
    )?;

    let mut controller: Controller = ReconciliationController::new(
        chat_config,
        Box::new(history),
        Arc::new(SystemClock),
        Box::new(WebSocketTransport::new),
    );
    controller.add_event_handler(Arc::new(CallbackHandler::new(|event| {
        if let ChatEvent::HistoryLoaded { fallback: true, .. } = event {
            display::warning("History unavailable, showing placeholder messages");
        }
    })));
    controller.bind(&user, conversation)?;
    Ok(controller)
}

fn wait_until_ready(controller: &mut Controller, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while controller.state() != ControllerState::Ready {
        if Instant::now() >= deadline {
            bail!("Could not open the chat channel");
        }
        if controller.pump() == 0 {
            thread::sleep(INPUT_POLL);
        }
    }
    Ok(())
}

/// Sends one message and exits.
pub fn send(config: &CliConfig, conversation: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Message text is empty");
    }

    let mut controller = connect(config, conversation)?;
    let timeout = Duration::from_millis(config.chat_config().transport.connect_timeout_ms);
    wait_until_ready(&mut controller, timeout)?;

    let Some(id) = controller.submit_local_text(text) else {
        bail!("Message was not sent");
    };
    // Give the echo a chance to arrive.
    controller.pump();

    let status = controller
        .store()
        .and_then(|s| s.get(&id).map(|m| m.status()));
    controller.close();

    match status {
        Some(DeliveryStatus::Failed) => bail!("Message could not be transmitted"),
        _ => display::success("Message sent"),
    }
    Ok(())
}

/// Opens an interactive chat.
///
/// Lines from stdin are sent. `/refresh` reloads history, `/retry`
/// resends failed messages, `/reconnect` retries the channel and
/// `/quit` or EOF leaves.
pub fn run(config: &CliConfig, conversation: &str) -> Result<()> {
    let mut controller = connect(config, conversation)?;

    let dirty = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&dirty);
    controller.subscribe_store(Arc::new(move |_: &StoreChange| {
        flag.store(true, Ordering::Relaxed);
    }));

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let term = Term::stdout();
    display::info(&format!("Joined '{}'. Type /quit to leave.", conversation));

    loop {
        controller.pump();

        if dirty.swap(false, Ordering::Relaxed) {
            term.clear_screen()?;
            display::print_transcript(&controller.sorted_view());
        }

        match rx.recv_timeout(INPUT_POLL) {
            Ok(line) => {
                if !handle_line(&mut controller, &line) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    controller.close();
    display::info("Left the conversation");
    Ok(())
}

/// Runs one input line. Returns false to leave.
fn handle_line(controller: &mut Controller, line: &str) -> bool {
    match line.trim() {
        "/quit" => return false,
        "/refresh" => {
            if let Err(e) = controller.refresh() {
                display::warning(&format!("Refresh failed: {}", e));
            }
        }
        "/reconnect" => {
            if let Err(e) = controller.reconnect_now() {
                display::warning(&format!("Reconnect failed: {}", e));
            }
        }
        "/retry" => {
            let failed: Vec<MessageId> = controller
                .snapshot()
                .into_iter()
                .filter(|m| m.status() == DeliveryStatus::Failed)
                .map(|m| m.id().clone())
                .collect();
            for id in failed {
                if let Err(e) = controller.retry_send(&id) {
                    display::warning(&format!("Retry failed: {}", e));
                }
            }
        }
        _ => {
            if controller.submit_local_text(line).is_none() {
                debug!(state = ?controller.state(), "line not sent");
            }
        }
    }
    true
}
