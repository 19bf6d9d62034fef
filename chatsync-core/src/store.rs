// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Store
//!
//! Ordered in-memory message list for one conversation.
//!
//! The backing order is arrival order. A timestamp-sorted copy is derived
//! on demand for display. Candidates that duplicate an existing entry are
//! rejected, either by id or by a fuzzy match on sender, text and a
//! timestamp window.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::message::{DeliveryStatus, Message, MessageId};

/// Default timestamp tolerance for fuzzy duplicate detection.
pub const DEFAULT_FUZZY_WINDOW_MS: u64 = 1_000;

/// A mutation of the store, delivered to the subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// A new entry was appended.
    Appended {
        /// Id of the new entry.
        id: MessageId,
    },
    /// The contents were replaced wholesale.
    Seeded {
        /// Number of entries after the replace.
        count: usize,
    },
    /// An optimistic entry was matched with its server echo.
    Confirmed {
        /// Id the entry had before promotion.
        previous_id: MessageId,
        /// Id the entry has now.
        id: MessageId,
    },
    /// The delivery status of an entry changed.
    StatusChanged {
        /// The entry id.
        id: MessageId,
        /// The new status.
        status: DeliveryStatus,
    },
}

/// Receives store mutations.
pub trait StoreObserver: Send + Sync {
    /// Called after each mutation.
    fn on_change(&self, change: &StoreChange);
}

impl<F> StoreObserver for F
where
    F: Fn(&StoreChange) + Send + Sync,
{
    fn on_change(&self, change: &StoreChange) {
        self(change)
    }
}

/// Result of merging a remote message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The message was new and appended.
    Inserted,
    /// The message resolved an optimistic local send.
    Confirmed,
    /// The message was already present; nothing changed.
    Duplicate,
}

/// Position in the arrival sequence, used to find entries appended later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StoreCursor(u64);

struct Entry {
    message: Message,
    arrival: u64,
}

/// In-memory ordered message collection with dedup.
///
/// At most one subscriber receives change signals. Signals are not
/// buffered: a subscriber attached later reads [`MessageStore::snapshot`]
/// for the current state.
pub struct MessageStore {
    entries: Vec<Entry>,
    next_arrival: u64,
    fuzzy_window_ms: u64,
    observer: Option<Arc<dyn StoreObserver>>,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStore")
            .field("len", &self.entries.len())
            .field("fuzzy_window_ms", &self.fuzzy_window_ms)
            .field("subscribed", &self.observer.is_some())
            .finish()
    }
}

impl MessageStore {
    /// Creates an empty store with the default fuzzy window.
    pub fn new() -> Self {
        Self::with_fuzzy_window(DEFAULT_FUZZY_WINDOW_MS)
    }

    /// Creates an empty store with a custom fuzzy window.
    pub fn with_fuzzy_window(fuzzy_window_ms: u64) -> Self {
        MessageStore {
            entries: Vec::new(),
            next_arrival: 0,
            fuzzy_window_ms,
            observer: None,
        }
    }

    /// Returns the fuzzy match window in milliseconds.
    pub fn fuzzy_window_ms(&self) -> u64 {
        self.fuzzy_window_ms
    }

    /// Attaches the subscriber, replacing any previous one.
    pub fn subscribe(&mut self, observer: Arc<dyn StoreObserver>) {
        self.observer = Some(observer);
    }

    /// Detaches the subscriber.
    pub fn unsubscribe(&mut self) {
        self.observer = None;
    }

    /// Returns true if a subscriber is attached.
    pub fn has_subscriber(&self) -> bool {
        self.observer.is_some()
    }

    /// Replaces the contents wholesale.
    pub fn seed(&mut self, messages: Vec<Message>) {
        let mut entries = Vec::with_capacity(messages.len());
        for message in messages {
            entries.push(Entry {
                message,
                arrival: self.bump_arrival(),
            });
        }
        self.entries = entries;

        let count = self.entries.len();
        self.notify(StoreChange::Seeded { count });
    }

    /// Appends a candidate unless it duplicates an existing entry.
    ///
    /// Returns false, without mutating or signalling, for a duplicate.
    pub fn append(&mut self, candidate: Message) -> bool {
        if let Some(index) = self.duplicate_of(&candidate) {
            debug!(
                candidate = %candidate.id(),
                existing = %self.entries[index].message.id(),
                "duplicate message rejected"
            );
            return false;
        }

        self.push(candidate);
        true
    }

    /// Appends an optimistic local send, checking only for an equal id.
    ///
    /// Two sends of the same text in quick succession are distinct
    /// messages, so the fuzzy rule does not apply here.
    pub fn append_local(&mut self, message: Message) -> bool {
        if self.position_by_id(message.id().as_str()).is_some() {
            return false;
        }
        self.push(message);
        true
    }

    /// Merges entries carried over a [`seed`](Self::seed) back in.
    ///
    /// An unresolved local send is dropped only when a server copy in the
    /// seeded history matches it; each server copy accounts for one send.
    /// Other entries go through [`append`](Self::append). Returns how many
    /// entries were restored.
    pub fn restore(&mut self, carried: Vec<Message>) -> usize {
        let window = self.fuzzy_window_ms;
        let mut claimed = Vec::new();
        let mut restored = 0;

        for message in carried {
            if !message.is_unresolved() {
                if self.append(message) {
                    restored += 1;
                }
                continue;
            }
            if self.position_by_id(message.id().as_str()).is_some() {
                continue;
            }
            let echo = self.entries.iter().enumerate().find(|(i, e)| {
                !claimed.contains(i)
                    && e.message.id().is_server()
                    && is_fuzzy_match(&e.message, &message, window)
            });
            if let Some((index, _)) = echo {
                claimed.push(index);
                continue;
            }
            self.push(message);
            restored += 1;
        }
        restored
    }

    /// Merges a remote message, resolving optimistic sends.
    ///
    /// Order of checks:
    /// 1. same id: duplicate, unless it is the server copy of an
    ///    unresolved local send
    /// 2. `client_message_id` names an unresolved local send: promote it,
    ///    taking id, text and timestamp from the server
    /// 3. fuzzy match: promote the oldest matching unresolved local send
    ///    (server id adopted if present), otherwise duplicate
    /// 4. append
    pub fn reconcile(
        &mut self,
        candidate: Message,
        client_message_id: Option<&str>,
    ) -> MergeOutcome {
        if let Some(index) = self.position_by_id(candidate.id().as_str()) {
            if candidate.id().is_server() && self.entries[index].message.is_unresolved() {
                return self.promote_at(index, &candidate, true);
            }
            return MergeOutcome::Duplicate;
        }

        if let Some(cmid) = client_message_id.filter(|c| !c.is_empty()) {
            let correlated = self.entries.iter().position(|e| {
                e.message.is_unresolved() && e.message.client_message_id() == Some(cmid)
            });
            if let Some(index) = correlated {
                return self.promote_at(index, &candidate, true);
            }
        }

        let window = self.fuzzy_window_ms;
        let unresolved = self.entries.iter().position(|e| {
            e.message.is_unresolved() && is_fuzzy_match(&e.message, &candidate, window)
        });
        if let Some(index) = unresolved {
            return self.promote_at(index, &candidate, false);
        }
        if self
            .entries
            .iter()
            .any(|e| is_fuzzy_match(&e.message, &candidate, window))
        {
            return MergeOutcome::Duplicate;
        }

        self.push(candidate);
        MergeOutcome::Inserted
    }

    /// Changes the delivery status of an entry.
    ///
    /// Returns false if no entry has the id.
    pub fn set_status(&mut self, id: &MessageId, status: DeliveryStatus) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.message.id() == id) else {
            return false;
        };
        if entry.message.status() == status {
            return true;
        }
        entry.message.set_status(status);
        self.notify(StoreChange::StatusChanged {
            id: id.clone(),
            status,
        });
        true
    }

    /// Looks up an entry by id.
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.entries
            .iter()
            .map(|e| &e.message)
            .find(|m| m.id() == id)
    }

    /// Returns a copy of the entries in backing (arrival) order.
    pub fn snapshot(&self) -> Vec<Message> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    /// Returns a copy sorted by timestamp for display.
    ///
    /// The sort is stable, so entries with equal timestamps keep arrival order.
    pub fn sorted_view(&self) -> Vec<Message> {
        let mut view = self.snapshot();
        view.sort_by_key(|m| m.timestamp());
        view
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a cursor marking the current end of the arrival sequence.
    pub fn cursor(&self) -> StoreCursor {
        StoreCursor(self.next_arrival)
    }

    /// Returns the entries a reseed must keep: everything that arrived at
    /// or after the cursor plus every unresolved local send, in order.
    pub fn carried_since(&self, cursor: StoreCursor) -> Vec<Message> {
        self.entries
            .iter()
            .filter(|e| e.arrival >= cursor.0 || e.message.is_unresolved())
            .map(|e| e.message.clone())
            .collect()
    }

    fn duplicate_of(&self, candidate: &Message) -> Option<usize> {
        let window = self.fuzzy_window_ms;
        self.position_by_id(candidate.id().as_str()).or_else(|| {
            self.entries
                .iter()
                .position(|e| is_fuzzy_match(&e.message, candidate, window))
        })
    }

    fn position_by_id(&self, id: &str) -> Option<usize> {
        if id.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .position(|e| e.message.id().as_str() == id)
    }

    fn promote_at(&mut self, index: usize, server: &Message, overwrite: bool) -> MergeOutcome {
        let message = &mut self.entries[index].message;
        let previous_id = message.id().clone();
        message.promote(server, overwrite);
        let id = message.id().clone();

        debug!(%previous_id, %id, overwrite, "optimistic send confirmed");
        self.notify(StoreChange::Confirmed { previous_id, id });
        MergeOutcome::Confirmed
    }

    fn push(&mut self, message: Message) {
        let id = message.id().clone();
        let arrival = self.bump_arrival();
        self.entries.push(Entry { message, arrival });
        self.notify(StoreChange::Appended { id });
    }

    fn bump_arrival(&mut self) -> u64 {
        let arrival = self.next_arrival;
        self.next_arrival += 1;
        arrival
    }

    fn notify(&self, change: StoreChange) {
        if let Some(observer) = &self.observer {
            observer.on_change(&change);
        }
    }
}

/// Fuzzy duplicate rule: at most one side carries a server id, timestamps
/// within the window (inclusive), same sender and identical text.
fn is_fuzzy_match(existing: &Message, candidate: &Message, window_ms: u64) -> bool {
    !(existing.id().is_server() && candidate.id().is_server())
        && existing.timestamp().abs_diff(candidate.timestamp()) <= window_ms
        && existing.sender() == candidate.sender()
        && existing.text() == candidate.text()
}

// INLINE_TEST_REQUIRED: Tests private fuzzy matching rule and arrival bookkeeping
#[cfg(test)]
mod tests {
    use super::*;

    fn local(id: &str, text: &str, ts: u64) -> Message {
        Message::pending(id, text, "alice", ts)
    }

    fn server(id: &str, text: &str, sender: &str, ts: u64) -> Message {
        Message::confirmed(MessageId::Server(id.into()), text, sender, ts, "alice")
    }

    #[test]
    fn test_fuzzy_match_window_is_inclusive() {
        let a = local("1000", "hi", 1_000);
        let b = server("s1", "hi", "alice", 2_000);
        let c = server("s2", "hi", "alice", 2_001);

        assert!(is_fuzzy_match(&a, &b, 1_000));
        assert!(!is_fuzzy_match(&a, &c, 1_000));
    }

    #[test]
    fn test_fuzzy_match_never_pairs_two_server_ids() {
        let a = server("s1", "hi", "alice", 1_000);
        let b = server("s2", "hi", "alice", 1_000);

        assert!(!is_fuzzy_match(&a, &b, 1_000));
    }

    #[test]
    fn test_fuzzy_match_requires_same_sender_and_text() {
        let a = local("1000", "hi", 1_000);

        assert!(!is_fuzzy_match(&a, &server("s1", "hi", "bob", 1_000), 1_000));
        assert!(!is_fuzzy_match(&a, &server("s1", "hi!", "alice", 1_000), 1_000));
    }

    #[test]
    fn test_arrival_counter_survives_seed() {
        let mut store = MessageStore::new();
        store.append(local("1", "a", 0));
        store.seed(vec![server("s1", "b", "bob", 10_000)]);

        // Seeded entries take fresh arrival numbers.
        assert_eq!(store.entries[0].arrival, 1);
        assert_eq!(store.cursor(), StoreCursor(2));
    }

    #[test]
    fn test_empty_ids_never_match_by_id() {
        let mut store = MessageStore::new();
        store.append(Message::confirmed(
            MessageId::Local(String::new()),
            "a",
            "bob",
            0,
            "alice",
        ));

        assert_eq!(store.position_by_id(""), None);
    }
}
