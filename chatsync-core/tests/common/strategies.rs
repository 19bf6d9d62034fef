// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for property-based testing.

use chatsync_core::message::Timestamp;
use proptest::prelude::*;

/// Strategy for message text (non-empty).
pub fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 !?.]{1,40}"
}

/// Strategy for participant ids.
pub fn sender_strategy() -> impl Strategy<Value = String> {
    prop_oneof![Just("alice".to_string()), "[a-z]{3,8}"]
}

/// Strategy for message ids.
pub fn id_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,16}"
}

/// Strategy for timestamps far from zero so offsets never underflow.
pub fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    1_000_000_u64..2_000_000_000_000
}

/// Strategy for an offset inside the default fuzzy window (inclusive).
pub fn in_window_offset_strategy() -> impl Strategy<Value = u64> {
    0_u64..=1_000
}
